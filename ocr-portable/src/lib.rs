// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*!
Build portable distributions of the Ollama OCR Streamlit application.

A portable distribution is a directory holding a PyInstaller produced
executable, a README and a batch file launcher, zipped for distribution.
[pipeline::build_portable] drives the whole process; the other modules
implement its individual steps.
*/

pub mod archive;
pub mod cli;
pub mod decorate;
pub mod environment;
pub mod logging;
pub mod pipeline;
pub mod pyinstaller;
pub mod settings;
pub mod workspace;
