// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use {std::path::PathBuf, thiserror::Error};

/// Errors raised while launching the bundled application.
#[derive(Debug, Error)]
pub enum LauncherError {
    #[error("could not locate the Streamlit application; expected app.py relative to {}", .bundle_dir.display())]
    AppNotFound { bundle_dir: PathBuf },

    #[error("unable to find a Python interpreter; tried {}", .tried.join(", "))]
    PythonNotFound { tried: Vec<String> },

    #[error("unable to resolve directory of executable {}", .0.display())]
    NoExecutableDirectory(PathBuf),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Streamlit exited with {0}")]
    AppFailed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LauncherError>;
