// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Determine where the launcher is running from.

use {
    crate::error::{LauncherError, Result},
    std::path::{Path, PathBuf},
};

/// Environment variable PyInstaller's bootloader sets to its extraction directory.
pub const EXTRACTION_DIR_ENV: &str = "_MEIPASS2";

/// Environment variable cargo sets when running a crate's binaries and tests.
const CARGO_MANIFEST_DIR_ENV: &str = "CARGO_MANIFEST_DIR";

/// How the launcher was deployed.
///
/// Determined once at startup and passed to everything that needs to find
/// files relative to the bundle.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DeploymentMode {
    /// Running out of a source checkout via cargo.
    Source { root: PathBuf },

    /// Running from a portable bundle.
    Packaged {
        /// Directory the packaging tool extracted bundle content to, if any.
        extraction_dir: Option<PathBuf>,
        /// Directory holding the running executable.
        exe_dir: PathBuf,
    },
}

impl DeploymentMode {
    /// Detect the deployment mode of the current process.
    pub fn detect() -> Result<Self> {
        Self::detect_from(
            |key| std::env::var_os(key).map(PathBuf::from),
            &std::env::current_exe()?,
        )
    }

    /// Detect the deployment mode from an environment lookup and executable path.
    pub fn detect_from(env: impl Fn(&str) -> Option<PathBuf>, current_exe: &Path) -> Result<Self> {
        if let Some(root) = env(CARGO_MANIFEST_DIR_ENV) {
            return Ok(Self::Source { root });
        }

        let exe_dir = current_exe
            .parent()
            .ok_or_else(|| LauncherError::NoExecutableDirectory(current_exe.to_path_buf()))?
            .to_path_buf();

        Ok(Self::Packaged {
            extraction_dir: env(EXTRACTION_DIR_ENV).filter(|p| p.is_dir()),
            exe_dir,
        })
    }

    /// Directory the bundled application is searched relative to.
    pub fn bundle_dir(&self) -> &Path {
        match self {
            Self::Source { root } => root,
            Self::Packaged {
                extraction_dir,
                exe_dir,
            } => extraction_dir.as_deref().unwrap_or(exe_dir),
        }
    }
}
