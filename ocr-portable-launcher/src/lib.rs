// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*!
Launch the Ollama OCR Streamlit application from a portable bundle.

Launching goes through three steps:

1. Resolve the bundle directory from the [deployment::DeploymentMode].
2. Find the application script relative to it ([locate::locate_app]).
3. Start Streamlit on that script ([run::Invocation]).
*/

pub mod cli;
pub mod deployment;
pub mod error;
pub mod locate;
pub mod logging;
pub mod run;

use {
    crate::{
        deployment::DeploymentMode,
        error::Result,
        locate::locate_app,
        run::{resolve_python, Invocation, LaunchEnvironment, RunMode},
    },
    slog::info,
    std::{ffi::OsString, path::PathBuf},
};

/// Everything needed to launch the application.
#[derive(Clone, Debug)]
pub struct LauncherConfig {
    pub deployment: DeploymentMode,
    pub run_mode: RunMode,
    /// Interpreter to use instead of the one found on `PATH`.
    pub python: Option<PathBuf>,
    pub environment: LaunchEnvironment,
}

impl LauncherConfig {
    pub fn new(deployment: DeploymentMode) -> Self {
        Self {
            deployment,
            run_mode: RunMode::default(),
            python: None,
            environment: LaunchEnvironment::default(),
        }
    }

    /// Locate the application and resolve the command starting it.
    ///
    /// `current_env` looks up variables in the launcher's environment.
    pub fn invocation(
        &self,
        logger: &slog::Logger,
        current_env: impl Fn(&str) -> Option<OsString>,
    ) -> Result<Invocation> {
        let bundle_dir = self.deployment.bundle_dir();
        let app_path = locate_app(logger, bundle_dir)?;
        let python = resolve_python(self.python.as_deref())?;

        Ok(Invocation::new(
            &python,
            &app_path,
            self.run_mode,
            self.environment.resolve(current_env),
        ))
    }
}

/// Locate and run the application, blocking until it exits.
pub fn launch(logger: &slog::Logger, config: &LauncherConfig) -> Result<()> {
    info!(
        logger,
        "Starting portable launcher from bundle directory {}",
        config.deployment.bundle_dir().display()
    );

    let invocation = config.invocation(logger, |key| std::env::var_os(key))?;
    invocation.run(logger)
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{error::LauncherError, logging::null_logger, run::*},
        std::path::Path,
    };

    fn packaged(dir: &Path) -> DeploymentMode {
        DeploymentMode::Packaged {
            extraction_dir: Some(dir.to_path_buf()),
            exe_dir: dir.to_path_buf(),
        }
    }

    #[test]
    fn invocation_for_bundled_app() -> Result<()> {
        let td = tempfile::tempdir()?;
        let app = td.path().join("app.py");
        std::fs::write(&app, b"import streamlit as st\n")?;

        let mut config = LauncherConfig::new(packaged(td.path()));
        config.python = Some(PathBuf::from("python"));

        let inv = config.invocation(&null_logger(), |_| None)?;

        assert_eq!(inv.program, Path::new("python"));
        assert_eq!(inv.args[..3], ["-m", "streamlit", "run"].map(OsString::from));
        assert_eq!(inv.args.len(), 4);
        assert!(Path::new(&inv.args[3]).is_absolute());
        assert_eq!(Path::new(&inv.args[3]), app);
        assert_eq!(inv.cwd, td.path());

        assert_eq!(inv.env.get(HEADLESS_ENV).map(String::as_str), Some("false"));
        assert_eq!(
            inv.env.get(GATHER_USAGE_STATS_ENV).map(String::as_str),
            Some("false")
        );
        assert_eq!(inv.env.get(UTF8_MODE_ENV).map(String::as_str), Some("1"));

        Ok(())
    }

    #[test]
    fn bootstrap_passes_app_as_sole_argument() -> Result<()> {
        let td = tempfile::tempdir()?;
        let app = td.path().join("app.py");
        std::fs::write(&app, b"")?;

        let mut config = LauncherConfig::new(packaged(td.path()));
        config.python = Some(PathBuf::from("python"));
        config.run_mode = RunMode::Bootstrap;

        let inv = config.invocation(&null_logger(), |_| None)?;

        assert_eq!(inv.args[0], "-c");
        assert_eq!(inv.args[1], BOOTSTRAP_SNIPPET);
        assert_eq!(&inv.args[2..], &[OsString::from(&app)]);

        Ok(())
    }

    #[test]
    fn missing_app_is_not_found() -> Result<()> {
        let td = tempfile::tempdir()?;
        let bundle = td.path().join("Ollama-OCR");
        std::fs::create_dir(&bundle)?;

        let config = LauncherConfig::new(packaged(&bundle));
        let res = config.invocation(&null_logger(), |_| None);

        assert!(matches!(res, Err(LauncherError::AppNotFound { .. })));

        Ok(())
    }
}
