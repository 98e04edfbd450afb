// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use {
    crate::{
        deployment::DeploymentMode,
        error::{LauncherError, Result},
        launch,
        logging::logger_for_bundle,
        run::RunMode,
        LauncherConfig,
    },
    clap::{value_parser, Arg, Command},
    slog::error,
    std::path::PathBuf,
};

fn deployment_mode(bundle_dir: Option<&PathBuf>) -> Result<DeploymentMode> {
    match bundle_dir {
        Some(dir) => {
            let dir = if dir.is_absolute() {
                dir.clone()
            } else {
                std::env::current_dir()?.join(dir)
            };

            Ok(DeploymentMode::Packaged {
                extraction_dir: Some(dir.clone()),
                exe_dir: dir,
            })
        }
        None => DeploymentMode::detect(),
    }
}

/// Run the launcher, returning the process exit code.
pub fn run() -> Result<i32> {
    let app = Command::new("ocr-portable-launcher")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Start the Ollama OCR Streamlit application from a portable bundle")
        .arg(
            Arg::new("bundle_dir")
                .long("bundle-dir")
                .value_name("DIR")
                .value_parser(value_parser!(PathBuf))
                .help("Directory to search for the application instead of detecting it"),
        )
        .arg(
            Arg::new("run_mode")
                .long("run-mode")
                .value_parser(["cli", "bootstrap"])
                .default_value("cli")
                .help("Start Streamlit via its command line runner or its bootstrap module"),
        )
        .arg(
            Arg::new("python")
                .long("python")
                .value_name("PATH")
                .value_parser(value_parser!(PathBuf))
                .help("Python interpreter to run Streamlit with"),
        );

    let matches = app.get_matches();

    let deployment = deployment_mode(matches.get_one::<PathBuf>("bundle_dir"))?;
    let logger_context = logger_for_bundle(deployment.bundle_dir())?;

    let mut config = LauncherConfig::new(deployment);
    config.python = matches.get_one::<PathBuf>("python").cloned();
    if let Some(mode) = matches.get_one::<String>("run_mode") {
        config.run_mode = mode
            .parse::<RunMode>()
            .map_err(LauncherError::InvalidArgument)?;
    }

    match launch(&logger_context.logger, &config) {
        Ok(()) => Ok(0),
        Err(err) => {
            error!(
                logger_context.logger,
                "Portable launcher failed with an unexpected error: {:?}", err
            );
            eprintln!("error: {}", err);
            eprintln!(
                "An unexpected error occurred. Please check the log file at '{}' for details.",
                logger_context.log_path.display()
            );

            Ok(1)
        }
    }
}
