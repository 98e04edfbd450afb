// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use {
    slog::Drain,
    std::{
        fs::File,
        io::Write,
        path::{Path, PathBuf},
        sync::Mutex,
    },
};

/// Directory under the bundle holding log files.
pub const LOGS_DIR_NAME: &str = "logs";

/// Name of the launcher's log file.
pub const LOG_FILE_NAME: &str = "portable_launcher.log";

/// A slog Drain appending timestamped lines to a file.
pub struct FileDrain {
    fh: Mutex<File>,
}

impl FileDrain {
    pub fn new(fh: File) -> Self {
        Self { fh: Mutex::new(fh) }
    }
}

impl slog::Drain for FileDrain {
    type Ok = ();
    type Err = std::io::Error;

    fn log(
        &self,
        record: &slog::Record,
        _values: &slog::OwnedKVList,
    ) -> Result<Self::Ok, Self::Err> {
        let line = format!(
            "{} - {} - {}\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S,%3f"),
            record.level().as_str(),
            record.msg()
        );

        let mut fh = self.fh.lock().unwrap_or_else(|e| e.into_inner());
        fh.write_all(line.as_bytes())?;
        fh.flush()
    }
}

/// Context holding state for a logger.
pub struct LoggerContext {
    pub logger: slog::Logger,
    /// File log records are written to.
    pub log_path: PathBuf,
}

/// Path of the launcher log for a bundle directory.
pub fn log_path(bundle_dir: &Path) -> PathBuf {
    bundle_dir.join(LOGS_DIR_NAME).join(LOG_FILE_NAME)
}

/// Construct a logger appending to the bundle's log file.
///
/// The logs directory is created if needed. The file stays open for the
/// lifetime of the returned logger.
pub fn logger_for_bundle(bundle_dir: &Path) -> std::io::Result<LoggerContext> {
    let log_path = log_path(bundle_dir);

    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let fh = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    Ok(LoggerContext {
        logger: slog::Logger::root(FileDrain::new(fh).ignore_res(), slog::o!()),
        log_path,
    })
}

/// A logger that discards everything.
pub fn null_logger() -> slog::Logger {
    slog::Logger::root(slog::Discard, slog::o!())
}

#[cfg(test)]
mod tests {
    use {super::*, slog::info};

    #[test]
    fn writes_formatted_lines() -> std::io::Result<()> {
        let td = tempfile::tempdir()?;
        let bundle = td.path().join("Ollama-OCR");

        {
            let context = logger_for_bundle(&bundle)?;
            assert_eq!(
                context.log_path,
                bundle.join("logs").join("portable_launcher.log")
            );
            info!(context.logger, "Starting portable launcher");
        }
        {
            let context = logger_for_bundle(&bundle)?;
            slog::error!(context.logger, "second run");
        }

        let content = std::fs::read_to_string(log_path(&bundle))?;
        let lines = content.lines().collect::<Vec<_>>();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" - INFO - Starting portable launcher"));
        assert!(lines[1].ends_with(" - ERROR - second run"));

        Ok(())
    }
}
