// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Resolve and prepare the Python environment used for packaging.

use {
    anyhow::{anyhow, Context, Result},
    duct::cmd,
    slog::{info, warn},
    std::path::{Path, PathBuf},
};

/// Python module name of the packaging tool.
pub const PACKAGING_TOOL_MODULE: &str = "PyInstaller";

/// Distribution name used to install the packaging tool.
const PACKAGING_TOOL_DISTRIBUTION: &str = "pyinstaller";

/// Interpreter names searched for on `PATH`, in order.
const PYTHON_CANDIDATES: &[&str] = &["python", "python3"];

/// Resolve the Python interpreter to drive the build with.
pub fn resolve_python(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    PYTHON_CANDIDATES
        .iter()
        .find_map(|name| which::which(name).ok())
        .ok_or_else(|| {
            anyhow!(
                "unable to find a Python interpreter on PATH (tried {})",
                PYTHON_CANDIDATES.join(", ")
            )
        })
}

/// Whether `python` can import the given module.
pub fn python_can_import(python: &Path, module: &str) -> Result<bool> {
    let output = cmd(python, &["-c".to_string(), format!("import {}", module)])
        .stdout_null()
        .stderr_null()
        .unchecked()
        .run()
        .with_context(|| format!("running {}", python.display()))?;

    Ok(output.status.success())
}

/// Ensure the packaging tool is importable, installing it with pip if not.
///
/// A failing installation aborts the build.
pub fn ensure_packaging_tool(logger: &slog::Logger, python: &Path) -> Result<()> {
    if python_can_import(python, PACKAGING_TOOL_MODULE)? {
        info!(logger, "{} is available", PACKAGING_TOOL_MODULE);
        return Ok(());
    }

    warn!(
        logger,
        "{} not importable by {}; installing {}",
        PACKAGING_TOOL_MODULE,
        python.display(),
        PACKAGING_TOOL_DISTRIBUTION
    );

    cmd(
        python,
        &["-m", "pip", "install", PACKAGING_TOOL_DISTRIBUTION],
    )
    .run()
    .with_context(|| format!("installing {} with pip", PACKAGING_TOOL_DISTRIBUTION))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use {super::*, crate::logging::null_logger};

    /// Write an interpreter stand-in into `dir`.
    ///
    /// `-c` probes exit with `import_status`. Anything else is recorded one
    /// argument per line in `pip-args.txt`; the first such call succeeds and
    /// later ones fail.
    #[cfg(unix)]
    fn write_fake_python(dir: &Path, import_status: i32) -> Result<PathBuf> {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("python");
        std::fs::write(
            &path,
            format!(
                "#!/bin/sh\n\
                 if [ \"$1\" = \"-c\" ]; then\n\
                 exit {status}\n\
                 fi\n\
                 printf '%s\\n' \"$@\" >> '{args}'\n\
                 if [ -e '{marker}' ]; then\n\
                 exit 1\n\
                 fi\n\
                 touch '{marker}'\n",
                status = import_status,
                args = dir.join("pip-args.txt").display(),
                marker = dir.join("installed").display(),
            ),
        )?;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))?;

        Ok(path)
    }

    #[cfg(unix)]
    #[test]
    fn installs_missing_packaging_tool() -> Result<()> {
        let logger = null_logger();
        let td = tempfile::tempdir()?;
        let python = write_fake_python(td.path(), 1)?;

        ensure_packaging_tool(&logger, &python)?;
        assert_eq!(
            std::fs::read_to_string(td.path().join("pip-args.txt"))?,
            "-m\npip\ninstall\npyinstaller\n"
        );

        // The stand-in fails any further install.
        assert!(ensure_packaging_tool(&logger, &python).is_err());

        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn importable_packaging_tool_not_reinstalled() -> Result<()> {
        let logger = null_logger();
        let td = tempfile::tempdir()?;
        let python = write_fake_python(td.path(), 0)?;

        assert!(python_can_import(&python, PACKAGING_TOOL_MODULE)?);
        ensure_packaging_tool(&logger, &python)?;
        assert!(!td.path().join("pip-args.txt").exists());

        Ok(())
    }

    #[test]
    fn explicit_python_is_used_verbatim() -> Result<()> {
        let p = Path::new("/opt/python/bin/python3.11");
        assert_eq!(resolve_python(Some(p))?, p);

        Ok(())
    }

    #[test]
    fn missing_interpreter_is_an_error() {
        let res = python_can_import(
            Path::new("/nonexistent/ocr-portable/python"),
            PACKAGING_TOOL_MODULE,
        );
        assert!(res.is_err());
    }
}
