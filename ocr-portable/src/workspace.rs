// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Filesystem layout of a portable build.

use {
    crate::settings::PortableSettings,
    anyhow::{Context, Result},
    slog::{info, warn},
    std::path::{Path, PathBuf},
};

/// Paths involved in a portable build.
///
/// All paths are derived from the repository root and the settings. Nothing
/// is created on construction.
#[derive(Clone, Debug)]
pub struct BuildPaths {
    pub repo_root: PathBuf,
    /// Directory holding the application package sources.
    pub source_dir: PathBuf,
    pub entry_script: PathBuf,
    /// PyInstaller work directory.
    pub build_dir: PathBuf,
    /// Directory PyInstaller writes its `.spec` file to.
    pub spec_dir: PathBuf,
    pub dist_dir: PathBuf,
    /// `<dist>/<AppName>`.
    pub bundle_dir: PathBuf,
    pub executable: PathBuf,
    pub archive: PathBuf,
    /// Log file the launcher batch file redirects output to.
    pub log_file: PathBuf,
}

impl BuildPaths {
    pub fn new(repo_root: impl AsRef<Path>, settings: &PortableSettings) -> Self {
        let repo_root = repo_root.as_ref().to_path_buf();
        let portable_dir = repo_root.join("portable");
        let build_dir = portable_dir.join("build");
        let dist_dir = portable_dir.join("dist");
        let bundle_dir = dist_dir.join(&settings.app_name);

        Self {
            source_dir: repo_root.join("src").join(&settings.package_name),
            entry_script: repo_root.join(&settings.entry_script),
            spec_dir: build_dir.clone(),
            build_dir,
            executable: bundle_dir.join(settings.executable_name()),
            log_file: bundle_dir.join("logs").join(settings.log_file_name()),
            archive: repo_root.join(settings.archive_name()),
            bundle_dir,
            dist_dir,
            repo_root,
        }
    }
}

fn remove_dir_if_exists(logger: &slog::Logger, path: &Path) -> Result<()> {
    if path.exists() {
        warn!(logger, "removing {}", path.display());
        remove_dir_all::remove_dir_all(path)
            .with_context(|| format!("removing {}", path.display()))?;
    }

    Ok(())
}

/// Remove output of previous builds and recreate empty output directories.
///
/// Safe to call on an already clean workspace.
pub fn clean_workspace(logger: &slog::Logger, paths: &BuildPaths) -> Result<()> {
    remove_dir_if_exists(logger, &paths.dist_dir)?;
    remove_dir_if_exists(logger, &paths.build_dir)?;

    if paths.archive.exists() {
        warn!(logger, "removing {}", paths.archive.display());
        std::fs::remove_file(&paths.archive)
            .with_context(|| format!("removing {}", paths.archive.display()))?;
    }

    for path in [&paths.build_dir, &paths.dist_dir] {
        std::fs::create_dir_all(path).with_context(|| format!("creating {}", path.display()))?;
    }

    info!(logger, "workspace cleaned");

    Ok(())
}

#[cfg(test)]
mod tests {
    use {super::*, crate::logging::null_logger};

    fn is_empty_dir(path: &Path) -> Result<bool> {
        Ok(path.is_dir() && std::fs::read_dir(path)?.next().is_none())
    }

    #[test]
    fn derived_paths() {
        let paths = BuildPaths::new("/repo", &PortableSettings::default());

        assert_eq!(paths.dist_dir, Path::new("/repo/portable/dist"));
        assert_eq!(paths.spec_dir, paths.build_dir);
        assert_eq!(paths.bundle_dir, Path::new("/repo/portable/dist/Ollama-OCR"));
        assert_eq!(
            paths.executable,
            Path::new("/repo/portable/dist/Ollama-OCR/Ollama-OCR.exe")
        );
        assert_eq!(paths.archive, Path::new("/repo/Ollama-OCR-portable.zip"));
        assert_eq!(
            paths.entry_script,
            Path::new("/repo/src/ollama_ocr/app.py")
        );
    }

    #[test]
    fn clean_is_idempotent() -> Result<()> {
        let logger = null_logger();
        let td = tempfile::tempdir()?;
        let paths = BuildPaths::new(td.path(), &PortableSettings::default());

        std::fs::create_dir_all(paths.bundle_dir.join("nested"))?;
        std::fs::write(paths.bundle_dir.join("nested").join("stale.txt"), b"old")?;
        std::fs::create_dir_all(&paths.build_dir)?;
        std::fs::write(paths.build_dir.join("Ollama-OCR.spec"), b"old")?;
        std::fs::write(&paths.archive, b"zip")?;

        for _ in 0..2 {
            clean_workspace(&logger, &paths)?;

            assert!(is_empty_dir(&paths.dist_dir)?);
            assert!(is_empty_dir(&paths.build_dir)?);
            assert!(!paths.archive.exists());
        }

        Ok(())
    }
}
