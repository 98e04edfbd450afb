// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! The portable build pipeline.

A build runs these steps in order, each consuming the previous one's output:

1. Ensure PyInstaller is installed.
2. Clean the output directories.
3. Assemble the PyInstaller command.
4. Run it.
5. Add the README, launcher batch file and assets to the bundle.
6. Zip the bundle.
*/

use {
    crate::{
        archive::write_bundle_archive,
        decorate::decorate_bundle,
        environment::{ensure_packaging_tool, resolve_python},
        pyinstaller::{
            normalize_executable, run_packaging_command, BundleStrategy, PackagingCommand,
            PyInstallerBuild,
        },
        settings::PortableSettings,
        workspace::{clean_workspace, BuildPaths},
    },
    anyhow::{Context, Result},
    slog::warn,
    std::path::PathBuf,
};

/// Options for a single build invocation.
#[derive(Clone, Debug, Default)]
pub struct BuildOptions {
    pub repo_root: PathBuf,
    pub settings: PortableSettings,
    pub strategy: BundleStrategy,
    /// Icon passed to PyInstaller as given, if it exists.
    pub icon: Option<PathBuf>,
    /// Interpreter to run PyInstaller with. Searched on `PATH` if not set.
    pub python: Option<PathBuf>,
    /// Do not check for or install PyInstaller.
    pub skip_install: bool,
    /// Do not produce the zip archive.
    pub skip_archive: bool,
}

/// Result of a successful build.
#[derive(Clone, Debug)]
pub struct BuildOutput {
    pub executable: PathBuf,
    pub bundle_dir: PathBuf,
    pub archive: Option<PathBuf>,
}

impl BuildOptions {
    pub fn paths(&self) -> BuildPaths {
        BuildPaths::new(&self.repo_root, &self.settings)
    }

    /// Assemble the packaging command for an already resolved interpreter.
    pub fn packaging_command(&self, python: impl Into<PathBuf>) -> PackagingCommand {
        let paths = self.paths();
        let mut build = PyInstallerBuild::new(python.into(), &paths, &self.settings);
        build.strategy(self.strategy);

        if let Some(icon) = &self.icon {
            build.icon(icon);
        }

        build.command()
    }
}

/// Run the full build pipeline.
pub fn build_portable(logger: &slog::Logger, options: &BuildOptions) -> Result<BuildOutput> {
    let paths = options.paths();
    let python = resolve_python(options.python.as_deref())?;

    if options.skip_install {
        warn!(logger, "not checking for PyInstaller");
    } else {
        ensure_packaging_tool(logger, &python).context("ensuring PyInstaller is installed")?;
    }

    clean_workspace(logger, &paths).context("cleaning build workspace")?;

    let command = options.packaging_command(&python);
    run_packaging_command(logger, &command, &paths.repo_root)?;

    let executable = normalize_executable(logger, &paths)?;

    decorate_bundle(logger, &paths.repo_root, &paths.bundle_dir, &options.settings)
        .context("adding files to bundle")?;

    let archive = if options.skip_archive {
        None
    } else {
        write_bundle_archive(logger, &paths.bundle_dir, &paths.archive)?;
        Some(paths.archive.clone())
    };

    Ok(BuildOutput {
        executable,
        bundle_dir: paths.bundle_dir,
        archive,
    })
}

#[cfg(test)]
mod tests {
    use {super::*, std::path::Path};

    #[test]
    fn icon_passed_only_when_present() -> Result<()> {
        let repo = tempfile::tempdir()?;
        let elsewhere = tempfile::tempdir()?;
        let icon = elsewhere.path().join("app.ico");
        std::fs::write(&icon, b"ico")?;

        let mut options = BuildOptions {
            repo_root: repo.path().to_path_buf(),
            icon: Some(icon.clone()),
            ..Default::default()
        };

        let command = options.packaging_command("python");
        let pos = command.args().iter().position(|a| a == "--icon").unwrap();
        assert_eq!(Path::new(&command.args()[pos + 1]), icon);

        options.icon = Some(repo.path().join("missing.ico"));
        let command = options.packaging_command("python");
        assert!(!command.args().iter().any(|a| a == "--icon"));

        Ok(())
    }
}
