// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Interface to PyInstaller.

[PyInstallerBuild] assembles the command line for a packaging run and
[run_packaging_command] executes it.
*/

use {
    crate::{environment::PACKAGING_TOOL_MODULE, settings::PortableSettings, workspace::BuildPaths},
    anyhow::{anyhow, Context, Result},
    slog::{info, warn},
    std::{
        ffi::OsString,
        path::{Path, PathBuf},
        str::FromStr,
    },
};

/// Separator between source and destination in `--add-data` values.
#[cfg(target_family = "windows")]
const ADD_DATA_SEPARATOR: &str = ";";
#[cfg(not(target_family = "windows"))]
const ADD_DATA_SEPARATOR: &str = ":";

/// How the application is laid out in the bundle.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BundleStrategy {
    /// A single self-extracting executable.
    ///
    /// Streamlit and the application package are collected in full and the
    /// OCR processor module is declared as a hidden import.
    OneFile,

    /// An executable plus its dependencies in a directory.
    ///
    /// The application package directory is embedded as a data folder and
    /// Streamlit submodules loaded dynamically are declared as hidden imports.
    OneDirWithData,
}

impl Default for BundleStrategy {
    fn default() -> Self {
        Self::OneFile
    }
}

impl FromStr for BundleStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "onefile" => Ok(Self::OneFile),
            "onedir" => Ok(Self::OneDirWithData),
            _ => Err(anyhow!("unknown bundle strategy: {}", s)),
        }
    }
}

impl BundleStrategy {
    /// Value accepted by [BundleStrategy::from_str].
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneFile => "onefile",
            Self::OneDirWithData => "onedir",
        }
    }

    fn mode_flag(&self) -> &'static str {
        match self {
            Self::OneFile => "--onefile",
            Self::OneDirWithData => "--onedir",
        }
    }
}

/// A fully assembled packaging command.
///
/// Constructed once per build and not mutated afterwards.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PackagingCommand {
    program: PathBuf,
    args: Vec<String>,
}

impl PackagingCommand {
    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Render the command as a shell-quoted string.
    pub fn display(&self) -> String {
        std::iter::once(self.program.display().to_string())
            .chain(self.args.iter().cloned())
            .map(|part| match shlex::try_quote(&part) {
                Ok(quoted) => quoted.into_owned(),
                Err(_) => part.clone(),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Represents an invocation of PyInstaller for the portable build.
#[derive(Clone, Debug)]
pub struct PyInstallerBuild {
    python: PathBuf,
    app_name: String,
    package_name: String,
    source_dir: PathBuf,
    entry_script: PathBuf,
    build_dir: PathBuf,
    spec_dir: PathBuf,
    dist_dir: PathBuf,
    bundle_dir: PathBuf,
    strategy: BundleStrategy,
    icon: Option<PathBuf>,
}

impl PyInstallerBuild {
    /// Construct a new instance for the given interpreter, layout, and settings.
    pub fn new(python: impl AsRef<Path>, paths: &BuildPaths, settings: &PortableSettings) -> Self {
        Self {
            python: python.as_ref().to_path_buf(),
            app_name: settings.app_name.clone(),
            package_name: settings.package_name.clone(),
            source_dir: paths.source_dir.clone(),
            entry_script: paths.entry_script.clone(),
            build_dir: paths.build_dir.clone(),
            spec_dir: paths.spec_dir.clone(),
            dist_dir: paths.dist_dir.clone(),
            bundle_dir: paths.bundle_dir.clone(),
            strategy: BundleStrategy::default(),
            icon: None,
        }
    }

    /// Set the bundling strategy.
    pub fn strategy(&mut self, strategy: BundleStrategy) -> &mut Self {
        self.strategy = strategy;
        self
    }

    /// Set the icon to embed in the executable.
    ///
    /// The icon is only passed to PyInstaller if the file exists when the
    /// command is assembled.
    pub fn icon(&mut self, path: impl AsRef<Path>) -> &mut Self {
        self.icon = Some(path.as_ref().to_path_buf());
        self
    }

    /// Directory PyInstaller writes its output to.
    ///
    /// Single file builds emit the executable directly into the distribution
    /// path, so it points at the bundle directory. Directory builds create
    /// `<AppName>` under the distribution path themselves.
    fn output_dir(&self) -> &Path {
        match self.strategy {
            BundleStrategy::OneFile => &self.bundle_dir,
            BundleStrategy::OneDirWithData => &self.dist_dir,
        }
    }

    fn strategy_args(&self) -> Vec<String> {
        match self.strategy {
            BundleStrategy::OneFile => vec![
                "--paths".to_string(),
                self.source_dir.display().to_string(),
                "--collect-all".to_string(),
                "streamlit".to_string(),
                "--hidden-import".to_string(),
                "streamlit".to_string(),
                "--collect-all".to_string(),
                self.package_name.clone(),
                "--hidden-import".to_string(),
                "ocr_processor".to_string(),
            ],
            BundleStrategy::OneDirWithData => vec![
                "--add-data".to_string(),
                format!(
                    "{}{}{}",
                    self.source_dir.display(),
                    ADD_DATA_SEPARATOR,
                    self.package_name
                ),
                "--hidden-import".to_string(),
                "streamlit.web.cli".to_string(),
                "--hidden-import".to_string(),
                "streamlit.runtime.scriptrunner.magic_funcs".to_string(),
            ],
        }
    }

    /// Assemble the command to run.
    ///
    /// The entry script is always the final argument.
    pub fn command(&self) -> PackagingCommand {
        let mut args = vec![
            "-m".to_string(),
            PACKAGING_TOOL_MODULE.to_string(),
            "--noconfirm".to_string(),
            "--clean".to_string(),
            self.strategy.mode_flag().to_string(),
            "--name".to_string(),
            self.app_name.clone(),
            "--distpath".to_string(),
            self.output_dir().display().to_string(),
            "--workpath".to_string(),
            self.build_dir.display().to_string(),
            "--specpath".to_string(),
            self.spec_dir.display().to_string(),
        ];

        args.extend(self.strategy_args());

        if let Some(icon) = self.icon.as_ref().filter(|p| p.exists()) {
            args.push("--icon".to_string());
            args.push(icon.display().to_string());
        }

        args.push(self.entry_script.display().to_string());

        PackagingCommand {
            program: self.python.clone(),
            args,
        }
    }
}

/// Run a packaging command from `cwd`.
///
/// Output is not captured; it flows to the invoking terminal.
pub fn run_packaging_command(
    logger: &slog::Logger,
    command: &PackagingCommand,
    cwd: &Path,
) -> Result<()> {
    info!(logger, "Running: {}", command.display());

    duct::cmd(
        command.program(),
        command.args().iter().map(OsString::from),
    )
    .dir(cwd)
    .run()
    .with_context(|| format!("running {}", command.display()))?;

    Ok(())
}

/// Locate the built executable, giving it an `.exe` extension if needed.
///
/// PyInstaller running on a non-Windows host emits an extensionless binary.
pub fn normalize_executable(logger: &slog::Logger, paths: &BuildPaths) -> Result<PathBuf> {
    let exe_path = &paths.executable;
    let built_binary = exe_path.with_extension("");

    if built_binary.is_file() && !exe_path.exists() {
        warn!(
            logger,
            "renaming {} to {}",
            built_binary.display(),
            exe_path.display()
        );
        std::fs::rename(&built_binary, exe_path)
            .with_context(|| format!("renaming {}", built_binary.display()))?;
    }

    if exe_path.exists() {
        Ok(exe_path.clone())
    } else {
        Err(anyhow!(
            "expected executable {} does not exist",
            exe_path.display()
        ))
    }
}
