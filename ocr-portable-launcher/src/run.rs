// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Start Streamlit for a located application script.

An [Invocation] is resolved completely before anything is spawned: the
interpreter, arguments, working directory and environment defaults are all
fixed up front.
*/

use {
    crate::error::{LauncherError, Result},
    slog::info,
    std::{
        collections::BTreeMap,
        ffi::OsString,
        path::{Path, PathBuf},
        str::FromStr,
    },
};

/// Python statement starting Streamlit through its bootstrap module.
///
/// The script path is read from the first program argument.
pub const BOOTSTRAP_SNIPPET: &str =
    "import sys; from streamlit.web import bootstrap; bootstrap.run(sys.argv[1], False, [], {})";

pub const HEADLESS_ENV: &str = "STREAMLIT_SERVER_HEADLESS";
pub const GATHER_USAGE_STATS_ENV: &str = "STREAMLIT_BROWSER_GATHER_USAGE_STATS";
pub const UTF8_MODE_ENV: &str = "PYTHONUTF8";

/// Interpreter names searched for on `PATH`, in order.
const PYTHON_CANDIDATES: &[&str] = &["python", "python3"];

/// How Streamlit is started.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RunMode {
    /// `python -m streamlit run <app>`.
    Cli,

    /// Call `streamlit.web.bootstrap.run()` directly.
    Bootstrap,
}

impl Default for RunMode {
    fn default() -> Self {
        Self::Cli
    }
}

impl FromStr for RunMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "cli" => Ok(Self::Cli),
            "bootstrap" => Ok(Self::Bootstrap),
            _ => Err(format!("unknown run mode: {}", s)),
        }
    }
}

/// Environment defaults applied to the launched application.
///
/// Each field overrides the built-in default when set. A variable already
/// present in the launcher's own environment always wins.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LaunchEnvironment {
    /// Run Streamlit without opening a browser. Defaults to off.
    pub headless: Option<bool>,
    /// Send usage statistics to Streamlit. Defaults to off.
    pub gather_usage_stats: Option<bool>,
    /// Force Python's UTF-8 mode. Defaults to on.
    pub utf8_mode: Option<bool>,
}

impl LaunchEnvironment {
    /// Compute variables to set given a lookup into the current environment.
    pub fn resolve(&self, current: impl Fn(&str) -> Option<OsString>) -> BTreeMap<String, String> {
        [
            (HEADLESS_ENV, self.headless.unwrap_or(false).to_string()),
            (
                GATHER_USAGE_STATS_ENV,
                self.gather_usage_stats.unwrap_or(false).to_string(),
            ),
            (
                UTF8_MODE_ENV,
                if self.utf8_mode.unwrap_or(true) { "1" } else { "0" }.to_string(),
            ),
        ]
        .into_iter()
        .filter(|(key, _)| current(key).is_none())
        .map(|(key, value)| (key.to_string(), value))
        .collect()
    }
}

/// A fully resolved command starting the application.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub cwd: PathBuf,
    /// Variables added to the inherited environment.
    pub env: BTreeMap<String, String>,
}

impl Invocation {
    /// Resolve the invocation for an application script.
    pub fn new(
        python: &Path,
        app_path: &Path,
        mode: RunMode,
        env: BTreeMap<String, String>,
    ) -> Self {
        let mut args: Vec<OsString> = match mode {
            RunMode::Cli => vec!["-m".into(), "streamlit".into(), "run".into()],
            RunMode::Bootstrap => vec!["-c".into(), BOOTSTRAP_SNIPPET.into()],
        };
        args.push(app_path.as_os_str().to_os_string());

        Self {
            program: python.to_path_buf(),
            args,
            cwd: app_path
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| PathBuf::from(".")),
            env,
        }
    }

    /// Render for logging.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_os_str())
            .chain(self.args.iter().map(|a| a.as_os_str()))
            .map(|a| a.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run the invocation to completion.
    ///
    /// Output is inherited from the launcher. A non-zero exit is an error.
    pub fn run(&self, logger: &slog::Logger) -> Result<()> {
        info!(logger, "Executing command: {}", self.display());

        let mut expression = duct::cmd(&self.program, &self.args).dir(&self.cwd);
        for (key, value) in &self.env {
            info!(logger, "setting {}={}", key, value);
            expression = expression.env(key, value);
        }

        let output = expression.unchecked().run()?;

        if output.status.success() {
            Ok(())
        } else {
            Err(LauncherError::AppFailed(output.status.to_string()))
        }
    }
}

/// Resolve the Python interpreter running the application.
///
/// An explicit path wins. Otherwise the first candidate found on `PATH` is
/// used.
pub fn resolve_python(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    PYTHON_CANDIDATES
        .iter()
        .find_map(|name| which::which(name).ok())
        .ok_or_else(|| LauncherError::PythonNotFound {
            tried: PYTHON_CANDIDATES.iter().map(|s| s.to_string()).collect(),
        })
}
