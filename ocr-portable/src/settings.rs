// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Settings controlling a portable build.

Settings come from fixed defaults, optionally overridden by a
`portable.toml` file at the repository root (or an explicit path).
*/

use {
    anyhow::{Context, Result},
    serde::Deserialize,
    std::path::{Path, PathBuf},
};

/// Name of the settings file looked up in the repository root.
pub const SETTINGS_FILE_NAME: &str = "portable.toml";

/// Describes the application being packaged.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PortableSettings {
    /// Name of the produced executable and bundle directory.
    pub app_name: String,

    /// Python package holding the application sources.
    ///
    /// Sources are expected in `src/<package_name>`.
    pub package_name: String,

    /// Entry script, relative to the repository root.
    pub entry_script: PathBuf,

    /// Port the Streamlit UI binds to.
    pub ui_port: u16,

    /// Port of the local Ollama inference server.
    pub ollama_port: u16,

    /// Files or directories, relative to the repository root, copied into
    /// the bundle after building.
    pub assets: Vec<PathBuf>,
}

impl Default for PortableSettings {
    fn default() -> Self {
        Self {
            app_name: "Ollama-OCR".to_string(),
            package_name: "ollama_ocr".to_string(),
            entry_script: PathBuf::from("src").join("ollama_ocr").join("app.py"),
            ui_port: 8501,
            ollama_port: 11434,
            assets: vec![PathBuf::from("logo.png")],
        }
    }
}

impl PortableSettings {
    /// Parse settings from TOML source.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("parsing portable settings TOML")
    }

    /// Load settings from an explicit file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;

        Self::from_toml_str(&data).with_context(|| format!("loading {}", path.display()))
    }

    /// Resolve settings for a repository.
    ///
    /// An explicit path must exist. Otherwise `portable.toml` in the
    /// repository root is used if present, falling back to defaults.
    pub fn resolve(repo_root: &Path, explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_path(path);
        }

        let default_path = repo_root.join(SETTINGS_FILE_NAME);
        if default_path.exists() {
            Self::from_path(&default_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Name of the generated launcher batch file.
    pub fn launcher_batch_name(&self) -> String {
        format!("Start {}.bat", self.app_name)
    }

    /// File name of the packaged Windows executable.
    pub fn executable_name(&self) -> String {
        format!("{}.exe", self.app_name)
    }

    /// File name of the portable archive.
    pub fn archive_name(&self) -> String {
        format!("{}-portable.zip", self.app_name)
    }

    /// File name of the runtime log written by the launcher batch file.
    pub fn log_file_name(&self) -> String {
        format!("{}.log", self.app_name)
    }
}
