// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Add generated files and static assets to a built bundle.

use {
    crate::settings::PortableSettings,
    anyhow::{Context, Result},
    handlebars::Handlebars,
    once_cell::sync::Lazy,
    serde::Serialize,
    slog::{info, warn},
    std::path::{Path, PathBuf},
};

/// File name of the README written into the bundle.
pub const README_FILE_NAME: &str = "README_portable.txt";

static HANDLEBARS: Lazy<Handlebars<'static>> = Lazy::new(|| {
    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);
    handlebars.set_strict_mode(true);

    handlebars
        .register_template_string(
            "README_portable.txt",
            include_str!("templates/README_portable.txt.hbs"),
        )
        .unwrap();
    handlebars
        .register_template_string("launcher.bat", include_str!("templates/launcher.bat.hbs"))
        .unwrap();

    handlebars
});

#[derive(Serialize)]
struct TemplateData {
    app_name: String,
    executable_name: String,
    launcher_batch_name: String,
    log_file_name: String,
    ui_port: u16,
    ollama_port: u16,
}

impl From<&PortableSettings> for TemplateData {
    fn from(settings: &PortableSettings) -> Self {
        Self {
            app_name: settings.app_name.clone(),
            executable_name: settings.executable_name(),
            launcher_batch_name: settings.launcher_batch_name(),
            log_file_name: settings.log_file_name(),
            ui_port: settings.ui_port,
            ollama_port: settings.ollama_port,
        }
    }
}

/// Render a template with Windows line endings.
fn render_crlf(template: &str, settings: &PortableSettings) -> Result<String> {
    let rendered = HANDLEBARS
        .render(template, &TemplateData::from(settings))
        .with_context(|| format!("rendering {}", template))?;

    Ok(rendered
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\r\n")
        + "\r\n")
}

/// Write the README describing requirements and usage into the bundle.
pub fn write_readme(bundle_dir: &Path, settings: &PortableSettings) -> Result<PathBuf> {
    let path = bundle_dir.join(README_FILE_NAME);
    let content = render_crlf("README_portable.txt", settings)?;

    std::fs::write(&path, content).with_context(|| format!("writing {}", path.display()))?;

    Ok(path)
}

/// Write the batch file starting the bundled executable.
///
/// The script logs all output of the executable and keeps the console open
/// when it exits with a non-zero code.
pub fn write_launcher_batch(bundle_dir: &Path, settings: &PortableSettings) -> Result<PathBuf> {
    let path = bundle_dir.join(settings.launcher_batch_name());
    let content = render_crlf("launcher.bat", settings)?;

    std::fs::write(&path, content).with_context(|| format!("writing {}", path.display()))?;

    Ok(path)
}

fn copy_dir_recursive(source: &Path, dest: &Path) -> Result<()> {
    for entry in walkdir::WalkDir::new(source).sort_by(|a, b| a.file_name().cmp(b.file_name())) {
        let entry = entry?;
        let rel_path = entry.path().strip_prefix(source)?;
        let dest_path = dest.join(rel_path);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&dest_path)
                .with_context(|| format!("creating {}", dest_path.display()))?;
        } else {
            std::fs::copy(entry.path(), &dest_path)
                .with_context(|| format!("copying {}", entry.path().display()))?;
        }
    }

    Ok(())
}

/// Remove a file, symlink or directory at `path` if anything is there.
fn remove_existing(path: &Path) -> Result<()> {
    match std::fs::symlink_metadata(path) {
        Ok(metadata) if metadata.is_dir() => remove_dir_all::remove_dir_all(path)
            .with_context(|| format!("removing {}", path.display())),
        Ok(_) => {
            std::fs::remove_file(path).with_context(|| format!("removing {}", path.display()))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("inspecting {}", path.display())),
    }
}

/// Copy files or directories into the root of the bundle.
///
/// Relative asset paths are resolved against `source_root`. Whatever already
/// exists under the same name in the bundle is replaced. Missing assets are
/// skipped.
pub fn copy_assets(
    logger: &slog::Logger,
    source_root: &Path,
    bundle_dir: &Path,
    assets: &[PathBuf],
) -> Result<Vec<PathBuf>> {
    let mut copied = vec![];

    for asset in assets {
        let source = source_root.join(asset);
        let file_name = match source.file_name() {
            Some(name) => name,
            None => {
                warn!(logger, "ignoring asset without file name: {}", asset.display());
                continue;
            }
        };
        let dest = bundle_dir.join(file_name);

        if source.is_dir() {
            remove_existing(&dest)?;
            copy_dir_recursive(&source, &dest)?;
        } else if source.is_file() {
            remove_existing(&dest)?;
            std::fs::copy(&source, &dest)
                .with_context(|| format!("copying {}", source.display()))?;
        } else {
            warn!(logger, "asset {} not found; skipping", source.display());
            continue;
        }

        info!(logger, "copied {} to {}", source.display(), dest.display());
        copied.push(dest);
    }

    Ok(copied)
}

/// Write generated files and copy assets into the bundle.
pub fn decorate_bundle(
    logger: &slog::Logger,
    source_root: &Path,
    bundle_dir: &Path,
    settings: &PortableSettings,
) -> Result<()> {
    std::fs::create_dir_all(bundle_dir)
        .with_context(|| format!("creating {}", bundle_dir.display()))?;

    let readme = write_readme(bundle_dir, settings)?;
    info!(logger, "wrote {}", readme.display());
    let batch = write_launcher_batch(bundle_dir, settings)?;
    info!(logger, "wrote {}", batch.display());

    copy_assets(logger, source_root, bundle_dir, &settings.assets)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use {super::*, crate::logging::null_logger};

    #[test]
    fn readme_content() -> Result<()> {
        let td = tempfile::tempdir()?;
        let path = write_readme(td.path(), &PortableSettings::default())?;
        let content = std::fs::read_to_string(path)?;

        assert!(content.contains("http://localhost:8501"));
        assert!(content.contains("http://localhost:11434"));
        assert!(content.contains("Double-click \"Start Ollama-OCR.bat\""));
        assert!(content.contains("Keep the console window open"));

        Ok(())
    }

    #[test]
    fn batch_content() -> Result<()> {
        let td = tempfile::tempdir()?;
        let path = write_launcher_batch(td.path(), &PortableSettings::default())?;
        assert_eq!(path.file_name().unwrap(), "Start Ollama-OCR.bat");

        let content = std::fs::read_to_string(path)?;

        assert!(content.starts_with("@echo off\r\n"));
        assert!(content.ends_with("exit /b %EXIT_CODE%\r\n"));
        assert!(!content.replace("\r\n", "").contains('\n'));
        assert!(content.contains("if not exist \"%LOG_DIR%\" mkdir \"%LOG_DIR%\""));
        assert!(content.contains("set \"APP_EXECUTABLE=%APP_DIR%Ollama-OCR.exe\""));
        assert!(content.contains("\"%APP_EXECUTABLE%\" %* >> \"%LOG_FILE%\" 2>&1"));
        assert!(content.contains("set \"EXIT_CODE=%ERRORLEVEL%\""));
        assert!(content.contains("pause"));

        Ok(())
    }

    #[test]
    fn copy_assets_replaces_directories() -> Result<()> {
        let logger = null_logger();
        let source = tempfile::tempdir()?;
        let bundle = tempfile::tempdir()?;

        std::fs::write(source.path().join("logo.png"), b"png")?;
        std::fs::create_dir_all(source.path().join("static").join("css"))?;
        std::fs::write(source.path().join("static").join("css").join("app.css"), b"css")?;

        std::fs::create_dir_all(bundle.path().join("static"))?;
        std::fs::write(bundle.path().join("static").join("stale.txt"), b"old")?;

        let copied = copy_assets(
            &logger,
            source.path(),
            bundle.path(),
            &[
                PathBuf::from("logo.png"),
                PathBuf::from("static"),
                PathBuf::from("missing.svg"),
            ],
        )?;

        assert_eq!(copied.len(), 2);
        assert_eq!(std::fs::read(bundle.path().join("logo.png"))?, b"png");
        assert!(bundle.path().join("static").join("css").join("app.css").is_file());
        assert!(!bundle.path().join("static").join("stale.txt").exists());
        assert!(!bundle.path().join("missing.svg").exists());

        Ok(())
    }

    #[test]
    fn copy_assets_replaces_entries_of_other_kind() -> Result<()> {
        let logger = null_logger();
        let source = tempfile::tempdir()?;
        let bundle = tempfile::tempdir()?;

        std::fs::write(source.path().join("logo.png"), b"png")?;
        std::fs::create_dir(source.path().join("static"))?;
        std::fs::write(source.path().join("static").join("app.css"), b"css")?;

        std::fs::create_dir_all(bundle.path().join("logo.png").join("nested"))?;
        std::fs::write(bundle.path().join("static"), b"old file")?;

        copy_assets(
            &logger,
            source.path(),
            bundle.path(),
            &[PathBuf::from("logo.png"), PathBuf::from("static")],
        )?;

        assert_eq!(std::fs::read(bundle.path().join("logo.png"))?, b"png");
        assert_eq!(
            std::fs::read(bundle.path().join("static").join("app.css"))?,
            b"css"
        );

        Ok(())
    }
}
