// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use {
    crate::error::{LauncherError, Result},
    slog::info,
    std::path::{Path, PathBuf},
};

/// Locations of the application script relative to a bundle, in search order.
///
/// The first is the source tree layout, the second the data folder of a
/// one-directory build.
fn relative_candidates() -> [PathBuf; 3] {
    [
        Path::new("src").join("ollama_ocr").join("app.py"),
        Path::new("ollama_ocr").join("app.py"),
        PathBuf::from("app.py"),
    ]
}

/// Possible paths of the application script.
///
/// Each relative candidate is tried against the bundle directory and then
/// against its parent.
pub fn candidate_app_paths(bundle_dir: &Path) -> Vec<PathBuf> {
    relative_candidates()
        .iter()
        .flat_map(|candidate| {
            std::iter::once(bundle_dir.join(candidate))
                .chain(bundle_dir.parent().map(|parent| parent.join(candidate)))
        })
        .collect()
}

/// Find the application script for a bundle.
pub fn locate_app(logger: &slog::Logger, bundle_dir: &Path) -> Result<PathBuf> {
    let app_path = candidate_app_paths(bundle_dir)
        .into_iter()
        .find(|p| p.is_file())
        .ok_or_else(|| LauncherError::AppNotFound {
            bundle_dir: bundle_dir.to_path_buf(),
        })?;

    info!(logger, "Found Streamlit app at {}", app_path.display());

    Ok(app_path)
}

#[cfg(test)]
mod tests {
    use {super::*, crate::logging::null_logger};

    #[test]
    fn candidate_order() {
        let candidates = candidate_app_paths(Path::new("/bundle/Ollama-OCR"));

        assert_eq!(
            candidates,
            vec![
                PathBuf::from("/bundle/Ollama-OCR/src/ollama_ocr/app.py"),
                PathBuf::from("/bundle/src/ollama_ocr/app.py"),
                PathBuf::from("/bundle/Ollama-OCR/ollama_ocr/app.py"),
                PathBuf::from("/bundle/ollama_ocr/app.py"),
                PathBuf::from("/bundle/Ollama-OCR/app.py"),
                PathBuf::from("/bundle/app.py"),
            ]
        );
    }

    #[test]
    fn empty_bundle_is_not_found() -> Result<()> {
        let td = tempfile::tempdir()?;
        let bundle = td.path().join("Ollama-OCR");
        std::fs::create_dir(&bundle)?;

        match locate_app(&null_logger(), &bundle) {
            Err(LauncherError::AppNotFound { bundle_dir }) => assert_eq!(bundle_dir, bundle),
            other => panic!("unexpected result: {:?}", other),
        }

        Ok(())
    }

    #[test]
    fn first_existing_candidate_wins() -> Result<()> {
        let td = tempfile::tempdir()?;
        let bundle = td.path().join("Ollama-OCR");
        std::fs::create_dir_all(bundle.join("ollama_ocr"))?;
        std::fs::create_dir_all(td.path().join("src").join("ollama_ocr"))?;

        std::fs::write(bundle.join("app.py"), b"")?;
        std::fs::write(bundle.join("ollama_ocr").join("app.py"), b"")?;
        std::fs::write(td.path().join("src").join("ollama_ocr").join("app.py"), b"")?;

        assert_eq!(
            locate_app(&null_logger(), &bundle)?,
            td.path().join("src").join("ollama_ocr").join("app.py")
        );

        Ok(())
    }
}
