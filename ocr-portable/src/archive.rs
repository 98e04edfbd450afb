// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use {
    anyhow::{anyhow, Context, Result},
    slog::{debug, info},
    std::{
        io::{Seek, Write},
        path::Path,
    },
};

/// Write every file under `bundle_dir` into a zip archive written to `writer`.
///
/// Member names are relative to the parent of `bundle_dir`, so the bundle's
/// own directory name is the top-level folder in the archive. Directories are
/// not emitted as members. Symlinks are followed and archived as the content
/// they point to. Returns the number of members written.
pub fn write_zip_from_directory<W: Write + Seek>(
    logger: &slog::Logger,
    writer: W,
    bundle_dir: &Path,
) -> Result<usize> {
    let base = bundle_dir
        .parent()
        .ok_or_else(|| anyhow!("{} has no parent directory", bundle_dir.display()))?;

    let mut zf = zip::ZipWriter::new(writer);
    let mut count = 0;

    // Walk in a stable order so archives are reproducible.
    let walk = walkdir::WalkDir::new(bundle_dir)
        .follow_links(true)
        .sort_by(|a, b| a.file_name().cmp(b.file_name()));

    for entry in walk {
        let entry = entry?;
        let path = entry.path();

        if entry.file_type().is_dir() {
            continue;
        } else if !entry.file_type().is_file() {
            return Err(anyhow!("cannot archive {}: not a regular file", path.display()));
        }

        let rel_path = path.strip_prefix(base)?;
        let name = rel_path
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        let options = zip::write::FileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated)
            .unix_permissions(0o644);

        debug!(logger, "adding {} as {}", path.display(), name);
        zf.start_file(name.as_str(), options)?;
        let mut fh = std::fs::File::open(path)
            .with_context(|| format!("opening {}", path.display()))?;
        std::io::copy(&mut fh, &mut zf)
            .with_context(|| format!("writing zip member {}", name))?;

        count += 1;
    }

    zf.finish().context("finishing zip file")?;

    Ok(count)
}

/// Write the bundle directory to a zip file at `archive_path`.
pub fn write_bundle_archive(
    logger: &slog::Logger,
    bundle_dir: &Path,
    archive_path: &Path,
) -> Result<usize> {
    info!(logger, "writing {}", archive_path.display());

    if let Some(parent) = archive_path.parent() {
        std::fs::create_dir_all(parent).context("creating parent directory")?;
    }

    let fh = std::fs::File::create(archive_path)
        .with_context(|| format!("opening {} for writing", archive_path.display()))?;

    let count = write_zip_from_directory(logger, fh, bundle_dir)
        .with_context(|| format!("archiving {}", bundle_dir.display()))?;

    info!(logger, "archived {} files", count);

    Ok(count)
}
