//! Distribution archive creation.
//!
//! Compresses a staging directory into a single deflate archive. Entry names
//! are forward-slash paths relative to the staging root; executable files
//! carry their mode bits so extraction restores them.

use crate::error::{PackagerError, Result};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Writes the staging tree at `staging` into the archive at `dest`,
/// overwriting any previous archive. Any I/O error is
/// [`PackagerError::ArchiveWriteFailed`], aborting this platform's run only.
pub fn write_archive(staging: &Path, dest: &Path) -> Result<PathBuf> {
    archive_tree(staging, dest).map_err(|reason| PackagerError::ArchiveWriteFailed {
        path: dest.to_path_buf(),
        reason,
    })
}

fn archive_tree(staging: &Path, dest: &Path) -> std::result::Result<PathBuf, String> {
    let file = File::create(dest).map_err(|e| e.to_string())?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in WalkDir::new(staging).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| e.to_string())?;
        let relative = entry
            .path()
            .strip_prefix(staging)
            .map_err(|e| e.to_string())?;
        let name = entry_name(relative);

        if entry.file_type().is_dir() {
            zip.add_directory(name, options).map_err(|e| e.to_string())?;
        } else {
            let file_options = if is_executable(entry.path()) {
                options.unix_permissions(0o755)
            } else {
                options
            };
            zip.start_file(name, file_options)
                .map_err(|e| e.to_string())?;
            let mut src = File::open(entry.path()).map_err(|e| e.to_string())?;
            io::copy(&mut src, &mut zip).map_err(|e| e.to_string())?;
        }
    }

    zip.finish().map_err(|e| e.to_string())?;
    log::info!("✓ wrote archive {}", dest.display());
    Ok(dest.to_path_buf())
}

/// Forward-slash entry name, regardless of the host's separator.
fn entry_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(_path: &Path) -> bool {
    false
}
