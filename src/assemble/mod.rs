//! Staging package assembly.
//!
//! Builds the per-platform staging directory: filtered project files, compiled
//! binaries from the dist directory, and a descriptor rewritten for the
//! target. Individual copy failures are logged and skipped; only the
//! descriptor write is a hard stop.

use crate::config::PackagerConfig;
use crate::error::Result;
use crate::exclude::ExclusionSet;
use crate::metadata::{self, ProjectMetadata};
use crate::platform::TargetPlatform;
use crate::scripts::ScriptEntry;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Assembles the staging directory for `target` and returns its path.
///
/// An existing staging directory from a previous run is destroyed first.
pub fn assemble(
    config: &PackagerConfig,
    meta: &ProjectMetadata,
    scripts: &[ScriptEntry],
    target: TargetPlatform,
    exclusions: &ExclusionSet,
) -> Result<PathBuf> {
    let staging = config.output_dir().join(meta.package_stem(target.suffix()));
    log::info!("assembling {}", staging.display());

    recreate_dir(&staging)?;
    copy_project_files(config, &staging, exclusions)?;
    copy_binaries(config, scripts, target, &staging);

    // Hard stop: a package without its descriptor is not installable.
    let descriptor = staging.join(crate::config::DESCRIPTOR_FILE);
    metadata::write_descriptor(&descriptor, meta, target.suffix())?;

    Ok(staging)
}

fn recreate_dir(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    fs::create_dir_all(path)?;
    Ok(())
}

/// Copies every non-excluded top-level entry into the staging root,
/// descending into directories with the filter applied at every level.
fn copy_project_files(
    config: &PackagerConfig,
    staging: &Path,
    exclusions: &ExclusionSet,
) -> Result<()> {
    let out_canonical = config.output_dir().canonicalize().ok();

    for entry in fs::read_dir(config.project_root())? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("skipping unreadable project entry: {e}");
                continue;
            }
        };
        let name = entry.file_name().to_string_lossy().into_owned();
        let file_type = match entry.file_type() {
            Ok(file_type) => file_type,
            Err(e) => {
                log::warn!("skipping {name}: {e}");
                continue;
            }
        };

        // Never copy the output directory into itself.
        if out_canonical.is_some() && entry.path().canonicalize().ok() == out_canonical {
            continue;
        }

        if exclusions.excludes_top_level(&name, file_type.is_file()) {
            log::debug!("excluded {name}");
            continue;
        }

        let dest = staging.join(entry.file_name());
        let copied = if file_type.is_dir() {
            copy_dir_filtered(&entry.path(), &dest, exclusions)
        } else if file_type.is_file() {
            fs::copy(entry.path(), &dest).map(|_| ())
        } else {
            log::debug!("skipping non-regular entry {name}");
            continue;
        };

        if let Err(e) = copied {
            log::warn!("failed to copy {name}: {e}");
        }
    }
    Ok(())
}

/// Filtered deep copy. A matching directory name prunes the whole subtree;
/// the top-level keep list does not apply below the root.
fn copy_dir_filtered(src: &Path, dest: &Path, exclusions: &ExclusionSet) -> io::Result<()> {
    fs::create_dir_all(dest)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if exclusions.is_excluded(&name) {
            continue;
        }
        let target_path = dest.join(entry.file_name());
        let file_type = entry.file_type()?;

        let copied = if file_type.is_dir() {
            copy_dir_filtered(&entry.path(), &target_path, exclusions)
        } else if file_type.is_file() {
            fs::copy(entry.path(), &target_path).map(|_| ())
        } else {
            continue;
        };

        if let Err(e) = copied {
            log::warn!("failed to copy {}: {e}", entry.path().display());
        }
    }
    Ok(())
}

/// Copies each script's compiled binary from the dist directory into the
/// staging root, marking Linux-target binaries executable.
fn copy_binaries(
    config: &PackagerConfig,
    scripts: &[ScriptEntry],
    target: TargetPlatform,
    staging: &Path,
) {
    for script in scripts {
        let bin_name = target.binary_name(&script.name);
        let src = config.dist_path().join(&bin_name);
        let dest = staging.join(&bin_name);

        match fs::copy(&src, &dest) {
            Ok(_) => {
                if target == TargetPlatform::Linux {
                    mark_executable(&dest);
                }
                log::debug!("staged binary {bin_name}");
            }
            Err(e) => log::warn!("cannot stage binary {}: {e}", src.display()),
        }
    }
}

#[cfg(unix)]
fn mark_executable(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(e) = fs::set_permissions(path, fs::Permissions::from_mode(0o755)) {
        log::warn!("cannot set permissions on {}: {e}", path.display());
    }
}

#[cfg(not(unix))]
fn mark_executable(_path: &Path) {}
