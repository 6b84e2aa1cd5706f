//! Script discovery in the project root.

use crate::config::PackagerConfig;
use crate::error::{PackagerError, Result};
use std::path::PathBuf;

/// A source script selected for compilation.
#[derive(Clone, Debug)]
pub struct ScriptEntry {
    /// Logical name, used as the compiled binary's stem.
    pub name: String,

    /// Source file path.
    pub source: PathBuf,

    /// Embedded icon, when one exists in the asset directory.
    pub icon: Option<PathBuf>,

    /// Whether this is the application entry point. Exactly one entry is main.
    pub is_main: bool,
}

/// Discovers the main script (`{app}.py`) and every secondary top-level `.py`
/// file, excluding leading-underscore modules and the tool's own entry points.
///
/// Returns [`PackagerError::NoScriptsFound`] when nothing is discovered; the
/// pipeline cannot proceed without at least one script. Order is
/// deterministic: main first, then secondaries alphabetically.
pub fn discover(config: &PackagerConfig, app: &str) -> Result<Vec<ScriptEntry>> {
    let root = config.project_root();
    let mut entries = Vec::new();

    let main_source = root.join(format!("{app}.py"));
    if main_source.is_file() {
        log::debug!("main script: {}", main_source.display());
        entries.push(ScriptEntry {
            name: app.to_string(),
            source: main_source,
            icon: resolve_icon(config, app, true),
            is_main: true,
        });
    }

    let mut secondary = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy().into_owned();
        let Some(stem) = file_name.strip_suffix(".py") else {
            continue;
        };
        if stem == app || file_name.starts_with('_') {
            continue;
        }
        if config
            .tool_script_names()
            .iter()
            .any(|n| n.eq_ignore_ascii_case(&file_name))
        {
            log::debug!("skipping the tool's own script {file_name}");
            continue;
        }
        secondary.push(ScriptEntry {
            name: stem.to_string(),
            source: entry.path(),
            icon: resolve_icon(config, stem, false),
            is_main: false,
        });
    }

    secondary.sort_by(|a, b| a.name.cmp(&b.name));
    entries.extend(secondary);

    if entries.is_empty() {
        return Err(PackagerError::NoScriptsFound {
            root: root.to_path_buf(),
        });
    }

    log::info!("discovered {} script(s)", entries.len());
    Ok(entries)
}

/// Icon lookup: `{assetDir}/{name}-icon.ico`, then (main only) the shared
/// `{assetDir}/app-icon.ico`. Absence is not an error; the compiler embeds no
/// icon for that script.
fn resolve_icon(config: &PackagerConfig, name: &str, is_main: bool) -> Option<PathBuf> {
    let assets = config.asset_path();

    let named = assets.join(format!("{name}-icon.ico"));
    if named.is_file() {
        return Some(named);
    }
    if is_main {
        let shared = assets.join("app-icon.ico");
        if shared.is_file() {
            return Some(shared);
        }
    }
    None
}
