//! Exclusion-pattern filtering for package assembly.
//!
//! A path is excluded when any pattern matches its basename (OR-combined,
//! case-insensitive, `*`/`?` glob semantics). The set composes built-in
//! artifact patterns, `.cubeignore` patterns, a target-specific launcher
//! pattern, and the source patterns that keep `.py` files out of binary-only
//! packages. Matching is pure; the same inputs always give the same verdicts.

use crate::config::PackagerConfig;
use crate::platform::TargetPlatform;
use glob::{MatchOptions, Pattern};
use std::path::Path;

/// Build artifacts, caches, and compiler configuration never shipped.
const BUILTIN_PATTERNS: &[&str] = &[
    "__pycache__",
    "build",
    "dist",
    "releases",
    "*.spec",
    ".git",
    ".gitignore",
    ".gitattributes",
    ".cubeignore",
    "venv",
    ".venv",
    "*.pyc",
    "*.pyo",
    ".idea",
    ".vscode",
];

/// Source files never ship in a binary-only package.
const SOURCE_PATTERNS: &[&str] = &["*.py", "*.pyw"];

/// Top-level files that bypass exclusion even when a broad pattern matches.
const KEEP_PATTERNS: &[&str] = &["readme*", "license*", "changelog*"];

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Compiled exclusion rules for one target platform.
pub struct ExclusionSet {
    patterns: Vec<Pattern>,
    keep: Vec<Pattern>,
}

impl ExclusionSet {
    /// Composes the exclusion set for `target` from the built-in patterns,
    /// configured extras, and the patterns loaded from the ignore file.
    pub fn for_target(
        config: &PackagerConfig,
        target: TargetPlatform,
        ignore_patterns: &[String],
    ) -> Self {
        let mut sources: Vec<&str> = Vec::new();
        sources.extend(BUILTIN_PATTERNS);
        sources.extend(config.extra_exclude_patterns().iter().map(String::as_str));
        sources.extend(ignore_patterns.iter().map(String::as_str));
        // Foreign launcher scripts have no use on this target.
        sources.push(match target {
            TargetPlatform::Windows => "*.sh",
            TargetPlatform::Linux => "*.bat",
        });
        sources.extend(SOURCE_PATTERNS);

        let patterns = sources
            .into_iter()
            .filter_map(|p| match Pattern::new(p) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    log::warn!("ignoring invalid exclusion pattern '{p}': {e}");
                    None
                }
            })
            .collect();

        let mut keep: Vec<Pattern> = KEEP_PATTERNS
            .iter()
            .filter_map(|p| Pattern::new(p).ok())
            .collect();
        if let Ok(descriptor) = Pattern::new(crate::config::DESCRIPTOR_FILE) {
            keep.push(descriptor);
        }

        Self { patterns, keep }
    }

    /// Whether `name` matches any exclusion pattern. First match wins.
    pub fn is_excluded(&self, name: &str) -> bool {
        self.patterns
            .iter()
            .any(|p| p.matches_with(name, MATCH_OPTIONS))
    }

    /// Top-level verdict: plain files on the always-keep list bypass exclusion;
    /// directories and everything below them never do.
    pub fn excludes_top_level(&self, name: &str, is_file: bool) -> bool {
        if is_file && self.keep.iter().any(|p| p.matches_with(name, MATCH_OPTIONS)) {
            return false;
        }
        self.is_excluded(name)
    }
}

/// Loads patterns from an ignore file: one glob per line, `#` comments and
/// blank lines skipped, leading and trailing path separators stripped.
/// A missing file yields an empty set.
pub fn load_ignore_file(path: &Path) -> Vec<String> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                log::warn!("cannot read {}: {e}", path.display());
            }
            return Vec::new();
        }
    };

    content
        .lines()
        .map(|line| line.trim().trim_matches(['/', '\\']))
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}
