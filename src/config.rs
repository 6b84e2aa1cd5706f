//! Immutable run configuration.
//!
//! One `PackagerConfig` is constructed at startup and passed by reference into
//! every component; no component reads ambient global state.

use std::path::{Path, PathBuf};

/// Descriptor filename expected at the project root.
pub const DESCRIPTOR_FILE: &str = "cube.xml";

/// Optional ignore-pattern filename at the project root.
pub const IGNORE_FILE: &str = ".cubeignore";

/// File extension of produced distribution archives.
pub const ARCHIVE_EXT: &str = "cub";

/// Central configuration for one packaging run.
///
/// Collects the paths and naming conventions the pipeline components share.
/// Constructed once via [`PackagerConfig::new`]; the `with_*` methods exist to
/// reproduce the historical variants of the pipeline (different self-exclusion
/// filenames and extra exclusion patterns) and to redirect the toolchain in tests.
#[derive(Clone, Debug)]
pub struct PackagerConfig {
    /// Project root containing the descriptor and scripts.
    project_root: PathBuf,

    /// Directory receiving staging packages and archives.
    output_dir: PathBuf,

    /// Directory under the project root holding icons and bundled assets.
    asset_dir: String,

    /// Directories bundled into compiled binaries when present.
    data_dirs: Vec<String>,

    /// Compiler output directory, project-root relative.
    dist_dir: String,

    /// Compiler work/spec directory, project-root relative.
    work_dir: String,

    /// Compiler executable name (or absolute path).
    toolchain_bin: String,

    /// The tool's own entry-point filenames, excluded from discovery.
    tool_script_names: Vec<String>,

    /// Additional exclusion patterns beyond the built-in set.
    extra_exclude_patterns: Vec<String>,
}

impl PackagerConfig {
    /// Creates a configuration with the conventional layout for `project_root`.
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(project_root: P, output_dir: Q) -> Self {
        Self {
            project_root: project_root.as_ref().to_path_buf(),
            output_dir: output_dir.as_ref().to_path_buf(),
            asset_dir: "assets".to_string(),
            data_dirs: vec!["assets".to_string(), "data".to_string()],
            dist_dir: "dist".to_string(),
            work_dir: "build".to_string(),
            toolchain_bin: "pyinstaller".to_string(),
            tool_script_names: vec!["cubepack.py".to_string(), "cubepack-gui.py".to_string()],
            extra_exclude_patterns: Vec::new(),
        }
    }

    /// Overrides the compiler executable.
    pub fn with_toolchain_bin<S: Into<String>>(mut self, bin: S) -> Self {
        self.toolchain_bin = bin.into();
        self
    }

    /// Overrides the self-exclusion filename list.
    pub fn with_tool_script_names(mut self, names: Vec<String>) -> Self {
        self.tool_script_names = names;
        self
    }

    /// Adds exclusion patterns on top of the built-in set.
    pub fn with_extra_exclude_patterns(mut self, patterns: Vec<String>) -> Self {
        self.extra_exclude_patterns = patterns;
        self
    }

    /// Returns the project root.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Returns the output directory for staging packages and archives.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Returns the descriptor path inside the project root.
    pub fn descriptor_path(&self) -> PathBuf {
        self.project_root.join(DESCRIPTOR_FILE)
    }

    /// Returns the ignore-file path inside the project root.
    pub fn ignore_path(&self) -> PathBuf {
        self.project_root.join(IGNORE_FILE)
    }

    /// Returns the asset directory name.
    pub fn asset_dir(&self) -> &str {
        &self.asset_dir
    }

    /// Returns the asset directory path inside the project root.
    pub fn asset_path(&self) -> PathBuf {
        self.project_root.join(&self.asset_dir)
    }

    /// Returns the directories bundled into compiled binaries when present.
    pub fn data_dirs(&self) -> &[String] {
        &self.data_dirs
    }

    /// Returns the compiler output directory path.
    pub fn dist_path(&self) -> PathBuf {
        self.project_root.join(&self.dist_dir)
    }

    /// Returns the compiler work directory path.
    pub fn work_path(&self) -> PathBuf {
        self.project_root.join(&self.work_dir)
    }

    /// Returns the compiler executable name or path.
    pub fn toolchain_bin(&self) -> &str {
        &self.toolchain_bin
    }

    /// Returns the tool's own entry-point filenames.
    pub fn tool_script_names(&self) -> &[String] {
        &self.tool_script_names
    }

    /// Returns the extra exclusion patterns.
    pub fn extra_exclude_patterns(&self) -> &[String] {
        &self.extra_exclude_patterns
    }
}
