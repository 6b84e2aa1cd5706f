//! Pipeline orchestration.
//!
//! Sequences metadata parsing, script discovery, and the per-platform
//! compile/package/archive steps. Fully sequential and blocking; progress is
//! reported through a fire-and-forget sink as a monotonically non-decreasing
//! percentage.

use crate::archive;
use crate::assemble;
use crate::compiler;
use crate::config::{ARCHIVE_EXT, PackagerConfig};
use crate::error::{PackagerError, Result};
use crate::exclude::{self, ExclusionSet};
use crate::metadata::{self, DistributionTag, ProjectMetadata};
use crate::platform::{self, TargetPlatform};
use crate::scripts::{self, ScriptEntry};
use std::fs;
use std::path::PathBuf;

/// Receiver for coarse-grained progress reports (0-100).
///
/// Invoked synchronously from the orchestrator's thread; implementations must
/// not block or reenter the pipeline.
pub trait ProgressSink {
    /// Reports overall progress as a percentage.
    fn progress(&self, percent: u8);
}

/// Sink that discards progress reports.
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn progress(&self, _percent: u8) {}
}

static NULL_PROGRESS: NullProgress = NullProgress;

/// The release-packaging pipeline for one project.
pub struct Pipeline<'a> {
    config: &'a PackagerConfig,
    progress: &'a dyn ProgressSink,
}

impl<'a> Pipeline<'a> {
    /// Creates a pipeline with no progress reporting.
    pub fn new(config: &'a PackagerConfig) -> Self {
        Self {
            config,
            progress: &NULL_PROGRESS,
        }
    }

    /// Attaches a progress sink.
    pub fn with_progress(mut self, sink: &'a dyn ProgressSink) -> Self {
        self.progress = sink;
        self
    }

    /// Runs the whole pipeline and returns the produced archive paths.
    ///
    /// Metadata and discovery failures, an unrecognized or host-incompatible
    /// distribution declaration, all abort the run. Toolchain, compile, and
    /// archive failures end the affected platform's steps; remaining platforms
    /// are still attempted, and the first such error is returned after the
    /// loop so the run exits non-zero.
    pub fn run(&self) -> Result<Vec<PathBuf>> {
        self.progress.progress(5);

        let meta = metadata::read_descriptor(&self.config.descriptor_path())?;
        log::info!(
            "packaging {} {} ({}) by {}",
            meta.app,
            meta.version,
            meta.name,
            meta.publisher
        );
        self.progress.progress(10);

        let scripts = scripts::discover(self.config, &meta.app)?;
        self.progress.progress(20);

        if meta.distribution == DistributionTag::Unrecognized {
            log::warn!(
                "unrecognized distribution tag '{}'; nothing to build",
                meta.platform_raw
            );
        }
        let targets = platform::applicable_targets(meta.distribution);
        for declared in platform::required_targets(meta.distribution) {
            if !targets.contains(declared) {
                log::info!("skipping {declared} build: this host cannot produce it");
            }
        }
        if targets.is_empty() {
            return Err(PackagerError::NoApplicablePlatform);
        }

        let ignore = exclude::load_ignore_file(&self.config.ignore_path());
        fs::create_dir_all(self.config.output_dir())?;

        let total_steps = targets.len() * 2;
        let mut archives = Vec::new();
        let mut platform_failure: Option<PackagerError> = None;

        for (index, target) in targets.into_iter().enumerate() {
            match self.build_target(&meta, &scripts, &ignore, target, index, total_steps) {
                Ok(path) => archives.push(path),
                Err(e) => {
                    log::error!("{target} build failed: {e}");
                    if platform_failure.is_none() {
                        platform_failure = Some(e);
                    }
                }
            }
        }

        if let Some(e) = platform_failure {
            return Err(e);
        }

        self.progress.progress(100);
        Ok(archives)
    }

    /// Compile, package, and archive one platform.
    fn build_target(
        &self,
        meta: &ProjectMetadata,
        scripts: &[ScriptEntry],
        ignore: &[String],
        target: TargetPlatform,
        index: usize,
        total_steps: usize,
    ) -> Result<PathBuf> {
        let toolchain = compiler::ensure_toolchain(self.config)?;
        compiler::compile_scripts(self.config, &toolchain, scripts, target)?;
        self.report_step(index * 2 + 1, total_steps);

        let exclusions = ExclusionSet::for_target(self.config, target, ignore);
        let staging = assemble::assemble(self.config, meta, scripts, target, &exclusions)?;

        let archive_path = self.config.output_dir().join(format!(
            "{}.{ARCHIVE_EXT}",
            meta.package_stem(target.suffix())
        ));
        let written = archive::write_archive(&staging, &archive_path)?;
        self.report_step(index * 2 + 2, total_steps);

        log::info!("✓ {target} package complete: {}", written.display());
        Ok(written)
    }

    /// Steps share the 20-90 band evenly; `step` is 1-based.
    fn report_step(&self, step: usize, total_steps: usize) {
        let percent = 20 + (70 * step) / total_steps;
        self.progress.progress(percent as u8);
    }
}
