//! Command line interface for cubepack.

mod args;
mod output;

pub use args::Args;
pub use output::OutputManager;

use crate::config::PackagerConfig;
use crate::error::Result;
use crate::pipeline::{Pipeline, ProgressSink};

/// Progress sink that renders percentages as tagged terminal lines.
struct ConsoleProgress<'a> {
    output: &'a OutputManager,
}

impl ProgressSink for ConsoleProgress<'_> {
    fn progress(&self, percent: u8) {
        self.output.progress(percent);
    }
}

/// Main CLI entry point. Returns the process exit code.
pub fn run() -> Result<i32> {
    let args = Args::parse_args();
    let output = OutputManager::new(args.verbose);

    if let Err(reason) = args.validate() {
        output.error(&reason);
        return Ok(1);
    }

    output.section(&format!("packaging {}", args.project_root.display()));

    let config = PackagerConfig::new(&args.project_root, &args.output)
        .with_toolchain_bin(args.toolchain.clone());
    let sink = ConsoleProgress { output: &output };
    let pipeline = Pipeline::new(&config).with_progress(&sink);

    match pipeline.run() {
        Ok(archives) => {
            for path in &archives {
                output.ok(&format!("created {}", path.display()));
            }
            output.ok(&format!(
                "{} archive(s) in {}",
                archives.len(),
                config.output_dir().display()
            ));
            Ok(0)
        }
        Err(e) => {
            output.error(&e.to_string());
            Ok(1)
        }
    }
}
