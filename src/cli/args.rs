//! Command line argument parsing and validation.

use clap::Parser;
use std::path::PathBuf;

/// Release packager for Cube application projects
#[derive(Parser, Debug)]
#[command(
    name = "cubepack",
    version,
    about = "Release packager for Cube application projects",
    long_about = "Compiles a project's scripts to native binaries and assembles one \
distributable .cub archive per declared target platform.

Reads cube.xml at the project root for publisher, app, version, and the declared \
distribution targets. Platforms the host cannot build are skipped, not failed.

Usage:
  cubepack .
  cubepack ~/projects/widget --output /tmp/out

Exit code 0 = every declared, buildable platform produced its archive."
)]
pub struct Args {
    /// Project root containing cube.xml
    #[arg(value_name = "PROJECT_ROOT", default_value = ".")]
    pub project_root: PathBuf,

    /// Output directory for staging packages and archives
    #[arg(short = 'o', long, value_name = "DIR", default_value = "releases")]
    pub output: PathBuf,

    /// Compiler executable to invoke
    #[arg(long, value_name = "BIN", env = "CUBEPACK_TOOLCHAIN", default_value = "pyinstaller")]
    pub toolchain: String,

    /// Print per-step detail
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        if !self.project_root.is_dir() {
            return Err(format!(
                "project root does not exist: {}",
                self.project_root.display()
            ));
        }
        if self.toolchain.trim().is_empty() {
            return Err("toolchain executable cannot be empty".to_string());
        }
        Ok(())
    }
}
