//! cubepack - release packager for Cube application projects.
//!
//! Compiles a project's scripts with the external compiler toolchain and
//! assembles one distributable archive per declared target platform.

use std::process;

fn main() {
    // Initialize logging
    env_logger::init();

    // Run CLI and get exit code
    let exit_code = match cubepack::cli::run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    };

    process::exit(exit_code);
}
