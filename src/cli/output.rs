//! Severity-tagged terminal output.
//!
//! Every diagnostic line carries an INFO/OK/WARN/ERROR prefix; tags are
//! colored when the stream is a terminal.

use crossterm::style::{Color, Stylize};
use is_terminal::IsTerminal;

/// Writer for user-facing diagnostics.
#[derive(Clone, Debug)]
pub struct OutputManager {
    color_stdout: bool,
    color_stderr: bool,
    verbose: bool,
}

impl OutputManager {
    /// Creates an output manager, detecting terminal color support per stream.
    pub fn new(verbose: bool) -> Self {
        Self {
            color_stdout: std::io::stdout().is_terminal(),
            color_stderr: std::io::stderr().is_terminal(),
            verbose,
        }
    }

    /// Informational message.
    pub fn info(&self, message: &str) {
        println!("{} {message}", self.tag("INFO ", Color::Cyan, self.color_stdout));
    }

    /// Success message.
    pub fn ok(&self, message: &str) {
        println!("{} {message}", self.tag("OK   ", Color::Green, self.color_stdout));
    }

    /// Warning message.
    pub fn warn(&self, message: &str) {
        println!("{} {message}", self.tag("WARN ", Color::Yellow, self.color_stdout));
    }

    /// Error message, written to standard error.
    pub fn error(&self, message: &str) {
        eprintln!("{} {message}", self.tag("ERROR", Color::Red, self.color_stderr));
    }

    /// Pipeline progress line.
    pub fn progress(&self, percent: u8) {
        self.info(&format!("[{percent:>3}%]"));
    }

    /// Section header.
    pub fn section(&self, title: &str) {
        self.info(&format!("=== {title} ==="));
    }

    /// Indented detail line.
    pub fn indent(&self, message: &str) {
        println!("      {message}");
    }

    /// Detail message, shown only in verbose mode.
    pub fn verbose(&self, message: &str) {
        if self.verbose {
            self.info(message);
        }
    }

    fn tag(&self, label: &'static str, color: Color, colored: bool) -> String {
        if colored {
            format!("{}", label.with(color))
        } else {
            label.to_string()
        }
    }
}
