//! Console logger implementation

use super::traits::Logger;

/// A logger that outputs to the console (stdout/stderr)
#[derive(Debug, Clone)]
pub struct ConsoleLogger {
    prefix: String,
}

impl Default for ConsoleLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleLogger {
    /// Create a new console logger with default prefix
    pub fn new() -> Self {
        Self {
            prefix: "[ToolBridge]".to_string(),
        }
    }

    /// Create a console logger with a custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Logger for ConsoleLogger {
    fn debug(&self, message: &str) {
        eprintln!("{} DEBUG: {}", self.prefix, message);
    }

    fn info(&self, message: &str) {
        println!("{} INFO: {}", self.prefix, message);
    }

    fn warn(&self, message: &str) {
        eprintln!("{} WARN: {}", self.prefix, message);
    }

    fn error(&self, message: &str) {
        eprintln!("{} ERROR: {}", self.prefix, message);
    }
}
