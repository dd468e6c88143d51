//! ANSI escape codes shared by tables and reports.

pub const RESET: &str = "\x1b[0m";
pub const GREY: &str = "\x1b[90m";
pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const CYAN: &str = "\x1b[36m";

/// Placeholder for a value that was never recorded.
pub const MISSING: &str = "--";

/// `MISSING`, dimmed.
pub fn missing() -> String {
    format!("{GREY}{MISSING}{RESET}")
}
