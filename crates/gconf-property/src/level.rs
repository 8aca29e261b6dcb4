//! Message severity levels shared by every component's `OutputLevel`

/// Most detailed output
pub const VERBOSE: i32 = 1;
/// Debugging output
pub const DEBUG: i32 = 2;
/// Normal informational output
pub const INFO: i32 = 3;
/// Warnings
pub const WARNING: i32 = 4;
/// Errors
pub const ERROR: i32 = 5;
/// Fatal errors only
pub const FATAL: i32 = 6;

/// Name of a level constant
#[must_use]
pub fn name(level: i32) -> Option<&'static str> {
    Some(match level {
        VERBOSE => "VERBOSE",
        DEBUG => "DEBUG",
        INFO => "INFO",
        WARNING => "WARNING",
        ERROR => "ERROR",
        FATAL => "FATAL",
        _ => return None,
    })
}

/// Level constant for a name, ignoring case
#[must_use]
pub fn from_name(name: &str) -> Option<i32> {
    Some(match name.to_ascii_uppercase().as_str() {
        "VERBOSE" => VERBOSE,
        "DEBUG" => DEBUG,
        "INFO" => INFO,
        "WARNING" => WARNING,
        "ERROR" => ERROR,
        "FATAL" => FATAL,
        _ => return None,
    })
}
