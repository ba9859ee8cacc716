//! Exit codes for `cr`
//!
//! Follows sysexits.h where a code exists for the failure class.

/// General error
pub const ERROR: i32 = 1;

/// Invalid or incomplete configuration
pub const CONFIG_ERROR: i32 = 2;

/// Unreadable chart or malformed package name
pub const CHART_ERROR: i32 = 3;

/// GitHub or git failure
pub const REMOTE_ERROR: i32 = 4;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: i32 = 5;
