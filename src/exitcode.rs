//! Exit codes following BSD sysexits(3) conventions.

/// Successful termination
pub const OK: i32 = 0;

/// Command line usage error
pub const USAGE: i32 = 64;

/// Input data was incorrect (duplicates, bad sponsor, unknown member)
pub const DATAERR: i32 = 65;

/// Internal software error
pub const SOFTWARE: i32 = 70;

/// Input/output error
pub const IOERR: i32 = 74;

/// Something was found in an unconfigured or misconfigured state
pub const CONFIG: i32 = 78;
