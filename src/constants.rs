//! Compiler-wide constants
//!
//! Names that appear in more than one pass, collected in one place.

/// Name of the function execution starts in
pub const ENTRY_POINT: &str = "main";

/// Prefix of virtual register names (`R0`, `R1`, ...)
pub const REGISTER_PREFIX: char = 'R';

/// Label stem for `if` and `if-else` statements (`IF0_THEN`, ...)
pub const IF_LABEL_STEM: &str = "IF";

/// Label stem for `while` loops (`WHILE0_START`, ...)
pub const WHILE_LABEL_STEM: &str = "WHILE";
