pub use std::env::*;

use indexmap::IndexMap;

/// Snapshot of the OS environment, the lowest-precedence variable source
/// (spec §6, "Variable sources and precedence").
pub fn os_vars() -> IndexMap<String, String> {
    vars().collect()
}
