//! Host platform utility functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::env;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Environment variable pointing at the root of the software checkout. The
/// `params` and `sessions` directories are resolved relative to it.
pub const SW_ROOT_ENV_VAR: &str = "RAILTRAJ_SW_ROOT";

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the path to the software root directory.
pub fn get_sw_root() -> Result<PathBuf, env::VarError> {
    env::var(SW_ROOT_ENV_VAR).map(PathBuf::from)
}

/// Retrieve uname information of the host this executable is running on.
pub fn get_uname() -> std::io::Result<uname::Info> {
    uname::uname()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_uname() {
        let info = get_uname().unwrap();

        assert!(!info.sysname.is_empty());
        assert!(!info.nodename.is_empty());
        assert!(!info.machine.is_empty());
    }
}
