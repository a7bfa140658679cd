//! Host platform utility functions

use std::env;
use std::path::PathBuf;

/// Name of the environment variable pointing at the root of the software
/// checkout (the directory containing `params/` and `sessions/`).
pub const SW_ROOT_ENV_VAR: &str = "TURRET_SW_ROOT";

/// Get the software root directory.
pub fn get_sw_root() -> Result<PathBuf, env::VarError> {
    env::var(SW_ROOT_ENV_VAR).map(PathBuf::from)
}
