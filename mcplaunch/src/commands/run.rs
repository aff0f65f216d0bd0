//! `mcplaunch run` and the dedicated launchers.

use std::ffi::OsString;

use anyhow::Result;
use mcplaunch_core::config::{ProfileRegistry, RuntimeConfig};
use mcplaunch_runtime::launcher::{LaunchMode, Launcher};

/// Resolve `profile` and hand control to its target.
///
/// In replace mode this only returns on failure; otherwise it returns the
/// target's exit code.
pub fn launch_profile(profile: &str, args: Vec<OsString>) -> Result<i32> {
    let runtime = RuntimeConfig::from_env();
    let registry = ProfileRegistry::discover(&runtime)?;
    let config = registry.get(profile)?;
    let mode = LaunchMode::from_runtime(&runtime);
    let code = Launcher::new(runtime).launch(config, args, mode)?;
    Ok(code)
}
