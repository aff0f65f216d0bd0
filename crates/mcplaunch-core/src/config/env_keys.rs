//! Environment variable key constants and aliases.
//!
//! Primary variables use the `MCPLAUNCH_*` prefix. None of them are forwarded
//! as launcher-specific settings to the target; the target simply inherits
//! the environment it was started with plus the activation edits.

/// Config file and profile resolution
pub mod config {
    pub const MCPLAUNCH_CONFIG: &str = "MCPLAUNCH_CONFIG";
    pub const CONFIG_FILE_NAME: &str = "mcplaunch.yaml";
    pub const CONFIG_DIR_NAME: &str = "mcplaunch";
}

/// Runtime environment activation
pub mod runtime {
    pub const MCPLAUNCH_CONDA_ROOT: &str = "MCPLAUNCH_CONDA_ROOT";

    /// Set by conda itself; points at `<root>/bin/conda` (or `condabin/conda`).
    pub const CONDA_EXE: &str = "CONDA_EXE";

    /// Spawn-and-wait instead of replacing the process image.
    pub const MCPLAUNCH_SPAWN: &str = "MCPLAUNCH_SPAWN";
}

/// 可观测性与日志
pub mod observability {
    pub const MCPLAUNCH_QUIET: &str = "MCPLAUNCH_QUIET";
    pub const MCPLAUNCH_LOG_LEVEL: &str = "MCPLAUNCH_LOG_LEVEL";
    pub const MCPLAUNCH_LOG_JSON: &str = "MCPLAUNCH_LOG_JSON";
}

/// Variables written by environment activation.
pub mod activation {
    pub const PATH: &str = "PATH";
    pub const PYTHONHOME: &str = "PYTHONHOME";
    pub const CONDA_PREFIX: &str = "CONDA_PREFIX";
    pub const CONDA_DEFAULT_ENV: &str = "CONDA_DEFAULT_ENV";
    pub const CONDA_SHLVL: &str = "CONDA_SHLVL";
    pub const CONDA_PROMPT_MODIFIER: &str = "CONDA_PROMPT_MODIFIER";
    pub const VIRTUAL_ENV: &str = "VIRTUAL_ENV";
}
