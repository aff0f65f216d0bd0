//! 按领域分组的配置结构体
//!
//! Loaded from environment variables with a single fallback policy.

use super::env_keys::{config as cfg_keys, observability as obv_keys, runtime as rt_keys};
use super::loader::{env_bool, env_optional, env_or};
use crate::paths::expand_home;
use std::path::PathBuf;

/// 可观测性配置：quiet、log_level、log_json
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub quiet: bool,
    pub log_level: String,
    pub log_json: bool,
}

impl ObservabilityConfig {
    pub fn from_env() -> &'static Self {
        use std::sync::OnceLock;
        static CACHE: OnceLock<ObservabilityConfig> = OnceLock::new();
        CACHE.get_or_init(|| Self {
            quiet: env_bool(obv_keys::MCPLAUNCH_QUIET, &[], false),
            log_level: env_or(obv_keys::MCPLAUNCH_LOG_LEVEL, &[], || "warn".to_string()),
            log_json: env_bool(obv_keys::MCPLAUNCH_LOG_JSON, &[], false),
        })
    }
}

/// Launch-time settings: config file override, conda root, exec mode.
#[derive(Debug, Clone, Default)]
pub struct RuntimeConfig {
    /// Explicit profiles file (`MCPLAUNCH_CONFIG`); must exist when set.
    pub config_path: Option<PathBuf>,
    /// Conda installation root (`MCPLAUNCH_CONDA_ROOT`).
    pub conda_root: Option<PathBuf>,
    /// `CONDA_EXE` as exported by an already initialized conda shell.
    pub conda_exe: Option<PathBuf>,
    /// Spawn-and-wait instead of replacing the process image.
    pub force_spawn: bool,
}

impl RuntimeConfig {
    pub fn from_env() -> Self {
        Self {
            config_path: env_optional(cfg_keys::MCPLAUNCH_CONFIG, &[])
                .map(|p| expand_home(&PathBuf::from(p))),
            conda_root: env_optional(rt_keys::MCPLAUNCH_CONDA_ROOT, &[])
                .map(|p| expand_home(&PathBuf::from(p))),
            conda_exe: env_optional(rt_keys::CONDA_EXE, &[]).map(PathBuf::from),
            force_spawn: env_bool(rt_keys::MCPLAUNCH_SPAWN, &[], false),
        }
    }
}
