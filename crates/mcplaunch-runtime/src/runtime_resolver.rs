//! RuntimeResolver trait: extension point for new environment kinds (pixi, uv, ...).
//!
//! The launcher asks `resolver_for(spec)` for a resolver and calls
//! `activate` before resolving the target executable.

use std::ffi::OsStr;
use std::path::PathBuf;

use mcplaunch_core::config::{EnvironmentSpec, RuntimeConfig};
use mcplaunch_core::error::Result;

use crate::env::activation::{activate_conda, activate_venv, ActivatedEnvironment};

/// Turns an environment description into child-process environment edits.
pub trait RuntimeResolver: Send + Sync {
    /// Short kind name used in logs ("conda", "venv", ...).
    fn kind(&self) -> &'static str;

    /// Validate the environment and build its edits on top of `inherited_path`.
    fn activate(&self, inherited_path: Option<&OsStr>) -> Result<ActivatedEnvironment>;
}

pub struct CondaResolver {
    pub name: String,
    pub root: Option<PathBuf>,
    pub runtime: RuntimeConfig,
}

impl RuntimeResolver for CondaResolver {
    fn kind(&self) -> &'static str {
        "conda"
    }

    fn activate(&self, inherited_path: Option<&OsStr>) -> Result<ActivatedEnvironment> {
        activate_conda(&self.name, self.root.as_deref(), &self.runtime, inherited_path)
    }
}

pub struct VenvResolver {
    pub path: PathBuf,
}

impl RuntimeResolver for VenvResolver {
    fn kind(&self) -> &'static str {
        "venv"
    }

    fn activate(&self, inherited_path: Option<&OsStr>) -> Result<ActivatedEnvironment> {
        activate_venv(&self.path, inherited_path)
    }
}

/// No activation: the target sees the launcher's own environment.
pub struct InheritResolver;

impl RuntimeResolver for InheritResolver {
    fn kind(&self) -> &'static str {
        "inherit"
    }

    fn activate(&self, _inherited_path: Option<&OsStr>) -> Result<ActivatedEnvironment> {
        Ok(ActivatedEnvironment::inherit())
    }
}

pub fn resolver_for(spec: &EnvironmentSpec, runtime: &RuntimeConfig) -> Box<dyn RuntimeResolver> {
    match spec {
        EnvironmentSpec::Conda { name, root } => Box::new(CondaResolver {
            name: name.clone(),
            root: root.clone(),
            runtime: runtime.clone(),
        }),
        EnvironmentSpec::Venv { path } => Box::new(VenvResolver { path: path.clone() }),
        EnvironmentSpec::Inherit => Box::new(InheritResolver),
    }
}
