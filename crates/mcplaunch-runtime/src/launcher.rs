//! The launch sequence: change directory, activate the environment, replace the process.
//!
//! The three steps run strictly in order and the first failure stops the
//! sequence, so a missing project directory never reaches activation and a
//! failed activation never reaches exec.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use mcplaunch_core::config::env_keys::activation as keys;
use mcplaunch_core::config::{LaunchConfig, RuntimeConfig};
use mcplaunch_core::error::{LaunchError, Result};
use mcplaunch_core::paths::absolutize;
use serde_json::{json, Value};

use crate::common::{exit_code_of, find_executable, map_exec_error};
use crate::env::{ActivatedEnvironment, EnvEdit};
use crate::runtime_resolver::resolver_for;

/// How control is handed to the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchMode {
    /// Replace the current process image; only returns on failure.
    Replace,
    /// Spawn with inherited stdio, wait, and report the child's exit code.
    Spawn,
}

impl LaunchMode {
    /// Replace on Unix unless MCPLAUNCH_SPAWN is set; always spawn elsewhere.
    pub fn from_runtime(runtime: &RuntimeConfig) -> Self {
        if runtime.force_spawn || !cfg!(unix) {
            Self::Spawn
        } else {
            Self::Replace
        }
    }
}

/// Everything needed to start the target, resolved but not yet executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    pub profile: String,
    pub working_dir: PathBuf,
    pub environment: String,
    pub prefix: Option<PathBuf>,
    /// Environment directories put in front of PATH.
    pub bin_dirs: Vec<PathBuf>,
    pub executable: PathBuf,
    /// Arguments after argv[0]: fixed profile args, then the caller's.
    pub argv: Vec<OsString>,
    pub env: Vec<EnvEdit>,
}

impl LaunchPlan {
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(&self.executable);
        cmd.args(&self.argv).current_dir(&self.working_dir);
        for edit in &self.env {
            match edit {
                EnvEdit::Set(k, v) => {
                    cmd.env(k, v);
                }
                EnvEdit::Remove(k) => {
                    cmd.env_remove(k);
                }
            }
        }
        cmd
    }

    pub fn to_json(&self) -> Value {
        let env: Vec<Value> = self
            .env
            .iter()
            .map(|e| match e {
                EnvEdit::Set(k, v) => json!({ "set": k, "value": v.to_string_lossy() }),
                EnvEdit::Remove(k) => json!({ "unset": k }),
            })
            .collect();
        json!({
            "profile": self.profile,
            "environment": self.environment,
            "prefix": self.prefix.as_ref().map(|p| p.display().to_string()),
            "bin_dirs": self.bin_dirs.iter().map(|d| d.display().to_string()).collect::<Vec<_>>(),
            "working_dir": self.working_dir.display().to_string(),
            "executable": self.executable.display().to_string(),
            "argv": self.argv.iter().map(|a| a.to_string_lossy().to_string()).collect::<Vec<_>>(),
            "env": env,
        })
    }

    /// Hand control to the target. In `Replace` mode this only returns on
    /// failure; in `Spawn` mode it returns the target's exit code.
    pub fn execute(&self, mode: LaunchMode) -> Result<i32> {
        tracing::info!(
            profile = %self.profile,
            environment = %self.environment,
            program = %self.executable.display(),
            argc = self.argv.len(),
            mode = ?mode,
            "Launching target"
        );

        let mut cmd = self.command();
        match mode {
            LaunchMode::Replace => replace_process(&mut cmd, self),
            LaunchMode::Spawn => spawn_and_wait(&mut cmd, self),
        }
    }
}

/// Step 1: the project directory must exist and be enterable.
///
/// Relative directories are anchored at the launcher's working directory.
fn check_project_dir(dir: &Path) -> Result<PathBuf> {
    let abs = absolutize(dir).map_err(|_| LaunchError::DirectoryNotFound(dir.to_path_buf()))?;
    // `dir/.` can only be stat'ed with search permission on `dir`
    if !abs.is_dir() || abs.join(".").metadata().is_err() {
        return Err(LaunchError::DirectoryNotFound(abs));
    }
    Ok(abs)
}

pub struct Launcher {
    runtime: RuntimeConfig,
    inherited_path: Option<OsString>,
    path_injected: bool,
}

impl Launcher {
    pub fn new(runtime: RuntimeConfig) -> Self {
        Self {
            runtime,
            inherited_path: std::env::var_os(keys::PATH),
            path_injected: false,
        }
    }

    /// Use `path` instead of the process PATH as the base search path.
    /// The target receives it even when no environment is activated.
    pub fn with_inherited_path(mut self, path: Option<OsString>) -> Self {
        self.inherited_path = path;
        self.path_injected = true;
        self
    }

    /// Run steps 1 and 2 and resolve the target, without executing it.
    pub fn plan<I, S>(&self, config: &LaunchConfig, caller_args: I) -> Result<LaunchPlan>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        // Step 1: project directory
        let working_dir = check_project_dir(&config.project_dir)?;
        tracing::debug!(profile = %config.name, dir = %working_dir.display(), "Project directory ok");

        // Step 2: environment activation
        let resolver = resolver_for(&config.environment, &self.runtime);
        let activated = resolver.activate(self.inherited_path.as_deref())?;
        tracing::debug!(
            profile = %config.name,
            kind = resolver.kind(),
            prefix = ?activated.prefix,
            "Environment activated"
        );

        // Step 3 (resolution only): target executable
        let search_path = activated
            .path_override()
            .or(self.inherited_path.as_deref());
        let executable = find_executable(&config.program, search_path, &working_dir)?;

        let argv: Vec<OsString> = config
            .args
            .iter()
            .map(OsString::from)
            .chain(caller_args.into_iter().map(Into::into))
            .collect();

        let env = self.child_env(&activated, config);

        Ok(LaunchPlan {
            profile: config.name.clone(),
            working_dir,
            environment: activated.label,
            prefix: activated.prefix,
            bin_dirs: activated.bin_dirs,
            executable,
            argv,
            env,
        })
    }

    fn child_env(&self, activated: &ActivatedEnvironment, config: &LaunchConfig) -> Vec<EnvEdit> {
        let mut env = activated.edits.clone();
        if self.path_injected && activated.path_override().is_none() {
            if let Some(ref p) = self.inherited_path {
                env.push(EnvEdit::Set(keys::PATH.to_string(), p.clone()));
            }
        }
        env.extend(
            config
                .env
                .iter()
                .map(|(k, v)| EnvEdit::Set(k.clone(), OsString::from(v))),
        );
        env
    }

    /// Run the full sequence. In `Replace` mode this only returns on failure;
    /// in `Spawn` mode it returns the target's exit code.
    pub fn launch<I, S>(&self, config: &LaunchConfig, caller_args: I, mode: LaunchMode) -> Result<i32>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.plan(config, caller_args)?.execute(mode)
    }
}

/// A spawn failure caused by the directory vanishing (or losing its
/// permissions) after planning is a step 1 failure, not an exec one.
fn launch_error(plan: &LaunchPlan, err: std::io::Error) -> LaunchError {
    match check_project_dir(&plan.working_dir) {
        Err(dir_err) => dir_err,
        Ok(_) => map_exec_error(&plan.executable, err),
    }
}

fn spawn_and_wait(cmd: &mut Command, plan: &LaunchPlan) -> Result<i32> {
    let status = cmd.status().map_err(|e| launch_error(plan, e))?;
    let code = exit_code_of(status);
    tracing::debug!(code, "Target exited");
    Ok(code)
}

#[cfg(unix)]
fn replace_process(cmd: &mut Command, plan: &LaunchPlan) -> Result<i32> {
    use std::os::unix::process::CommandExt;
    std::env::set_current_dir(&plan.working_dir).map_err(|e| {
        tracing::debug!(dir = %plan.working_dir.display(), err = %e, "chdir failed");
        LaunchError::DirectoryNotFound(plan.working_dir.clone())
    })?;
    let err = cmd.exec();
    Err(launch_error(plan, err))
}

#[cfg(not(unix))]
fn replace_process(cmd: &mut Command, plan: &LaunchPlan) -> Result<i32> {
    spawn_and_wait(cmd, plan)
}
