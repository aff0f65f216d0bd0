//! Launcher error type.
//!
//! Each variant corresponds to one launch step and carries its own exit code,
//! so a launcher-level failure can be told apart from the target's own status.

use std::path::PathBuf;

use thiserror::Error;

/// Exit code for a missing project directory (`EX_NOINPUT`).
pub const EXIT_DIRECTORY_NOT_FOUND: i32 = 66;
/// Exit code for a failed environment activation (`EX_UNAVAILABLE`).
pub const EXIT_ENVIRONMENT_ACTIVATION: i32 = 69;
/// Exit code for spawn / exec I/O failures (`EX_OSERR`).
pub const EXIT_IO: i32 = 71;
/// Exit code for invalid configuration or unknown profiles (`EX_CONFIG`).
pub const EXIT_CONFIG: i32 = 78;
/// Exit code for a target that exists but cannot be executed (shell convention).
pub const EXIT_NOT_EXECUTABLE: i32 = 126;
/// Exit code for a target that cannot be found (shell convention).
pub const EXIT_NOT_FOUND: i32 = 127;

/// Why the target executable could not be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutableProblem {
    Missing,
    NotExecutable,
}

impl std::fmt::Display for ExecutableProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing => f.write_str("not found"),
            Self::NotExecutable => f.write_str("not executable"),
        }
    }
}

/// Errors returned by the launch sequence. All are fatal and none are retried.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("project directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("cannot activate environment '{env}': {reason}")]
    EnvironmentActivation { env: String, reason: String },

    #[error("target executable '{program}' {problem}{}", searched_suffix(.searched))]
    ExecutableNotFound {
        program: String,
        problem: ExecutableProblem,
        searched: Option<String>,
    },

    #[error("{0}")]
    Config(String),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

fn searched_suffix(searched: &Option<String>) -> String {
    match searched {
        Some(s) if !s.is_empty() => format!(" (searched: {})", s),
        _ => String::new(),
    }
}

impl LaunchError {
    /// Short name of the step that failed, used as the diagnostic prefix.
    pub fn step(&self) -> &'static str {
        match self {
            Self::DirectoryNotFound(_) => "chdir",
            Self::EnvironmentActivation { .. } => "activate",
            Self::ExecutableNotFound { .. } | Self::Io { .. } => "exec",
            Self::Config(_) => "config",
        }
    }

    /// Process exit code reported when this error terminates the launcher.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::DirectoryNotFound(_) => EXIT_DIRECTORY_NOT_FOUND,
            Self::EnvironmentActivation { .. } => EXIT_ENVIRONMENT_ACTIVATION,
            Self::ExecutableNotFound { problem, .. } => match problem {
                ExecutableProblem::Missing => EXIT_NOT_FOUND,
                ExecutableProblem::NotExecutable => EXIT_NOT_EXECUTABLE,
            },
            Self::Config(_) => EXIT_CONFIG,
            Self::Io { .. } => EXIT_IO,
        }
    }

    pub fn activation(env: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EnvironmentActivation {
            env: env.into(),
            reason: reason.into(),
        }
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, LaunchError>;
