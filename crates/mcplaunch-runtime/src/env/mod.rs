//! Runtime environment activation: conda / venv.
//!
//! Activation never sources a shell hook. It validates the environment on
//! disk and returns the variable edits the hook would have made, which the
//! launcher applies to the target process only.

pub mod activation;

pub use activation::{
    conda_root_candidates, is_conda_install, resolve_conda_root, ActivatedEnvironment, EnvEdit,
};
