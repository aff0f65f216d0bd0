//! mcplaunch 统一配置层
//!
//! Every launcher setting read from the environment goes through this module;
//! callers use the structured configs instead of `std::env::var`.
//!
//! - `loader`: env_or, env_optional, env_bool helpers
//! - `schema`: ObservabilityConfig, RuntimeConfig
//! - `env_keys`: key constants (with aliases)
//! - `profiles`: launch profiles (built-in + YAML file)

pub mod env_keys;
pub mod loader;
pub mod profiles;
pub mod schema;

pub use loader::{env_bool, env_optional, env_or};
pub use profiles::{EnvironmentSpec, LaunchConfig, ProfileRegistry, ProfileSource};
pub use schema::{ObservabilityConfig, RuntimeConfig};
