//! Observability: tracing init.
//!
//! Uses config::ObservabilityConfig for MCPLAUNCH_QUIET, LOG_LEVEL, LOG_JSON.
//! Output always goes to stderr: stdout is owned by the launched server
//! (MCP stdio transport).

use tracing_subscriber::{prelude::*, EnvFilter};

use crate::config::ObservabilityConfig;

/// Compute the filter directive from config. Quiet wins over the level.
pub fn filter_directive(cfg: &ObservabilityConfig) -> String {
    if cfg.quiet {
        "error".to_string()
    } else {
        cfg.log_level.clone()
    }
}

/// Initialize tracing. Call at process startup; repeated calls are no-ops.
/// `RUST_LOG` overrides MCPLAUNCH_LOG_LEVEL when set.
pub fn init_tracing() {
    let cfg = ObservabilityConfig::from_env();
    let level = filter_directive(cfg);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));

    let _ = if cfg.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(false),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(false),
            )
            .try_init()
    };
}
