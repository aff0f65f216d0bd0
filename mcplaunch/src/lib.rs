//! mcplaunch CLI library — shared by the `mcplaunch` binary and the dedicated
//! `crm-server` / `file-reader` launchers.

mod cli;
mod commands;

use std::ffi::{OsStr, OsString};
use std::path::Path;

use clap::Parser;
use cli::{Cli, Commands};
use mcplaunch_core::config::{ProfileRegistry, RuntimeConfig};
use mcplaunch_core::error::LaunchError;
use mcplaunch_core::observability;

const PROGRAM: &str = "mcplaunch";

/// Print the diagnostic for a failed run and pick the exit code.
///
/// Launcher errors report the failing step and their own code; anything else
/// exits with 1.
fn report(err: &anyhow::Error) -> i32 {
    if let Some(le) = err.downcast_ref::<LaunchError>() {
        tracing::debug!(step = le.step(), code = le.exit_code(), "Launch failed");
        eprintln!("{}: {}: {}", PROGRAM, le.step(), le);
        le.exit_code()
    } else {
        eprintln!("{}: {:#}", PROGRAM, err);
        1
    }
}

fn finish(result: anyhow::Result<i32>) -> i32 {
    result.unwrap_or_else(|e| report(&e))
}

/// Entry point for a dedicated launcher: every argument after argv[0] goes to
/// the target. No flag is interpreted here.
pub fn run_profile(profile: &str) -> i32 {
    observability::init_tracing();
    let args: Vec<OsString> = std::env::args_os().skip(1).collect();
    finish(commands::run::launch_profile(profile, args))
}

/// Profile name implied by argv[0] when invoked through a link named after a profile.
fn invoked_as(argv0: &OsStr) -> Option<String> {
    let stem = Path::new(argv0).file_stem()?.to_str()?;
    if stem == PROGRAM {
        None
    } else {
        Some(stem.to_string())
    }
}

/// Run the CLI — dispatches on argv[0] first, then parses subcommands.
pub fn run_cli() -> i32 {
    observability::init_tracing();

    let mut argv = std::env::args_os();
    if let Some(name) = argv.next().as_deref().and_then(invoked_as) {
        let runtime = RuntimeConfig::from_env();
        match ProfileRegistry::discover(&runtime) {
            Ok(registry) if registry.contains(&name) => {
                tracing::debug!(profile = %name, "Multi-call dispatch");
                return finish(commands::run::launch_profile(&name, argv.collect()));
            }
            Ok(_) => {}
            Err(e) => return report(&anyhow::Error::from(e)),
        }
    }

    let cli = Cli::parse();
    finish(match cli.command {
        Commands::Run { profile, args } => commands::run::launch_profile(&profile, args),
        Commands::Check {
            profile,
            json,
            args,
        } => commands::check::cmd_check(&profile, args, json),
        Commands::List { json } => commands::list::cmd_list(json).map(|()| 0),
    })
}
