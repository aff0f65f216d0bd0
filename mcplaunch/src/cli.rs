use std::ffi::OsString;

use clap::{Parser, Subcommand};

/// mcplaunch - start MCP servers inside their conda / venv environments
#[derive(Parser, Debug)]
#[command(name = "mcplaunch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch a profile, replacing this process with its target
    Run {
        /// Profile name (see `mcplaunch list`)
        #[arg(value_name = "PROFILE")]
        profile: String,

        /// Arguments forwarded to the target verbatim. Put them after `--`
        /// when the first one starts with a hyphen.
        #[arg(value_name = "ARGS", trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<OsString>,
    },

    /// Resolve a profile (directory, environment, executable) without running it
    Check {
        /// Profile name
        #[arg(value_name = "PROFILE")]
        profile: String,

        /// Print the resolved plan as JSON
        #[arg(long)]
        json: bool,

        /// Arguments the target would receive
        #[arg(value_name = "ARGS", trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<OsString>,
    },

    /// List known profiles and where they are defined
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_flags_default_off() {
        let cli = Cli::try_parse_from(["mcplaunch", "list"]).unwrap();
        assert!(matches!(cli.command, Commands::List { json: false }));

        let cli = Cli::try_parse_from(["mcplaunch", "check", "crm-server", "--json"]).unwrap();
        assert!(matches!(cli.command, Commands::Check { json: true, .. }));
    }
}
