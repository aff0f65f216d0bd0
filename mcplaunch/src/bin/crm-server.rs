//! Launches the CRM MCP server (`crm_server.py`) in its conda environment.
//! Every argument is forwarded to the server unchanged.

fn main() {
    std::process::exit(mcplaunch::run_profile("crm-server"));
}
