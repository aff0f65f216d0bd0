//! Launches the file reader MCP server (`file_reader.py`) in its conda environment.
//! Every argument is forwarded to the server unchanged.

fn main() {
    std::process::exit(mcplaunch::run_profile("file-reader"));
}
