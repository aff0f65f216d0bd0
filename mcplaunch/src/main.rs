fn main() {
    std::process::exit(mcplaunch::run_cli());
}
