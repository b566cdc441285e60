fn main() {
    if let Err(e) = arbor_cli::run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
