fn main() {
    if let Err(e) = plugscan_cli::run() {
        eprintln!("plugscan: {e}");
        std::process::exit(1);
    }
}
