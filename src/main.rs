fn main() {
    if let Err(e) = digester_ph::adapters::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
