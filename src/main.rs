fn main() {
    if let Err(err) = csv2xlsx::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
