fn main() {
    if let Err(err) = gridlens::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
