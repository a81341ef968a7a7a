//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

fn main() {
    if let Err(err) = placemill_cli::run() {
        eprintln!("placemill: {err}");
        std::process::exit(1);
    }
}
