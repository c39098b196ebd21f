use dmode::cli::Cli;
use dmode::process::EXIT_FATAL;

fn main() {
    if let Err(e) = Cli::run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(EXIT_FATAL);
    }
}
