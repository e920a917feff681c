use clap::Parser;

use oci_fleet::cli::{self, Args};

fn main() {
    env_logger::init();
    let args = Args::parse();

    if let Err(err) = cli::run(args) {
        log::error!("{err}");
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
