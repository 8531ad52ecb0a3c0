//! columnify CLI
//!
//! Converts row-oriented record files into one Parquet file

mod cli;
mod logger;

use clap::Parser;
use cli::Cli;

fn main() {
    let cli = Cli::parse();
    logger::init(cli.log_level);

    if let Err(e) = cli.run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
