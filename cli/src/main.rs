//! certrenewer - renew certificates on a remote host and back them up locally

#![cfg_attr(test, allow(clippy::expect_used))]

use clap::Parser;

use certrenewer::cli::Cli;
use certrenewer::domain::exit_code_for;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = cli.run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(exit_code_for(&e));
    }
}
