//! coffee-build-rs: CoffeeScript package compiler.

mod cli;
mod config;
mod orchestrator;
mod output;

use clap::Parser;
use cli::Args;
use miette::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let result = orchestrator::run(args).await;

    match result {
        Ok(summary) => {
            if summary.failed > 0 {
                std::process::exit(1);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
