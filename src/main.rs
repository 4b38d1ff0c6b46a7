use clap::Parser;
use colored::Colorize;

use docchat::{cli::Cli, runtime::Orchestrator};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match Orchestrator::new(cli) {
        Ok(orchestrator) => orchestrator.run().await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
