mod cli;
mod commands;
mod events;
mod logging;

use std::process::ExitCode;

use clap::Parser;
use log::debug;

use cli::{Cli, Command};
use commands::Outcome;

/// 128 + SIGINT.
const INTERRUPTED_EXIT_CODE: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    debug!("paperlens v{}", env!("CARGO_PKG_VERSION"));

    let result = match cli.command {
        Command::Run(args) => commands::run(args).await,
        Command::Columns { table } => commands::columns(&table),
        Command::Probe(args) => commands::probe(args).await,
        Command::Models(args) => commands::models(args).await,
        Command::Scaffold { columns } => commands::scaffold(&columns),
    };

    match result {
        Ok(Outcome::Done) => ExitCode::SUCCESS,
        Ok(Outcome::Interrupted) => ExitCode::from(INTERRUPTED_EXIT_CODE),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
