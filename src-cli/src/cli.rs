use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "paperlens")]
#[command(about = "Analyze spreadsheet rows with a hosted or Ollama-served LLM")]
#[command(version)]
pub struct Cli {
    /// Raise log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Process every row of the input table and write the results.
    Run(RunArgs),
    /// Print the header columns of a table.
    Columns {
        /// CSV, TSV or spreadsheet file.
        table: PathBuf,
    },
    /// Check that the configured backend answers.
    Probe(ConfigArgs),
    /// List the models the configured backend offers.
    Models(ModelsArgs),
    /// Print the JSON skeleton that asks the model for the given columns.
    Scaffold {
        /// Comma-separated output columns.
        #[arg(long)]
        columns: String,
    },
}

#[derive(Debug, Clone, Args)]
pub struct ConfigArgs {
    /// Config file (JSON or YAML). Defaults to <config dir>/paperlens/config.json.
    #[arg(short, long, env = "PAPERLENS_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Override table.input_file.
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Override table.output_file.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Override table.max_workers.
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Override table.api_delay (seconds).
    #[arg(short, long)]
    pub delay: Option<f64>,
}

#[derive(Debug, Args)]
pub struct ModelsArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Ask the local `ollama` binary instead of the server API.
    #[arg(long)]
    pub local: bool,
}
