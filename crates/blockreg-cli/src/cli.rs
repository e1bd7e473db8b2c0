use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "blockreg",
    about = "Apartment block registry on a key-value ledger",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Ledger log file (overrides the config file)
    #[arg(long, global = true)]
    pub ledger: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run one registry operation against the ledger
    Invoke(InvokeArgs),
    /// List available operations and their arguments
    Operations(OperationsArgs),
}

#[derive(Args)]
pub struct InvokeArgs {
    /// Operation name, e.g. newBlock or queryRenter
    pub operation: String,
    /// Positional arguments for the operation
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

#[derive(Args)]
pub struct OperationsArgs {}
