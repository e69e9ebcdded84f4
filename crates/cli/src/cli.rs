use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "reckon")]
#[command(about = "Parse receipts and analyze where the money went", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse a receipt into its canonical JSON form
    Parse {
        /// Receipt text or JSON record; `-` reads stdin
        input: PathBuf,

        #[arg(short, long, value_enum, default_value_t = InputFormat::Auto)]
        format: InputFormat,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Parse, categorize and analyze a receipt
    Analyze {
        /// Receipt text or JSON record; `-` reads stdin
        input: PathBuf,

        #[arg(short, long, value_enum, default_value_t = InputFormat::Auto)]
        format: InputFormat,

        /// JSON object mapping item names to categories
        #[arg(long, conflicts_with = "rules")]
        categories: Option<PathBuf>,

        /// TOML file of categorization rules
        #[arg(long)]
        rules: Option<PathBuf>,

        /// Analysis config (defaults to the user config file, if present)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Inspect the analysis configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML
    Show {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Print where the default config file lives
    Path,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InputFormat {
    /// JSON objects are structured records, anything else is text
    Auto,
    Structured,
    Text,
}
