//! Reckon CLI - receipt parsing and spending analysis
//!
//! Usage:
//!   reckon parse receipt.txt                     Canonical receipt JSON
//!   reckon analyze receipt.json --rules r.toml   Categorize and analyze
//!   reckon config show                           Effective configuration

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over -v. Logs go to stderr so stdout stays pure JSON.
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(match cli.verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        })
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Parse { input, format, pretty } => commands::cmd_parse(&input, format, pretty).await,
        Commands::Analyze {
            input,
            format,
            categories,
            rules,
            config,
            pretty,
        } => {
            commands::cmd_analyze(
                &input,
                format,
                categories.as_deref(),
                rules.as_deref(),
                config.as_deref(),
                pretty,
            )
            .await
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { config } => commands::cmd_config_show(config.as_deref()).await,
            ConfigAction::Path => commands::cmd_config_path(),
        },
    }
}
