//! Spearlog - match the coming days' conditions against your dive log
//!
//! Reads a spearfishing history, fetches or loads a forecast and prints
//! which past dives the conditions resemble.

use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, error};
use tracing_subscriber::FmtSubscriber;

use spearlog::app::App;
use spearlog::cli::Cli;
use spearlog::config::AppConfig;

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level())
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = match AppConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(ExitCode::FAILURE);
        }
    };
    debug!(?config, "Configuration ready");

    let app = App::new(config);
    match app.run(&cli.command).await {
        Ok(output) => {
            print!("{}", output);
            if !output.ends_with('\n') {
                println!();
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            error!(error = ?e, "Command failed");
            eprintln!("Error: {}", e);
            Ok(ExitCode::FAILURE)
        }
    }
}
