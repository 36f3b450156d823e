mod app;
mod cli;
mod config;
mod replay;

pub use app::App;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use config::AppConfig;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;

    // Logs go to stderr; stdout carries stimuli or the event stream.
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level(cli.verbose)?)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Command::Session { out } => {
            let app = App::new(&config, out)?;
            let summary = app.run().await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::Replay {
            transcript,
            log,
            delay_ms,
        } => {
            replay::run(&config, &transcript, log, delay_ms).await?;
        }
    }

    Ok(())
}
