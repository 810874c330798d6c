use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::Parser;
use pilot::{translate, Frame};
use seer::{SeerConfig, VisionClient};
use tracing::level_filters::LevelFilter;

/// Shows a single screenshot to the vision model and prints what it would do.
#[derive(Debug, Parser)]
#[command(name = "seer")]
struct Args {
    /// The model settings, as TOML
    config: PathBuf,
    /// A PNG screenshot of the game
    screenshot: PathBuf,
    /// The recent history to send along with the screenshot
    #[arg(long, default_value = "")]
    history: String,
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let Args {
        config,
        screenshot,
        history,
        log_level,
    } = Args::parse();
    let level = LevelFilter::from_str(&log_level)
        .with_context(|| format!("unknown log level {log_level:?}"))?;
    pilot::logging::init(level)?;

    let config = SeerConfig::load(&config)?;
    let data = std::fs::read(&screenshot)
        .with_context(|| format!("could not read {}", screenshot.display()))?;
    let frame = Frame::from_png(&data)
        .with_context(|| format!("{} is not a usable PNG", screenshot.display()))?;

    let client = VisionClient::new(config)?;
    let reply = client.ask(&frame, &history).await?;
    println!("reply:  {reply}");
    println!("action: {}", translate(&reply));
    Ok(())
}
