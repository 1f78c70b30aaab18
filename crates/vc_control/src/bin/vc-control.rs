//! VC Control bot entry point.

use clap::Parser;
use tracing::{error, info};
use vc_control::{Args, BotConfig, init_tracing, run};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env must load before clap reads env-backed arguments
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => BotConfig::from_file(path)?,
        None => BotConfig::default(),
    };
    init_tracing(config.logging(), args.json_logs)?;
    if let Some(path) = &args.config {
        info!(config_file = %path.display(), "Configuration loaded");
    }

    if let Err(e) = run(&args, &config).await {
        error!(error = %e, "VC Control exited with an error");
        return Err(e.into());
    }
    Ok(())
}
