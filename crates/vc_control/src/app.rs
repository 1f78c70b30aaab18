//! Startup, serving and shutdown.

use crate::{Args, BotConfig};
use std::sync::Arc;
use tracing::{error, info, warn};
use vc_control_database::{GuildConfigCache, open_store};
use vc_control_discord::{VcControlBot, VcControlHandler};
use vc_control_error::VcControlResult;
use vc_control_workflow::WorkflowService;

/// Open the store, warm the settings cache and serve Discord events until
/// the gateway stops or the process receives Ctrl+C.
///
/// # Errors
///
/// Fails when the token is missing, the store cannot be opened, or the
/// Discord client fails to build or connect.
pub async fn run(args: &Args, config: &BotConfig) -> VcControlResult<()> {
    let token = args.token()?;
    info!(test_mode = args.test_mode, "Starting VC Control");

    let store_settings = config.store_settings(args.store_url());
    if store_settings.is_none() {
        warn!("DATABASE_URL not set - guild settings are kept in memory only");
    }
    let store = open_store(store_settings.as_ref())?;
    store.ensure_schema().await;

    let cache = Arc::new(GuildConfigCache::new(store));
    match cache.warm().await {
        Ok(guilds) => info!(guilds, "Loaded guild settings"),
        Err(e) => warn!(error = %e, "Failed to load guild settings; starting empty"),
    }

    let service = WorkflowService::new(cache);
    let sweeper = service
        .registry()
        .clone()
        .spawn_sweeper(config.discord().sweep_interval());

    let handler = VcControlHandler::new(service, args.command_guild(config));
    let mut bot = VcControlBot::new(token, handler).await?;

    let shards = bot.shard_manager();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown requested");
                shards.shutdown_all().await;
            }
            Err(e) => error!(error = %e, "Could not listen for Ctrl+C"),
        }
    });

    let served = bot.start().await;
    sweeper.abort();

    served?;
    info!("VC Control stopped");
    Ok(())
}
