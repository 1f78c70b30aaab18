//! Discord client setup and lifecycle.

use crate::handler::VcControlHandler;
use serenity::Client;
use serenity::gateway::ShardManager;
use std::sync::Arc;
use tracing::{info, instrument};
use vc_control_error::{PlatformError, PlatformErrorKind};
use vc_control_workflow::PlatformResult;

/// The running bot: a serenity client wired to a [`VcControlHandler`].
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use vc_control_database::{DisabledGuildConfigStore, GuildConfigCache};
/// use vc_control_discord::{VcControlBot, VcControlHandler};
/// use vc_control_workflow::WorkflowService;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let token = std::env::var("DISCORD_TOKEN")?;
///     let cache = Arc::new(GuildConfigCache::new(Arc::new(DisabledGuildConfigStore::new())));
///     let handler = VcControlHandler::new(WorkflowService::new(cache), None);
///
///     let mut bot = VcControlBot::new(&token, handler).await?;
///     bot.start().await?;
///     Ok(())
/// }
/// ```
pub struct VcControlBot {
    client: Client,
}

impl VcControlBot {
    /// Build the client.
    ///
    /// # Errors
    ///
    /// Fails when serenity rejects the token or cannot build the client.
    #[instrument(skip(token, handler), fields(token_len = token.len()))]
    pub async fn new(token: &str, handler: VcControlHandler) -> PlatformResult<Self> {
        let intents = VcControlHandler::intents();
        info!(?intents, "Building Discord client");
        let client = Client::builder(token, intents)
            .event_handler(handler)
            .await
            .map_err(|e| {
                PlatformError::new(PlatformErrorKind::Gateway(format!(
                    "Failed to build client: {}",
                    e
                )))
            })?;
        Ok(Self { client })
    }

    /// Handle for shutting the shards down from another task.
    pub fn shard_manager(&self) -> Arc<ShardManager> {
        self.client.shard_manager.clone()
    }

    /// Connect and serve events until the shards stop.
    ///
    /// # Errors
    ///
    /// Fails when the gateway connection cannot be established or ends with
    /// an error.
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> PlatformResult<()> {
        info!("Starting Discord bot");
        self.client.start().await.map_err(|e| {
            PlatformError::new(PlatformErrorKind::Gateway(format!("Client error: {}", e)))
        })
    }
}
