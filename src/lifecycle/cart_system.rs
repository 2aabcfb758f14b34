use crate::cart_actor::{self, CartContext};
use crate::clients::CartClient;
use crate::config::SyncConfig;
use crate::services::{
    ApiClient, CartCache, CredentialStore, FileCartCache, MemoryCartCache, TracingNotifier,
};
use std::sync::Arc;
use tracing::{error, info};

/// Runs the cart actor and hands out its client.
///
/// # Example
///
/// ```ignore
/// let system = CartSystem::start(context, 32);
/// system.cart_client.refresh().await?;
/// system.shutdown().await?;
/// ```
pub struct CartSystem {
    /// Client for interacting with the cart actor
    pub cart_client: CartClient,

    handle: tokio::task::JoinHandle<()>,
}

impl CartSystem {
    /// Spawns the cart actor with `context` injected.
    pub fn start(context: CartContext, buffer_size: usize) -> Self {
        let (actor, cart_client) = cart_actor::new(buffer_size);
        let handle = tokio::spawn(actor.run(context));
        Self {
            cart_client,
            handle,
        }
    }

    /// Wires the HTTP client, the configured cache and a logging notifier.
    ///
    /// Without `cache_path` the snapshot is kept in memory.
    pub fn from_config(config: &SyncConfig, credentials: Arc<dyn CredentialStore>) -> Self {
        let api = Arc::new(ApiClient::new(&config.api_base_url, credentials.clone()));
        let cache: Arc<dyn CartCache> = match &config.cache_path {
            Some(path) => Arc::new(FileCartCache::new(path.clone())),
            None => Arc::new(MemoryCartCache::new()),
        };

        let context = CartContext::new(
            api.clone(),
            api,
            credentials,
            cache,
            Arc::new(TracingNotifier),
        )
        .with_settings(config.settings());

        Self::start(context, config.channel_capacity)
    }

    /// Drops the client, then waits for the actor to drain its mailbox and exit.
    ///
    /// Clones of [`CartSystem::cart_client`] held elsewhere keep the actor alive,
    /// so drop them first.
    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down cart system...");
        drop(self.cart_client);

        if let Err(e) = self.handle.await {
            error!("Actor task failed: {:?}", e);
            return Err(format!("Actor task failed: {:?}", e));
        }

        info!("Cart system shutdown complete.");
        Ok(())
    }
}
