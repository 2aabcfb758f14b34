//! Demo: sign in from the environment, fetch the cart, print a summary.

use cart_sync::config::SyncConfig;
use cart_sync::lifecycle::{setup_tracing, CartSystem};
use cart_sync::model::UserIdentity;
use cart_sync::services::MemoryCredentialStore;
use secrecy::ExposeSecret;
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    let config = SyncConfig::from_env().map_err(|e| e.to_string())?;
    info!(?config, "Starting cart sync");

    let credentials = Arc::new(MemoryCredentialStore::new());
    match (&config.api_token, &config.user_id) {
        (Some(token), Some(user_id)) => {
            credentials.sign_in(token.expose_secret(), UserIdentity::new(user_id.as_str()));
        }
        _ => warn!("CART_API_TOKEN or CART_USER_ID not set, running signed out"),
    }

    let system = CartSystem::from_config(&config, credentials);

    let outcome = system
        .cart_client
        .refresh()
        .await
        .map_err(|e| e.to_string())?;
    info!(?outcome, "Refresh finished");

    let state = system.cart_client.state();
    for line in &state.lines {
        info!(
            line_id = %line.id,
            product_id = %line.product_id,
            name = %line.name,
            quantity = line.quantity,
            total = %line.total(),
            "Cart line"
        );
    }
    info!(
        items = state.item_count(),
        subtotal = %state.subtotal(),
        "Cart summary"
    );

    system.shutdown().await
}
