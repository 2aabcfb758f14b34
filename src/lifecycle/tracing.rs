//! # Observability & Tracing
//!
//! [`setup_tracing`] installs a compact `tracing-subscriber` formatter filtered by
//! `RUST_LOG`. Module paths are hidden (`with_target(false)`); the actor loop logs
//! an `actor_type` field instead.
//!
//! ## What Gets Traced
//!
//! - **Actor Lifecycle**: `Actor started`, `Shutdown`
//! - **Requests**: every request the synchronizer receives, at `debug`
//! - **Sync Results**: refreshes, confirmed adds, rollbacks and order creation
//! - **Errors**: failed service calls with the error text, cache write failures
//!
//! ## Usage Examples
//!
//! ```bash
//! # Compact logs
//! RUST_LOG=info cargo run
//!
//! # Full request payloads and rollbacks
//! RUST_LOG=debug cargo run
//!
//! # Only the synchronizer
//! RUST_LOG=cart_sync::cart_actor=debug cargo run
//! ```
//!
//! With `RUST_LOG=info` a session looks like:
//!
//! ```text
//! INFO Actor started actor_type="CartSynchronizer"
//! INFO refresh: Cart refreshed lines=2
//! INFO submit_order: Order created, clearing cart order_id="665f..." items=2
//! INFO submit_order:refresh: Cart refreshed lines=0
//! INFO Shutdown actor_type="CartSynchronizer"
//! ```

/// Installs the global subscriber. Call once, at startup.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
