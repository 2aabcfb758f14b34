//! # Cart Sync
//!
//! Client-side shopping cart for a pharmacy storefront. The cart lives in memory,
//! changes are applied optimistically, and a REST cart service is kept in step.
//!
//! ## Design
//!
//! ### 1. One actor owns the cart
//! The [`CartSynchronizer`](cart_actor::CartSynchronizer) runs in its own Tokio task and
//! processes requests one at a time, each to completion. Two operations on the same line
//! cannot interleave, and the internal state needs no locks.
//!
//! ### 2. Optimistic mutations with rollback
//! Add, change quantity, remove and clear publish the new cart before the network call.
//! If the call fails, the lines captured beforehand are restored and the user gets an
//! error notice. See [`framework::Transaction`].
//!
//! ### 3. Observable state
//! The cart is published on a `tokio::sync::watch` channel. [`CartClient`](clients::CartClient)
//! reads subtotal, item count and the loading/submitting flags from it at any time,
//! including while a request is in flight.
//!
//! ### 4. Injected collaborators
//! The remote services, credential store, cache and notifier are traits in [`services`],
//! handed to the actor through [`CartContext`](cart_actor::CartContext) when it starts.
//! Tests swap any of them for the mocks in [`services::mock`].
//!
//! ## Module Tour
//!
//! - [`framework`]: generic actor loop, mailbox, optimistic transactions
//! - [`model`]: cart lines, cart state, order payloads, wire mapping
//! - [`services`]: collaborator contracts, HTTP client, caches, notifiers
//! - [`cart_actor`]: the synchronizer and its requests and errors
//! - [`clients`]: typed client over the actor's mailbox
//! - [`lifecycle`]: [`CartSystem`](lifecycle::CartSystem) and tracing setup
//! - [`config`]: environment configuration
//!
//! ## Quick Start
//!
//! ```bash
//! CART_API_BASE_URL=http://localhost:5000/api RUST_LOG=info cargo run
//! ```

pub mod cart_actor;
pub mod clients;
pub mod config;
pub mod framework;
pub mod lifecycle;
pub mod model;
pub mod services;
