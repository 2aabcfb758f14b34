//! Generic actor runtime used by the cart synchronizer.
//!
//! # Main Components
//!
//! - [`Handler`] - Trait that stateful components implement to be driven by an [`Actor`]
//! - [`Actor`] - The event loop that owns a handler and processes its requests sequentially
//! - [`Mailbox`] - Cloneable request/response client for an actor
//! - [`Transaction`] - Optimistic "apply now, roll back on failure" helper over a `watch` channel
//! - [`FrameworkError`] - Mailbox failures
//!
//! # Testing
//!
//! See [`mock`] for utilities to test mailbox clients without spawning an actor.

pub mod actor;
pub mod error;
pub mod mailbox;
pub mod mock;
pub mod optimistic;

pub use actor::{Actor, Handler};
pub use error::FrameworkError;
pub use mailbox::{Mailbox, Response};
pub use optimistic::{Snapshot, Transaction};
