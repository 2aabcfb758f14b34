//! Cart synchronizer actor and its factory.

pub mod error;
pub mod message;
pub mod synchronizer;

pub use error::*;
pub use message::*;
pub use synchronizer::*;

use crate::clients::CartClient;
use crate::framework::Actor;

/// Creates a new cart actor and its client.
///
/// The actor does nothing until `actor.run(context)` is spawned.
pub fn new(buffer_size: usize) -> (Actor<CartSynchronizer>, CartClient) {
    let synchronizer = CartSynchronizer::new();
    let view = synchronizer.subscribe();
    let (actor, mailbox) = Actor::new(buffer_size, synchronizer);
    (actor, CartClient::new(mailbox, view))
}
