//! # Mailbox
//!
//! The client half of an [`Actor`](crate::framework::Actor): a cloneable sender with a
//! request/response helper built on oneshot channels.

use crate::framework::error::FrameworkError;
use tokio::sync::{mpsc, oneshot};

/// Type alias for the one-shot response channel carried inside requests.
pub type Response<T> = oneshot::Sender<T>;

/// A type-safe handle for sending requests of type `R` to an actor.
///
/// * **Cloneable** - holds only a sender, so cloning is inexpensive.
/// * **Async API** - [`Mailbox::call`] resolves once the actor replies.
#[derive(Debug)]
pub struct Mailbox<R> {
    sender: mpsc::Sender<R>,
}

impl<R> Clone for Mailbox<R> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<R> Mailbox<R> {
    pub fn new(sender: mpsc::Sender<R>) -> Self {
        Self { sender }
    }

    /// Sends a request built by `make` and waits for the actor to answer on the
    /// oneshot channel handed to `make`.
    pub async fn call<T>(
        &self,
        make: impl FnOnce(Response<T>) -> R,
    ) -> Result<T, FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(make(respond_to))
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)
    }

    /// Enqueues a request without waiting for any reply.
    pub async fn send(&self, request: R) -> Result<(), FrameworkError> {
        self.sender
            .send(request)
            .await
            .map_err(|_| FrameworkError::ActorClosed)
    }

    /// Returns `true` once the actor has stopped receiving.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}
