//! # Generic Actor Server
//!
//! This module defines the [`Actor`], the "server" half of the actor model. It owns a
//! [`Handler`] and the receiving end of its mailbox, and feeds requests to the handler
//! one at a time. Because only the actor task ever touches the handler, the handler's
//! state needs no `Mutex` or `RwLock`.

use crate::framework::mailbox::Mailbox;
use async_trait::async_trait;
use std::fmt::Debug;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info};

/// Trait that a stateful component implements to be driven by an [`Actor`].
///
/// # Async & Context
/// Hooks receive a shared `Context` that is injected when the actor starts running
/// (`run(context)`), not when it is constructed. Collaborators can therefore be
/// swapped for mocks in tests without touching the handler.
///
/// # Provided Methods (Hooks)
/// - [`Handler::deadline`] / [`Handler::on_deadline`]: an optional timer the loop
///   waits on alongside the mailbox.
/// - [`Handler::on_shutdown`]: called once after the mailbox closes.
///
/// The defaults do nothing.
#[async_trait]
pub trait Handler: Send + 'static {
    /// The request enum accepted by this handler. Requests usually carry a
    /// [`Response`](crate::framework::Response) sender for the reply.
    type Request: Send + Debug + 'static;

    /// The runtime context (dependencies) injected into the actor.
    type Context: Send + Sync + 'static;

    /// Process a single request to completion.
    async fn handle(&mut self, request: Self::Request, ctx: &Self::Context);

    /// The instant at which [`Handler::on_deadline`] should fire, if any.
    fn deadline(&self) -> Option<Instant> {
        None
    }

    /// Called when the deadline returned by [`Handler::deadline`] passes before the
    /// next request arrives. Implementations must clear or move the deadline.
    async fn on_deadline(&mut self, _ctx: &Self::Context) {}

    /// Called after the mailbox has closed and all queued requests were handled.
    async fn on_shutdown(&mut self, _ctx: &Self::Context) {}
}

/// The generic actor that drives a [`Handler`].
///
/// **Concurrency Model**:
/// Each actor processes its requests *sequentially*, each one to completion, including
/// any `.await` inside the handler. Two requests can never interleave.
///
/// # Usage Pattern
///
/// 1.  **Create**: Call `Actor::new()` to get the `actor` (server) and `mailbox` (interface).
/// 2.  **Wire**: Pass dependencies into `actor.run(context)`.
/// 3.  **Run**: Spawn the run loop in a background task.
pub struct Actor<H: Handler> {
    receiver: mpsc::Receiver<H::Request>,
    handler: H,
}

impl<H: Handler> Actor<H> {
    /// Creates a new `Actor` around `handler` and its associated [`Mailbox`].
    ///
    /// `buffer_size` is the mailbox capacity. When it is full, senders wait.
    pub fn new(buffer_size: usize, handler: H) -> (Self, Mailbox<H::Request>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self { receiver, handler };
        (actor, Mailbox::new(sender))
    }

    /// Runs the actor's event loop until every mailbox handle has been dropped.
    pub async fn run(mut self, context: H::Context) {
        // Keep only the type name (e.g. "CartSynchronizer")
        let actor_type = std::any::type_name::<H>()
            .split("::")
            .last()
            .unwrap_or("Unknown");
        info!(actor_type, "Actor started");

        loop {
            let next = match self.handler.deadline() {
                Some(at) => {
                    tokio::select! {
                        request = self.receiver.recv() => request,
                        () = tokio::time::sleep_until(at) => {
                            debug!(actor_type, "Deadline reached");
                            self.handler.on_deadline(&context).await;
                            continue;
                        }
                    }
                }
                None => self.receiver.recv().await,
            };

            let Some(request) = next else {
                break;
            };
            debug!(actor_type, ?request, "Request");
            self.handler.handle(request, &context).await;
        }

        self.handler.on_shutdown(&context).await;
        info!(actor_type, "Shutdown");
    }
}
