//! # Mock Mailboxes
//!
//! Test a client wrapper without spawning the actor behind it.
//!
//! [`create_mock_mailbox`] hands back a [`Mailbox`] and the receiver that would
//! normally belong to the actor. The test pulls requests off the receiver, asserts on
//! them, and answers through the `respond_to` sender they carry. Success, failure and
//! delays are all under the test's control.
//!
//! ```rust
//! use cart_sync::framework::mock::{create_mock_mailbox, expect_request};
//! use cart_sync::framework::Response;
//!
//! #[derive(Debug)]
//! enum Ping { Ping(Response<&'static str>) }
//!
//! #[tokio::main]
//! async fn main() {
//!     let (mailbox, mut receiver) = create_mock_mailbox::<Ping>(4);
//!     let task = tokio::spawn(async move { mailbox.call(Ping::Ping).await });
//!
//!     let Ping::Ping(respond_to) = expect_request(&mut receiver).await.unwrap();
//!     respond_to.send("pong").unwrap();
//!
//!     assert_eq!(task.await.unwrap().unwrap(), "pong");
//! }
//! ```

use crate::framework::mailbox::Mailbox;
use std::time::Duration;
use tokio::sync::mpsc;

/// Creates a mailbox and the receiver its requests arrive on.
pub fn create_mock_mailbox<R>(buffer_size: usize) -> (Mailbox<R>, mpsc::Receiver<R>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (Mailbox::new(sender), receiver)
}

/// Waits for the next request, or `None` if nothing arrives within a second.
pub async fn expect_request<R>(receiver: &mut mpsc::Receiver<R>) -> Option<R> {
    tokio::time::timeout(Duration::from_secs(1), receiver.recv())
        .await
        .ok()
        .flatten()
}
