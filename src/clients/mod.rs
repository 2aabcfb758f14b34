//! Type-safe wrappers around [`Mailbox`](crate::framework::Mailbox).

pub mod cart_client;

pub use cart_client::*;
