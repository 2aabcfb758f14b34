//! # Framework Errors
//!
//! Errors raised by the actor plumbing itself, independent of what the actor
//! manages.

/// Errors that can occur while talking to an actor through its mailbox.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum FrameworkError {
    #[error("Actor closed")]
    ActorClosed,
    #[error("Actor dropped response channel")]
    ActorDropped,
}
