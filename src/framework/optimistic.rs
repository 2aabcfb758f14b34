//! # Optimistic Transactions
//!
//! Capture a snapshot, mutate published state right away, run the remote effect,
//! and put the snapshot back if the effect fails.
//!
//! State lives in a [`watch::Sender`], so observers see the optimistic value while
//! the effect is still in flight.
//!
//! ```rust
//! use cart_sync::framework::{Snapshot, Transaction};
//! use tokio::sync::watch;
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct Tally(Vec<u32>);
//!
//! impl Snapshot for Tally {
//!     type Saved = Vec<u32>;
//!     fn save(&self) -> Vec<u32> { self.0.clone() }
//!     fn restore(&mut self, saved: Vec<u32>) { self.0 = saved; }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let (state, view) = watch::channel(Tally(vec![1]));
//!
//!     let tx = Transaction::begin(&state, |t| t.0.push(2));
//!     assert_eq!(view.borrow().0, vec![1, 2]);
//!
//!     let result: Result<(), &str> = tx.run(async { Err("offline") }).await;
//!     assert!(result.is_err());
//!     assert_eq!(view.borrow().0, vec![1]);
//! }
//! ```

use std::future::Future;
use tokio::sync::watch;

/// State that can save and restore the part an optimistic change may touch.
///
/// `Saved` is usually a subset of the state: flags that are managed outside the
/// transaction (such as a loading indicator) are left alone on rollback.
pub trait Snapshot {
    type Saved: Send;

    fn save(&self) -> Self::Saved;

    fn restore(&mut self, saved: Self::Saved);
}

/// An optimistic change that has been applied and not yet settled.
///
/// Dropping the transaction without calling [`Transaction::rollback`] keeps the
/// optimistic state, which is the same as committing it.
#[must_use = "an optimistic change should be committed or rolled back"]
pub struct Transaction<'a, S: Snapshot> {
    state: &'a watch::Sender<S>,
    saved: S::Saved,
}

impl<'a, S: Snapshot> Transaction<'a, S> {
    /// Saves the current state, then applies `mutate` and notifies observers.
    pub fn begin(state: &'a watch::Sender<S>, mutate: impl FnOnce(&mut S)) -> Self {
        let saved = state.borrow().save();
        state.send_modify(mutate);
        Self { state, saved }
    }

    /// Keeps the optimistic state.
    pub fn commit(self) {}

    /// Puts the saved snapshot back.
    pub fn rollback(self) {
        let saved = self.saved;
        self.state.send_modify(|state| state.restore(saved));
    }

    /// Awaits `effect`, rolling back when it fails.
    pub async fn run<T, E>(self, effect: impl Future<Output = Result<T, E>>) -> Result<T, E> {
        match effect.await {
            Ok(value) => {
                self.commit();
                Ok(value)
            }
            Err(e) => {
                self.rollback();
                Err(e)
            }
        }
    }
}
