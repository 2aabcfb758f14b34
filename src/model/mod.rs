//! Pure data structures: cart lines, observable cart state, and order payloads.

pub mod cart;
pub mod order;
pub mod user;
pub mod wire;

pub use cart::*;
pub use order::*;
pub use user::*;
