//! The sort state machine: directions, order-by keys, and the two operations
//! the template directives are built from.

mod direction;
mod order;
mod anchor;
mod autosort;

pub use direction::*;
pub use order::*;
pub use anchor::*;
pub use autosort::*;
