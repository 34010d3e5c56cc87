//! Core state machine types.
//!
//! This module contains the leaf types every other module builds on:
//! - State and trigger identifiers, and the `Payload` capability
//! - Guard predicates for transition control
//! - The per-transition context handed to user callbacks

mod context;
mod guard;
mod state;

pub use context::{ErrorContext, TransitionContext};
pub use guard::Guard;
pub use state::{Payload, State, Trigger};
