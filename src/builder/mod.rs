//! Builder API for declaring state machine definitions.
//!
//! A [`Definition`] owns every configured state. `configure` returns a
//! [`StateBuilder`] used to add trigger edges, entry and exit steps and
//! error handlers to that state. Duplicate states and duplicate triggers
//! on one state are reported as [`ConfigurationError`]s.

mod definition;
pub mod error;
mod state;

pub use definition::{
    AbstractSyntax, Definition, EdgeRecord, StateConfig, StateId, StateNode, TriggerEdge,
};
pub use error::ConfigurationError;
pub use state::StateBuilder;
