//! Configuration errors for definition builders.

use crate::core::{State, Trigger};
use thiserror::Error;

/// Errors raised while configuring a definition.
///
/// These are not recoverable: the definition is invalid and must be fixed
/// where it is built.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigurationError {
    #[error("State: {state} - has already been defined, configuration invalid.")]
    DuplicateState { state: State },

    #[error("Trigger: {trigger} - has already been defined on state {state}, configuration invalid.")]
    DuplicateTrigger { state: State, trigger: Trigger },
}
