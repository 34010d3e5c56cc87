//! Error types shared across the engine.

use crate::chain::PanicError;
use crate::core::{State, TransitionContext, Trigger};
use thiserror::Error;

/// Error type returned by user callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure of a callback chain or error-handler chain.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("operation '{label}' at step {step} failed: {source}")]
    Operation {
        step: usize,
        label: String,
        #[source]
        source: BoxError,
    },

    #[error("error handler '{label}' at step {step} failed: {source}")]
    Handler {
        step: usize,
        label: String,
        #[source]
        source: BoxError,
    },

    #[error(transparent)]
    Panic(#[from] PanicError),
}

impl ChainError {
    /// Zero-based index of the step that failed.
    pub fn step(&self) -> usize {
        match self {
            ChainError::Operation { step, .. } | ChainError::Handler { step, .. } => *step,
            ChainError::Panic(panic) => panic.step_number,
        }
    }

    pub fn as_panic(&self) -> Option<&PanicError> {
        match self {
            ChainError::Panic(panic) => Some(panic),
            _ => None,
        }
    }
}

/// Errors returned by `fire`, `can_fire` and `enumerate_active_triggers`.
///
/// A failed transition never invalidates the machine itself.
#[derive(Debug, Error)]
pub enum FireError {
    #[error("State not found in definition of states: {state}")]
    StateNotFound { state: State },

    #[error("Trigger '{trigger}' not found in definition for state: {state}")]
    TriggerNotFound { state: State, trigger: Trigger },

    #[error("guard '{guard}' rejected trigger '{trigger}' from state '{state}': {source}")]
    GuardRejected {
        state: State,
        trigger: Trigger,
        guard: String,
        #[source]
        source: BoxError,
    },

    #[error("guard panicked: {0}")]
    GuardPanicked(#[source] PanicError),

    /// A chain failed. `transition` is the context as reported after the
    /// error handlers ran, so it carries any retargeted destination.
    #[error("transition '{}' from '{}' failed: {error}", .transition.trigger(), .transition.source())]
    Chain {
        transition: TransitionContext,
        #[source]
        error: ChainError,
    },
}

impl FireError {
    /// Returns an error code suitable for reporting.
    pub fn error_code(&self) -> &'static str {
        match self {
            FireError::StateNotFound { .. } => "STATE_NOT_FOUND",
            FireError::TriggerNotFound { .. } => "TRIGGER_NOT_FOUND",
            FireError::GuardRejected { .. } => "GUARD_REJECTED",
            FireError::GuardPanicked(_) => "GUARD_PANICKED",
            FireError::Chain {
                error: ChainError::Panic(_),
                ..
            } => "CALLBACK_PANICKED",
            FireError::Chain { .. } => "CHAIN_FAILED",
        }
    }

    pub fn chain_error(&self) -> Option<&ChainError> {
        match self {
            FireError::Chain { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Transition context as reported for chain failures.
    pub fn transition(&self) -> Option<&TransitionContext> {
        match self {
            FireError::Chain { transition, .. } => Some(transition),
            _ => None,
        }
    }
}
