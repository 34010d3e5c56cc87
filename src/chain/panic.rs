//! Conversion of panics inside user callbacks into structured errors.

use crate::core::TransitionContext;
use crate::error::BoxError;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use thiserror::Error;

/// Error value recovered from a panic.
pub type PanickedError = Box<dyn std::error::Error + Send>;

/// Value a callback panicked with.
#[derive(Debug)]
pub enum PanicPayload {
    /// The panic value was error-typed. Recognized values are
    /// [`BoxError`], `Box<dyn Error + Send>`, `Arc<dyn Error + Send + Sync>`,
    /// [`std::io::Error`] and [`std::fmt::Error`], as passed to
    /// `std::panic::panic_any`. Any other error type lands in `Opaque`.
    Error(PanickedError),

    /// The panic carried a message (`panic!("...")`).
    Message(String),

    /// Any other panic value, kept as-is.
    Opaque(Box<dyn Any + Send>),
}

impl From<Box<dyn Any + Send>> for PanicPayload {
    fn from(value: Box<dyn Any + Send>) -> Self {
        let value = match value.downcast::<BoxError>() {
            Ok(err) => return PanicPayload::Error(*err),
            Err(value) => value,
        };
        let value = match value.downcast::<PanickedError>() {
            Ok(err) => return PanicPayload::Error(*err),
            Err(value) => value,
        };
        let value = match value.downcast::<Arc<dyn std::error::Error + Send + Sync>>() {
            Ok(err) => return PanicPayload::Error(Box::new(*err)),
            Err(value) => value,
        };
        let value = match value.downcast::<std::io::Error>() {
            Ok(err) => return PanicPayload::Error(err),
            Err(value) => value,
        };
        let value = match value.downcast::<fmt::Error>() {
            Ok(err) => return PanicPayload::Error(err),
            Err(value) => value,
        };
        let value = match value.downcast::<String>() {
            Ok(message) => return PanicPayload::Message(*message),
            Err(value) => value,
        };
        match value.downcast::<&'static str>() {
            Ok(message) => PanicPayload::Message((*message).to_string()),
            Err(value) => PanicPayload::Opaque(value),
        }
    }
}

impl fmt::Display for PanicPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PanicPayload::Error(err) => write!(f, "{err}"),
            PanicPayload::Message(message) => f.write_str(message),
            PanicPayload::Opaque(_) => f.write_str("opaque panic value"),
        }
    }
}

/// A panic intercepted at a chain step boundary.
///
/// Carries the transition as it was when the step panicked, the zero-based
/// step index within its chain and the callback's label.
#[derive(Debug, Error)]
#[error(
    "callback '{label}' panicked at step {step_number} during '{}' from '{}': {payload}",
    .transition.trigger(),
    .transition.source()
)]
pub struct PanicError {
    pub transition: TransitionContext,
    pub step_number: usize,
    pub label: String,
    pub payload: PanicPayload,
}

impl PanicError {
    pub fn new(
        transition: TransitionContext,
        step_number: usize,
        label: impl Into<String>,
        payload: PanicPayload,
    ) -> Self {
        let err = Self {
            transition,
            step_number,
            label: label.into(),
            payload,
        };
        tracing::warn!(
            transition_id = %err.transition.id(),
            step = err.step_number,
            label = %err.label,
            "callback panicked: {}",
            err.payload
        );
        err
    }

    /// The error the callback panicked with, when the panic value was error-typed.
    pub fn inner_error(&self) -> Option<&(dyn std::error::Error + Send + 'static)> {
        match &self.payload {
            PanicPayload::Error(err) => Some(err.as_ref()),
            _ => None,
        }
    }

    /// The panic value when it was neither an error nor a message.
    pub fn unknown_inner(&self) -> Option<&(dyn Any + Send)> {
        match &self.payload {
            PanicPayload::Opaque(value) => Some(value.as_ref()),
            _ => None,
        }
    }
}

/// Run `call`, catching any panic it raises.
pub(crate) fn catch<T>(call: impl FnOnce() -> T) -> Result<T, PanicPayload> {
    panic::catch_unwind(AssertUnwindSafe(call)).map_err(PanicPayload::from)
}
