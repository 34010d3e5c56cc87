//! Guard predicates for controlling state transitions.
//!
//! Guards decide whether a trigger edge may fire, and whether a guarded
//! chain step runs. A guard returns `Ok(())` to permit and an error to
//! reject; the error explains the rejection to the caller.

use crate::core::context::TransitionContext;
use crate::core::state::Trigger;
use crate::error::BoxError;

type Predicate<P> = Box<dyn Fn(&P, &TransitionContext) -> Result<(), BoxError> + Send + Sync>;

/// Labeled predicate over a payload and the transition in flight.
///
/// # Example
///
/// ```rust
/// use statewright::core::{Guard, Payload, State, TransitionContext};
///
/// struct Order {
///     paid: bool,
/// }
///
/// impl Payload for Order {
///     fn state(&self) -> State {
///         State::new("Created")
///     }
/// }
///
/// let paid = Guard::new("order_is_paid", |order: &Order, _ctx: &TransitionContext| {
///     if order.paid {
///         Ok(())
///     } else {
///         Err("order has not been paid".into())
///     }
/// });
///
/// let ctx = TransitionContext::new("Created".into(), "Shipped".into(), "Ship".into());
/// assert!(paid.check(&Order { paid: true }, &ctx).is_ok());
/// assert!(paid.check(&Order { paid: false }, &ctx).is_err());
/// ```
pub struct Guard<P> {
    label: String,
    predicate: Predicate<P>,
}

impl<P> Guard<P> {
    /// Create a guard from a predicate function.
    ///
    /// The predicate should be free of side effects; `can_fire` evaluates
    /// it without running any chain.
    pub fn new<F>(label: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&P, &TransitionContext) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        Guard {
            label: label.into(),
            predicate: Box::new(predicate),
        }
    }

    /// Guard that permits only transitions fired by `trigger`.
    pub fn trigger_is(trigger: Trigger) -> Self
    where
        P: 'static,
    {
        let label = format!("trigger_is({trigger})");
        Guard::new(label, move |_: &P, ctx: &TransitionContext| {
            if *ctx.trigger() == trigger {
                Ok(())
            } else {
                Err(format!("trigger '{}' does not match '{}'", ctx.trigger(), trigger).into())
            }
        })
    }

    pub fn check(&self, payload: &P, ctx: &TransitionContext) -> Result<(), BoxError> {
        (self.predicate)(payload, ctx)
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl<P> std::fmt::Debug for Guard<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Guard").field("label", &self.label).finish()
    }
}
