//! Ordered, guarded operation chains run on state entry and exit.

use crate::chain::panic::{catch, PanicError};
use crate::core::{Guard, TransitionContext};
use crate::error::{BoxError, ChainError};

/// Entry or exit operation. Mutates the payload in place.
pub type Operation<P> = Box<dyn Fn(&mut P, &TransitionContext) -> Result<(), BoxError> + Send + Sync>;

/// One entry of a [`CallbackChain`].
pub struct CallbackStep<P> {
    guard: Option<Guard<P>>,
    label: String,
    operation: Operation<P>,
}

impl<P> CallbackStep<P> {
    pub fn new<F>(label: impl Into<String>, operation: F) -> Self
    where
        F: Fn(&mut P, &TransitionContext) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        Self {
            guard: None,
            label: label.into(),
            operation: Box::new(operation),
        }
    }

    /// Step that only runs when `guard` permits it. A rejecting guard skips
    /// the step without failing the chain.
    pub fn guarded<F>(guard: Guard<P>, label: impl Into<String>, operation: F) -> Self
    where
        F: Fn(&mut P, &TransitionContext) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        Self {
            guard: Some(guard),
            ..Self::new(label, operation)
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

/// Ordered list of [`CallbackStep`]s executed in registration order.
pub struct CallbackChain<P> {
    steps: Vec<CallbackStep<P>>,
}

impl<P> CallbackChain<P> {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    pub fn push(&mut self, step: CallbackStep<P>) {
        self.steps.push(step);
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(CallbackStep::label)
    }

    /// Run every step against `payload`.
    ///
    /// Stops at the first step that returns an error or panics. Panics are
    /// caught at the step boundary and reported as [`ChainError::Panic`];
    /// in both cases `payload` is left as the failing step left it.
    pub fn execute(&self, payload: &mut P, ctx: &TransitionContext) -> Result<(), ChainError> {
        for (step, entry) in self.steps.iter().enumerate() {
            if let Some(guard) = &entry.guard {
                let verdict = catch(|| guard.check(payload, ctx))
                    .map_err(|panic| PanicError::new(ctx.clone(), step, guard.label(), panic))?;
                if let Err(reason) = verdict {
                    tracing::trace!(
                        transition_id = %ctx.id(),
                        step,
                        label = %entry.label,
                        "skipping guarded step: {reason}"
                    );
                    continue;
                }
            }

            match catch(|| (entry.operation)(payload, ctx)) {
                Ok(Ok(())) => {}
                Ok(Err(source)) => {
                    tracing::warn!(
                        transition_id = %ctx.id(),
                        step,
                        label = %entry.label,
                        "chain step failed: {source}"
                    );
                    return Err(ChainError::Operation {
                        step,
                        label: entry.label.clone(),
                        source,
                    });
                }
                Err(panic) => {
                    return Err(PanicError::new(ctx.clone(), step, &entry.label, panic).into());
                }
            }
        }

        Ok(())
    }
}

impl<P> Default for CallbackChain<P> {
    fn default() -> Self {
        Self::new()
    }
}
