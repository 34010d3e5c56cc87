//! Error handlers run after an entry or exit chain fails.

use crate::chain::panic::{catch, PanicError};
use crate::core::{ErrorContext, TransitionContext};
use crate::error::{BoxError, ChainError};

/// Error handler. Receives the error that made the chain fail.
pub type ErrorOperation<P> =
    Box<dyn Fn(&mut P, &mut ErrorContext<'_>, &ChainError) -> Result<(), BoxError> + Send + Sync>;

/// One entry of an [`ErrorChain`].
pub struct ErrorHandler<P> {
    label: String,
    operation: ErrorOperation<P>,
}

impl<P> ErrorHandler<P> {
    pub fn new<F>(label: impl Into<String>, operation: F) -> Self
    where
        F: Fn(&mut P, &mut ErrorContext<'_>, &ChainError) -> Result<(), BoxError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            label: label.into(),
            operation: Box::new(operation),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

/// Ordered error handlers of one state.
pub struct ErrorChain<P> {
    handlers: Vec<ErrorHandler<P>>,
}

impl<P> ErrorChain<P> {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    pub fn push(&mut self, handler: ErrorHandler<P>) {
        self.handlers.push(handler);
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Run the handlers for `cause`.
    ///
    /// Every handler sees the same `cause`. The first handler that returns
    /// an error (or panics) stops the chain and its error replaces `cause`;
    /// retargeting done by later handlers never happens. Retargeting done
    /// by earlier handlers is kept.
    pub fn execute(
        &self,
        payload: &mut P,
        ctx: &mut TransitionContext,
        cause: &ChainError,
    ) -> Result<(), ChainError> {
        for (step, handler) in self.handlers.iter().enumerate() {
            let before = ctx.destination().clone();

            let outcome = catch(|| {
                let mut view = ErrorContext::new(ctx);
                (handler.operation)(payload, &mut view, cause)
            });

            match outcome {
                Ok(Ok(())) => {
                    if *ctx.destination() != before {
                        tracing::warn!(
                            transition_id = %ctx.id(),
                            handler = %handler.label,
                            from = %before,
                            to = %ctx.destination(),
                            "error handler retargeted destination"
                        );
                    }
                }
                Ok(Err(source)) => {
                    tracing::warn!(
                        transition_id = %ctx.id(),
                        step,
                        handler = %handler.label,
                        "error handler failed: {source}"
                    );
                    return Err(ChainError::Handler {
                        step,
                        label: handler.label.clone(),
                        source,
                    });
                }
                Err(panic) => {
                    return Err(PanicError::new(ctx.clone(), step, &handler.label, panic).into());
                }
            }
        }

        Ok(())
    }
}

impl<P> Default for ErrorChain<P> {
    fn default() -> Self {
        Self::new()
    }
}
