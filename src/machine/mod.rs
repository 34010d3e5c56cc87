//! Compiled state machine that executes transitions against payloads.
//!
//! A [`CompiledMachine`] is immutable once compiled and can be shared
//! across threads; every `fire` call works on its own
//! [`TransitionContext`], so no locking happens inside the engine.

use crate::builder::{Definition, StateNode, TriggerEdge};
use crate::chain::{ErrorChain, PanicError};
use crate::chain::panic::catch;
use crate::core::{Guard, Payload, TransitionContext, Trigger};
use crate::error::{ChainError, FireError};
use crate::side_effects::Phase;
use std::sync::Arc;

/// Execution facade over a validated [`Definition`].
pub struct CompiledMachine<P> {
    definition: Arc<Definition<P>>,
}

impl<P> Clone for CompiledMachine<P> {
    fn clone(&self) -> Self {
        Self {
            definition: Arc::clone(&self.definition),
        }
    }
}

impl<P> CompiledMachine<P> {
    pub(crate) fn new(definition: Definition<P>) -> Self {
        Self {
            definition: Arc::new(definition),
        }
    }

    pub fn definition(&self) -> &Definition<P> {
        &self.definition
    }
}

impl<P: Payload> CompiledMachine<P> {
    /// Triggers configured on the payload's current state.
    pub fn enumerate_active_triggers(&self, payload: &P) -> Result<Vec<Trigger>, FireError> {
        let node = self.current_node(payload)?;
        Ok(node.edges().iter().map(|edge| edge.name().clone()).collect())
    }

    /// Check whether `trigger` could fire from the payload's current state.
    ///
    /// Evaluates the edge guard, if any, but runs no chain and dispatches no
    /// side effect.
    pub fn can_fire(&self, payload: &P, trigger: impl Into<Trigger>) -> Result<(), FireError> {
        let trigger = trigger.into();
        let (node, edge) = self.resolve(payload, &trigger)?;
        if let Some(guard) = edge.guard() {
            let ctx = TransitionContext::new(
                node.state().clone(),
                edge.destination().clone(),
                trigger,
            );
            check_guard(guard, payload, &ctx)?;
        }
        Ok(())
    }

    /// Run the full transition protocol for `trigger`.
    ///
    /// Order: guard, `BeforeTransition`, source exit chain, `BetweenStates`,
    /// destination entry chain, `AfterTransition`. The first chain failure
    /// runs the failing state's error chain and ends the transition; the
    /// returned [`FireError::Chain`] carries the context as reported after
    /// the handlers ran. On success the final context is returned.
    pub fn fire(
        &self,
        payload: &mut P,
        trigger: impl Into<Trigger>,
    ) -> Result<TransitionContext, FireError> {
        let trigger = trigger.into();
        let (source, edge) = self.resolve(payload, &trigger)?;
        let destination =
            self.definition
                .node(edge.destination())
                .ok_or_else(|| FireError::StateNotFound {
                    state: edge.destination().clone(),
                })?;

        let mut ctx = TransitionContext::new(
            source.state().clone(),
            destination.state().clone(),
            trigger,
        );
        if let Some(guard) = edge.guard() {
            check_guard(guard, payload, &ctx)?;
        }

        tracing::debug!(
            transition_id = %ctx.id(),
            source = %ctx.source(),
            destination = %ctx.destination(),
            trigger = %ctx.trigger(),
            "firing transition"
        );

        let side_effects = self.definition.side_effects();
        side_effects.dispatch(Phase::BeforeTransition, payload, &ctx, ctx.elapsed_millis());

        if let Err(error) = source.exit.execute(payload, &ctx) {
            let error = recover(&source.errors, payload, &mut ctx, error);
            side_effects.dispatch(Phase::BetweenStates, payload, &ctx, ctx.elapsed_millis());
            return Err(fail(ctx, error));
        }

        side_effects.dispatch(Phase::BetweenStates, payload, &ctx, ctx.elapsed_millis());

        if let Err(error) = destination.entry.execute(payload, &ctx) {
            let error = recover(&destination.errors, payload, &mut ctx, error);
            return Err(fail(ctx, error));
        }

        side_effects.dispatch(Phase::AfterTransition, payload, &ctx, ctx.elapsed_millis());

        tracing::debug!(
            transition_id = %ctx.id(),
            elapsed_ms = ctx.elapsed_millis(),
            "transition complete"
        );
        Ok(ctx)
    }

    fn current_node(&self, payload: &P) -> Result<&StateNode<P>, FireError> {
        let state = payload.state();
        self.definition
            .node(&state)
            .ok_or(FireError::StateNotFound { state })
    }

    fn resolve(
        &self,
        payload: &P,
        trigger: &Trigger,
    ) -> Result<(&StateNode<P>, &TriggerEdge<P>), FireError> {
        let node = self.current_node(payload)?;
        let edge = node.edge(trigger).ok_or_else(|| FireError::TriggerNotFound {
            state: node.state().clone(),
            trigger: trigger.clone(),
        })?;
        Ok((node, edge))
    }
}

fn check_guard<P>(guard: &Guard<P>, payload: &P, ctx: &TransitionContext) -> Result<(), FireError> {
    match catch(|| guard.check(payload, ctx)) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(source)) => {
            tracing::debug!(
                transition_id = %ctx.id(),
                guard = guard.label(),
                "guard rejected transition: {source}"
            );
            Err(FireError::GuardRejected {
                state: ctx.source().clone(),
                trigger: ctx.trigger().clone(),
                guard: guard.label().to_string(),
                source,
            })
        }
        Err(panic) => Err(FireError::GuardPanicked(PanicError::new(
            ctx.clone(),
            0,
            guard.label(),
            panic,
        ))),
    }
}

/// Run `handlers` for `error` and return the error the transition reports:
/// the handler's own error when one failed, `error` otherwise.
fn recover<P>(
    handlers: &ErrorChain<P>,
    payload: &mut P,
    ctx: &mut TransitionContext,
    error: ChainError,
) -> ChainError {
    match handlers.execute(payload, ctx, &error) {
        Ok(()) => error,
        Err(superseding) => superseding,
    }
}

fn fail(transition: TransitionContext, error: ChainError) -> FireError {
    tracing::debug!(
        transition_id = %transition.id(),
        destination = %transition.destination(),
        "transition failed: {error}"
    );
    FireError::Chain { transition, error }
}
