//! Fluent builder for one state of a definition.

use crate::builder::definition::{Definition, StateId, StateNode, TriggerEdge};
use crate::builder::error::ConfigurationError;
use crate::chain::{CallbackStep, ErrorHandler};
use crate::core::{ErrorContext, Guard, State, TransitionContext, Trigger};
use crate::error::{BoxError, ChainError};

/// Builder for a configured state.
///
/// Holds the definition mutably and addresses its node by [`StateId`], so
/// every call in a chain mutates the same node.
pub struct StateBuilder<'a, P> {
    definition: &'a mut Definition<P>,
    id: StateId,
}

impl<'a, P> StateBuilder<'a, P> {
    pub(crate) fn new(definition: &'a mut Definition<P>, id: StateId) -> Self {
        Self { definition, id }
    }

    pub fn id(&self) -> StateId {
        self.id
    }

    pub fn state(&self) -> &State {
        self.definition.node_at(self.id).state()
    }

    /// Append an unconditional entry step.
    pub fn on_entry<F>(self, operation: F) -> Self
    where
        F: Fn(&mut P, &TransitionContext) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        let label = self.default_label("on_entry", self.node_entry_len());
        self.on_entry_labeled(label, operation)
    }

    pub fn on_entry_labeled<F>(mut self, label: impl Into<String>, operation: F) -> Self
    where
        F: Fn(&mut P, &TransitionContext) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.node()
            .entry
            .push(CallbackStep::new(label, operation));
        self
    }

    /// Append an entry step that only runs when entering through `trigger`.
    pub fn on_trigger_entry<F>(self, trigger: impl Into<Trigger>, operation: F) -> Self
    where
        P: 'static,
        F: Fn(&mut P, &TransitionContext) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        let trigger = trigger.into();
        let label = self.default_label(&format!("on_entry[{trigger}]"), self.node_entry_len());
        self.on_trigger_entry_labeled(trigger, label, operation)
    }

    pub fn on_trigger_entry_labeled<F>(
        mut self,
        trigger: impl Into<Trigger>,
        label: impl Into<String>,
        operation: F,
    ) -> Self
    where
        P: 'static,
        F: Fn(&mut P, &TransitionContext) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        let guard = Guard::trigger_is(trigger.into());
        self.node()
            .entry
            .push(CallbackStep::guarded(guard, label, operation));
        self
    }

    /// Append an unconditional exit step.
    pub fn on_exit<F>(self, operation: F) -> Self
    where
        F: Fn(&mut P, &TransitionContext) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        let label = self.default_label("on_exit", self.node_exit_len());
        self.on_exit_labeled(label, operation)
    }

    pub fn on_exit_labeled<F>(mut self, label: impl Into<String>, operation: F) -> Self
    where
        F: Fn(&mut P, &TransitionContext) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.node().exit.push(CallbackStep::new(label, operation));
        self
    }

    /// Append an exit step that only runs when leaving through `trigger`.
    pub fn on_trigger_exit<F>(self, trigger: impl Into<Trigger>, operation: F) -> Self
    where
        P: 'static,
        F: Fn(&mut P, &TransitionContext) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        let trigger = trigger.into();
        let label = self.default_label(&format!("on_exit[{trigger}]"), self.node_exit_len());
        self.on_trigger_exit_labeled(trigger, label, operation)
    }

    pub fn on_trigger_exit_labeled<F>(
        mut self,
        trigger: impl Into<Trigger>,
        label: impl Into<String>,
        operation: F,
    ) -> Self
    where
        P: 'static,
        F: Fn(&mut P, &TransitionContext) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        let guard = Guard::trigger_is(trigger.into());
        self.node()
            .exit
            .push(CallbackStep::guarded(guard, label, operation));
        self
    }

    /// Append an error handler, run when this state's entry or exit chain fails.
    pub fn on_error<F>(self, operation: F) -> Self
    where
        F: Fn(&mut P, &mut ErrorContext<'_>, &ChainError) -> Result<(), BoxError>
            + Send
            + Sync
            + 'static,
    {
        let label = self.default_label("on_error", self.definition.node_at(self.id).errors.len());
        self.on_error_labeled(label, operation)
    }

    pub fn on_error_labeled<F>(mut self, label: impl Into<String>, operation: F) -> Self
    where
        F: Fn(&mut P, &mut ErrorContext<'_>, &ChainError) -> Result<(), BoxError>
            + Send
            + Sync
            + 'static,
    {
        self.node().errors.push(ErrorHandler::new(label, operation));
        self
    }

    /// Allow `trigger` to move from this state to `destination`.
    pub fn permit(
        self,
        trigger: impl Into<Trigger>,
        destination: impl Into<State>,
    ) -> Result<Self, ConfigurationError> {
        self.add_edge(trigger.into(), destination.into(), None)
    }

    /// Allow `trigger` only when `predicate` permits it.
    pub fn permit_if<F>(
        self,
        predicate: F,
        trigger: impl Into<Trigger>,
        destination: impl Into<State>,
    ) -> Result<Self, ConfigurationError>
    where
        F: Fn(&P, &TransitionContext) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        let trigger = trigger.into();
        let label = format!("{}.{}.guard", self.state(), trigger);
        self.permit_guarded(Guard::new(label, predicate), trigger, destination)
    }

    pub fn permit_guarded(
        self,
        guard: Guard<P>,
        trigger: impl Into<Trigger>,
        destination: impl Into<State>,
    ) -> Result<Self, ConfigurationError> {
        self.add_edge(trigger.into(), destination.into(), Some(guard))
    }

    fn add_edge(
        self,
        trigger: Trigger,
        destination: State,
        guard: Option<Guard<P>>,
    ) -> Result<Self, ConfigurationError> {
        self.definition
            .add_edge(self.id, TriggerEdge::new(trigger, destination, guard))?;
        Ok(self)
    }

    fn node(&mut self) -> &mut StateNode<P> {
        self.definition.node_mut(self.id)
    }

    fn node_entry_len(&self) -> usize {
        self.definition.node_at(self.id).entry.len()
    }

    fn node_exit_len(&self) -> usize {
        self.definition.node_at(self.id).exit.len()
    }

    fn default_label(&self, kind: &str, position: usize) -> String {
        format!("{}.{}#{}", self.state(), kind, position)
    }
}
