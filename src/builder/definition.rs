//! The graph model: states, trigger edges and the definition that owns them.

use crate::builder::error::ConfigurationError;
use crate::builder::state::StateBuilder;
use crate::chain::{CallbackChain, ErrorChain};
use crate::compiler::{self, CompileDiagnostic, CompilerOutput};
use crate::core::{Guard, State, TransitionContext, Trigger};
use crate::render::{self, RenderError};
use crate::side_effects::{Phase, SideEffectBus, SideEffectFilter, SideEffectRegistration};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Stable handle of a state node inside its [`Definition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateId(usize);

impl StateId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Descriptive options attached to a state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateConfig {
    /// Display name; defaults to the state id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl StateConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// One allowed transition out of a state.
pub struct TriggerEdge<P> {
    name: Trigger,
    destination: State,
    guard: Option<Guard<P>>,
}

impl<P> TriggerEdge<P> {
    pub(crate) fn new(name: Trigger, destination: State, guard: Option<Guard<P>>) -> Self {
        Self {
            name,
            destination,
            guard,
        }
    }

    pub fn name(&self) -> &Trigger {
        &self.name
    }

    pub fn destination(&self) -> &State {
        &self.destination
    }

    pub fn guard(&self) -> Option<&Guard<P>> {
        self.guard.as_ref()
    }
}

/// One configured state with its edges and callback chains.
pub struct StateNode<P> {
    state: State,
    config: StateConfig,
    edges: Vec<TriggerEdge<P>>,
    triggers: HashMap<Trigger, usize>,
    pub(crate) entry: CallbackChain<P>,
    pub(crate) exit: CallbackChain<P>,
    pub(crate) errors: ErrorChain<P>,
}

impl<P> StateNode<P> {
    fn new(state: State, config: StateConfig) -> Self {
        Self {
            state,
            config,
            edges: Vec::new(),
            triggers: HashMap::new(),
            entry: CallbackChain::new(),
            exit: CallbackChain::new(),
            errors: ErrorChain::new(),
        }
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn config(&self) -> &StateConfig {
        &self.config
    }

    pub fn display_name(&self) -> &str {
        self.config.name.as_deref().unwrap_or(self.state.as_str())
    }

    /// Edges in registration order.
    pub fn edges(&self) -> &[TriggerEdge<P>] {
        &self.edges
    }

    pub fn edge(&self, trigger: &Trigger) -> Option<&TriggerEdge<P>> {
        self.triggers.get(trigger).map(|&i| &self.edges[i])
    }

    pub fn entry_chain(&self) -> &CallbackChain<P> {
        &self.entry
    }

    pub fn exit_chain(&self) -> &CallbackChain<P> {
        &self.exit
    }

    pub fn error_chain(&self) -> &ErrorChain<P> {
        &self.errors
    }
}

/// Edge as recorded in the flattened syntax list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub source: State,
    pub trigger: Trigger,
    pub destination: State,
}

/// Flattened view of the graph used for validation ordering: states in
/// configuration order, edges in registration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbstractSyntax {
    states: Vec<State>,
    edges: Vec<EdgeRecord>,
}

impl AbstractSyntax {
    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn edges(&self) -> &[EdgeRecord] {
        &self.edges
    }
}

/// Owns the whole graph. Built mutably, then consumed by [`Definition::compile`].
///
/// # Example
///
/// ```rust
/// use statewright::builder::Definition;
/// use statewright::core::{Payload, State};
///
/// struct Order {
///     state: State,
/// }
///
/// impl Payload for Order {
///     fn state(&self) -> State {
///         self.state.clone()
///     }
/// }
///
/// # fn main() -> Result<(), statewright::builder::ConfigurationError> {
/// let mut definition = Definition::<Order>::new();
/// definition
///     .configure("NewOrder")?
///     .permit("Submit", "PublishedOrder")?
///     .permit("Cancel", "Canceled")?;
/// definition.configure("PublishedOrder")?.permit("Cancel", "Canceled")?;
/// definition.configure("Canceled")?;
///
/// let output = definition.compile();
/// assert_eq!(output.warnings().count(), 1);
/// assert!(!output.has_errors());
/// # Ok(())
/// # }
/// ```
pub struct Definition<P> {
    nodes: Vec<StateNode<P>>,
    index: HashMap<State, StateId>,
    syntax: AbstractSyntax,
    side_effects: SideEffectBus<P>,
}

impl<P> Definition<P> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            index: HashMap::new(),
            syntax: AbstractSyntax::default(),
            side_effects: SideEffectBus::new(),
        }
    }

    /// Register a new state and return a builder for it.
    /// Fails if the state was already configured.
    pub fn configure(
        &mut self,
        state: impl Into<State>,
    ) -> Result<StateBuilder<'_, P>, ConfigurationError> {
        self.configure_with(state, StateConfig::default())
    }

    pub fn configure_with(
        &mut self,
        state: impl Into<State>,
        config: StateConfig,
    ) -> Result<StateBuilder<'_, P>, ConfigurationError> {
        let state = state.into();
        if self.index.contains_key(&state) {
            return Err(ConfigurationError::DuplicateState { state });
        }

        let id = StateId(self.nodes.len());
        self.nodes.push(StateNode::new(state.clone(), config));
        self.index.insert(state.clone(), id);
        self.syntax.states.push(state);

        Ok(StateBuilder::new(self, id))
    }

    /// Reopen an already configured state.
    pub fn state_mut(&mut self, state: &State) -> Option<StateBuilder<'_, P>> {
        let id = *self.index.get(state)?;
        Some(StateBuilder::new(self, id))
    }

    /// Register a side effect notified at every phase.
    pub fn side_effect<F>(&mut self, callback: F) -> &mut Self
    where
        F: Fn(Phase, &P, &TransitionContext, u64) + Send + Sync + 'static,
    {
        self.filtered_side_effect(SideEffectFilter::ALL, callback)
    }

    pub fn filtered_side_effect<F>(&mut self, filter: SideEffectFilter, callback: F) -> &mut Self
    where
        F: Fn(Phase, &P, &TransitionContext, u64) + Send + Sync + 'static,
    {
        let label = format!("side_effect#{}", self.side_effects.len());
        self.filtered_side_effect_labeled(filter, label, callback)
    }

    pub fn filtered_side_effect_labeled<F>(
        &mut self,
        filter: SideEffectFilter,
        label: impl Into<String>,
        callback: F,
    ) -> &mut Self
    where
        F: Fn(Phase, &P, &TransitionContext, u64) + Send + Sync + 'static,
    {
        self.side_effects
            .register(SideEffectRegistration::new(filter, label, callback));
        self
    }

    /// Validate the graph and wrap it in a machine.
    ///
    /// The machine is returned even when diagnostics contain errors; it is
    /// up to the caller to refuse to use it.
    pub fn compile(self) -> CompilerOutput<P> {
        compiler::compile(self)
    }

    /// Diagnostics `compile` would report, without consuming the definition.
    pub fn diagnostics(&self) -> Vec<CompileDiagnostic> {
        compiler::validate(self)
    }

    /// Call `visit(source, destination, trigger)` once per configured edge,
    /// states in configuration order and edges in registration order.
    pub fn iterate_edges<F>(&self, mut visit: F)
    where
        F: FnMut(&State, &State, &Trigger),
    {
        for node in &self.nodes {
            for edge in &node.edges {
                visit(&node.state, &edge.destination, &edge.name);
            }
        }
    }

    /// Render the graph as UML state-diagram text.
    pub fn render_uml(&self) -> Result<String, RenderError> {
        render::uml::render_uml(self)
    }

    /// The first configured state.
    pub fn initial_state(&self) -> Option<&State> {
        self.syntax.states.first()
    }

    pub fn node(&self, state: &State) -> Option<&StateNode<P>> {
        self.index.get(state).map(|id| &self.nodes[id.0])
    }

    pub fn nodes(&self) -> impl Iterator<Item = &StateNode<P>> {
        self.nodes.iter()
    }

    pub fn contains(&self, state: &State) -> bool {
        self.index.contains_key(state)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn abstract_syntax(&self) -> &AbstractSyntax {
        &self.syntax
    }

    pub fn side_effects(&self) -> &SideEffectBus<P> {
        &self.side_effects
    }

    pub(crate) fn node_at(&self, id: StateId) -> &StateNode<P> {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: StateId) -> &mut StateNode<P> {
        &mut self.nodes[id.0]
    }

    pub(crate) fn add_edge(
        &mut self,
        id: StateId,
        edge: TriggerEdge<P>,
    ) -> Result<(), ConfigurationError> {
        let node = &mut self.nodes[id.0];
        if node.triggers.contains_key(&edge.name) {
            return Err(ConfigurationError::DuplicateTrigger {
                state: node.state.clone(),
                trigger: edge.name,
            });
        }

        self.syntax.edges.push(EdgeRecord {
            source: node.state.clone(),
            trigger: edge.name.clone(),
            destination: edge.destination.clone(),
        });
        node.triggers.insert(edge.name.clone(), node.edges.len());
        node.edges.push(edge);
        Ok(())
    }
}

impl<P> Default for Definition<P> {
    fn default() -> Self {
        Self::new()
    }
}
