//! State and trigger identifiers, and the payload capability.
//!
//! States and triggers are opaque string-like values chosen by the caller.
//! The engine never inspects a payload beyond asking it for its current state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a configured state.
///
/// # Example
///
/// ```rust
/// use statewright::core::State;
///
/// let state = State::new("Created");
/// assert_eq!(state.as_str(), "Created");
/// assert_eq!(state, State::from("Created"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct State(String);

impl State {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for State {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for State {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&State> for State {
    fn from(s: &State) -> Self {
        s.clone()
    }
}

/// Name of a transition leaving a state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Trigger(String);

impl Trigger {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Trigger {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Trigger {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&Trigger> for Trigger {
    fn from(t: &Trigger) -> Self {
        t.clone()
    }
}

/// Capability every payload driven through a machine must provide.
///
/// The payload owns its current state; entry callbacks are expected to
/// record the new state themselves (usually from
/// [`TransitionContext::destination`](crate::core::TransitionContext::destination)).
///
/// # Example
///
/// ```rust
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
/// ```
pub trait Payload {
    fn state(&self) -> State;
}
