//! Context describing one in-flight transition.

use crate::core::state::{State, Trigger};
use chrono::{DateTime, Utc};
use std::time::Duration;
use uuid::Uuid;

/// Context handed to guards, chain steps and side effects.
///
/// A fresh context is created for every `fire` call. Its destination is
/// frozen everywhere except inside error handlers, which see it through
/// [`ErrorContext`].
#[derive(Clone, Debug, PartialEq)]
pub struct TransitionContext {
    id: Uuid,
    source: State,
    destination: State,
    trigger: Trigger,
    started_at: DateTime<Utc>,
}

impl TransitionContext {
    pub fn new(source: State, destination: State, trigger: Trigger) -> Self {
        Self {
            id: Uuid::new_v4(),
            source,
            destination,
            trigger,
            started_at: Utc::now(),
        }
    }

    /// Correlation id of the `fire` call that created this context.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn source(&self) -> &State {
        &self.source
    }

    pub fn destination(&self) -> &State {
        &self.destination
    }

    pub fn trigger(&self) -> &Trigger {
        &self.trigger
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Time elapsed since the transition started.
    pub fn elapsed(&self) -> Duration {
        Utc::now()
            .signed_duration_since(self.started_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    pub(crate) fn elapsed_millis(&self) -> u64 {
        u64::try_from(self.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    pub(crate) fn set_destination(&mut self, destination: State) {
        self.destination = destination;
    }
}

/// Mutable view of a [`TransitionContext`] given to error handlers.
///
/// Retargeting only changes what is reported to the caller and to side
/// effects; the new destination's entry chain is never run.
#[derive(Debug)]
pub struct ErrorContext<'a> {
    inner: &'a mut TransitionContext,
}

impl<'a> ErrorContext<'a> {
    pub(crate) fn new(inner: &'a mut TransitionContext) -> Self {
        Self { inner }
    }

    pub fn source(&self) -> &State {
        self.inner.source()
    }

    pub fn destination(&self) -> &State {
        self.inner.destination()
    }

    pub fn trigger(&self) -> &Trigger {
        self.inner.trigger()
    }

    pub fn set_destination(&mut self, destination: impl Into<State>) {
        self.inner.set_destination(destination.into());
    }

    /// Read-only view of the underlying context.
    pub fn transition(&self) -> &TransitionContext {
        self.inner
    }
}
