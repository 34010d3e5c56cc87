//! Filtered fan-out of transition lifecycle notifications.
//!
//! Side effects observe transitions; they cannot change them. They are not
//! fault-isolated: a panic inside a side effect propagates to the caller
//! of `fire`.

use crate::core::TransitionContext;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Point in the transition lifecycle a side effect is notified at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    BeforeTransition,
    BetweenStates,
    AfterTransition,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::BeforeTransition => "BeforeTransition",
            Phase::BetweenStates => "BetweenStates",
            Phase::AfterTransition => "AfterTransition",
        }
    }

    fn filter(self) -> SideEffectFilter {
        match self {
            Phase::BeforeTransition => SideEffectFilter::BEFORE_TRANSITION,
            Phase::BetweenStates => SideEffectFilter::BETWEEN_STATES,
            Phase::AfterTransition => SideEffectFilter::AFTER_TRANSITION,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bitmask of phases a side effect wants to observe.
///
/// ```rust
/// use statewright::side_effects::{Phase, SideEffectFilter};
///
/// let filter = SideEffectFilter::BEFORE_TRANSITION | SideEffectFilter::AFTER_TRANSITION;
/// assert!(filter.allows(Phase::AfterTransition));
/// assert!(!filter.allows(Phase::BetweenStates));
/// assert!(SideEffectFilter::ALL.allows(Phase::BetweenStates));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SideEffectFilter(u8);

impl SideEffectFilter {
    pub const NONE: Self = Self(0);
    pub const BEFORE_TRANSITION: Self = Self(1);
    pub const BETWEEN_STATES: Self = Self(2);
    pub const AFTER_TRANSITION: Self = Self(4);
    pub const ALL: Self = Self(
        Self::BEFORE_TRANSITION.0 | Self::BETWEEN_STATES.0 | Self::AFTER_TRANSITION.0,
    );

    pub fn bits(&self) -> u8 {
        self.0
    }

    pub fn allows(&self, phase: Phase) -> bool {
        self.0 & phase.filter().0 != 0
    }
}

impl BitOr for SideEffectFilter {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for SideEffectFilter {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Side effect callback: phase, payload, transition and milliseconds
/// elapsed since the transition started.
pub type SideEffect<P> = Box<dyn Fn(Phase, &P, &TransitionContext, u64) + Send + Sync>;

/// One registered observer.
pub struct SideEffectRegistration<P> {
    filter: SideEffectFilter,
    label: String,
    callback: SideEffect<P>,
}

impl<P> SideEffectRegistration<P> {
    pub fn new<F>(filter: SideEffectFilter, label: impl Into<String>, callback: F) -> Self
    where
        F: Fn(Phase, &P, &TransitionContext, u64) + Send + Sync + 'static,
    {
        Self {
            filter,
            label: label.into(),
            callback: Box::new(callback),
        }
    }

    pub fn filter(&self) -> SideEffectFilter {
        self.filter
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

/// Registered side effects, dispatched in registration order.
pub struct SideEffectBus<P> {
    registrations: Vec<SideEffectRegistration<P>>,
}

impl<P> SideEffectBus<P> {
    pub fn new() -> Self {
        Self {
            registrations: Vec::new(),
        }
    }

    pub fn register(&mut self, registration: SideEffectRegistration<P>) {
        self.registrations.push(registration);
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Invoke every registration whose filter allows `phase`.
    /// Returns how many were invoked.
    pub fn dispatch(
        &self,
        phase: Phase,
        payload: &P,
        ctx: &TransitionContext,
        elapsed_millis: u64,
    ) -> usize {
        let mut invoked = 0;
        for registration in &self.registrations {
            if registration.filter.allows(phase) {
                (registration.callback)(phase, payload, ctx, elapsed_millis);
                invoked += 1;
            }
        }

        tracing::trace!(
            transition_id = %ctx.id(),
            %phase,
            invoked,
            "dispatched side effects"
        );
        invoked
    }
}

impl<P> Default for SideEffectBus<P> {
    fn default() -> Self {
        Self::new()
    }
}
