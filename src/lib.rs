//! Statewright: a compiled, in-process finite state machine interpreter
//!
//! A machine is declared once through the builder, validated by the
//! compiler and then fired many times against caller-owned payloads.
//! The compiled machine is immutable, so a single instance can be shared
//! by any number of threads.
//!
//! # Core Concepts
//!
//! - **Definition**: States, trigger edges, entry and exit chains, error handlers
//! - **Compiler**: Diagnostics for undefined destinations and dead-end states
//! - **Callback chains**: Ordered steps with panic isolation at every boundary
//! - **Error chains**: Handlers that observe a failure and may retarget the destination
//! - **Side effects**: Phase-filtered notifications around every transition
//!
//! # Example
//!
//! ```rust
//! use statewright::{Definition, Payload, State};
//!
//! struct Order {
//!     state: State,
//!     items: u32,
//! }
//!
//! impl Payload for Order {
//!     fn state(&self) -> State {
//!         self.state.clone()
//!     }
//! }
//!
//! let mut definition = Definition::<Order>::new();
//! definition
//!     .configure("NewOrder")
//!     .unwrap()
//!     .permit("Submit", "PublishedOrder")
//!     .unwrap();
//! definition
//!     .configure("PublishedOrder")
//!     .unwrap()
//!     .on_entry(|order: &mut Order, ctx| {
//!         order.items += 1;
//!         order.state = ctx.destination().clone();
//!         Ok(())
//!     });
//!
//! let output = definition.compile();
//! assert!(!output.has_errors());
//! let machine = output.into_machine();
//!
//! let mut order = Order { state: State::new("NewOrder"), items: 0 };
//! let transition = machine.fire(&mut order, "Submit").unwrap();
//!
//! assert_eq!(transition.destination().as_str(), "PublishedOrder");
//! assert_eq!(order.state.as_str(), "PublishedOrder");
//! assert_eq!(order.items, 1);
//! ```

pub mod builder;
pub mod chain;
pub mod compiler;
pub mod core;
pub mod error;
pub mod machine;
pub mod render;
pub mod side_effects;

// Re-export commonly used types
pub use crate::builder::{ConfigurationError, Definition, StateBuilder, StateConfig};
pub use crate::chain::{PanicError, PanicPayload, PanickedError};
pub use crate::compiler::{CompileDiagnostic, CompilerOutput, Severity};
pub use crate::core::{ErrorContext, Guard, Payload, State, TransitionContext, Trigger};
pub use crate::error::{BoxError, ChainError, FireError};
pub use crate::machine::CompiledMachine;
pub use crate::render::RenderError;
pub use crate::side_effects::{Phase, SideEffectBus, SideEffectFilter};
