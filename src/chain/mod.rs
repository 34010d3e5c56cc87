//! Callback chain execution with fault isolation.
//!
//! Entry and exit callbacks form ordered, guarded chains. When a chain
//! fails, the state's error chain runs and may retarget the reported
//! destination. Panics raised by user callbacks are caught at every step
//! boundary and surface as [`PanicError`] values, so a broken callback
//! degrades to an error instead of unwinding through the caller.

mod callback;
mod error_chain;
pub(crate) mod panic;

pub use callback::{CallbackChain, CallbackStep, Operation};
pub use error_chain::{ErrorChain, ErrorHandler, ErrorOperation};
pub use panic::{PanicError, PanicPayload, PanickedError};
