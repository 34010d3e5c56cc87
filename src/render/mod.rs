//! Diagram export.
//!
//! Both renderers refuse definitions whose compilation reports errors.

pub mod dot;
mod error;
pub mod uml;

pub use error::RenderError;

use crate::builder::Definition;
use crate::compiler;

fn ensure_renderable<P>(definition: &Definition<P>) -> Result<(), RenderError> {
    let errors = compiler::validate(definition)
        .iter()
        .filter(|d| d.is_error())
        .count();
    if errors > 0 {
        return Err(RenderError::CompileErrors(errors));
    }
    if definition.is_empty() {
        return Err(RenderError::NoStates);
    }
    Ok(())
}
