//! PlantUML state-diagram text.

use super::{ensure_renderable, RenderError};
use crate::builder::Definition;

/// Render `definition` as `@startuml` text.
///
/// The first configured state is drawn as the initial state, followed by one
/// `src --> dst : trigger` line per edge.
pub fn render_uml<P>(definition: &Definition<P>) -> Result<String, RenderError> {
    ensure_renderable(definition)?;
    let initial = definition.initial_state().ok_or(RenderError::NoStates)?;

    let mut uml = format!("@startuml\n[*] -> {initial} \n");
    definition.iterate_edges(|source, destination, trigger| {
        uml.push_str(&format!("{source} --> {destination} : {trigger}\n"));
    });
    uml.push_str("@enduml");
    Ok(uml)
}
