//! Graph validation.
//!
//! `compile` walks the definition once: every edge whose destination was
//! never configured is an error, every state without edges is a warning.
//! Diagnostics never stop compilation; callers that need a valid graph
//! (diagram export, for one) check [`CompilerOutput::has_errors`].

use crate::builder::Definition;
use crate::machine::CompiledMachine;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a [`CompileDiagnostic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("Compile Error"),
            Severity::Warning => f.write_str("Compile Warning"),
        }
    }
}

/// One validation finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileDiagnostic {
    pub severity: Severity,
    pub message: String,
}

impl CompileDiagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for CompileDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)
    }
}

/// Result of [`compile`]: the machine plus every diagnostic found.
pub struct CompilerOutput<P> {
    pub machine: CompiledMachine<P>,
    pub diagnostics: Vec<CompileDiagnostic>,
}

impl<P> CompilerOutput<P> {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(CompileDiagnostic::is_error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &CompileDiagnostic> {
        self.diagnostics.iter().filter(|d| d.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &CompileDiagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }

    pub fn into_machine(self) -> CompiledMachine<P> {
        self.machine
    }
}

/// Validate `definition` without consuming it.
pub fn validate<P>(definition: &Definition<P>) -> Vec<CompileDiagnostic> {
    let syntax = definition.abstract_syntax();
    let mut diagnostics = Vec::new();

    for edge in syntax.edges() {
        if !definition.contains(&edge.destination) {
            diagnostics.push(CompileDiagnostic::error(format!(
                "State '{}' undefined: Trigger '{}' declares a transition to this undefined state.",
                edge.destination, edge.trigger
            )));
        }
    }

    for node in definition.nodes() {
        if node.edges().is_empty() {
            diagnostics.push(CompileDiagnostic::warning(format!(
                "State '{}' is a state without any triggers (deadend state).",
                node.state()
            )));
        }
    }

    for diagnostic in &diagnostics {
        match diagnostic.severity {
            Severity::Error => tracing::warn!("{diagnostic}"),
            Severity::Warning => tracing::debug!("{diagnostic}"),
        }
    }

    diagnostics
}

/// Validate `definition` and wrap it in a [`CompiledMachine`].
pub fn compile<P>(definition: Definition<P>) -> CompilerOutput<P> {
    let diagnostics = validate(&definition);
    tracing::debug!(
        states = definition.len(),
        edges = definition.abstract_syntax().edges().len(),
        diagnostics = diagnostics.len(),
        "compiled definition"
    );

    CompilerOutput {
        machine: CompiledMachine::new(definition),
        diagnostics,
    }
}
