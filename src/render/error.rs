use std::io;
use thiserror::Error;

/// Errors raised while exporting a definition as a diagram.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("critical errors exist in definition ({0} compile errors)")]
    CompileErrors(usize),

    #[error("definition has no states")]
    NoStates,

    #[error("failed to write diagram: {0}")]
    Io(#[from] io::Error),
}

impl RenderError {
    pub fn error_code(&self) -> &'static str {
        match self {
            RenderError::CompileErrors(_) => "COMPILE_ERRORS",
            RenderError::NoStates => "NO_STATES",
            RenderError::Io(_) => "IO_ERROR",
        }
    }
}
