use std::{io, path::PathBuf};

use thiserror::Error;

use crate::TestKind;

#[derive(Error, Debug)]
pub enum ProducerError {
    // Translation errors
    #[error("Path {path} is out of bounds of project root {project_root}")]
    OutOfProject { path: String, project_root: String },

    #[error("Invalid {kind} scope: {reason}")]
    InvalidScope { kind: TestKind, reason: String },

    // Standard errors with From implementations
    #[error("IO error: {0}")]
    IO(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Logger already initialized: {0}")]
    Logger(#[from] log::SetLoggerError),

    // Configuration errors
    #[error("Configuration file not found: {0}")]
    ConfigNotFound(PathBuf),
}

impl ProducerError {
    /// Whether the error means "this request is not ours to handle" rather
    /// than a real failure.
    #[must_use]
    pub fn is_out_of_project(&self) -> bool {
        matches!(self, Self::OutOfProject { .. })
    }
}
