//! Error types for orchestration runs.

use crate::job::JobState;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// The identity provider rejected the service principal. Fatal, never
    /// retried by the orchestrator.
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    /// A resource with the requested name already exists and the collision
    /// policy forbids renaming.
    #[error("Name already in use: {0}")]
    NameInUse(String),

    #[error("Upload failed: {0}")]
    Upload(String),

    /// The encoding job reached a terminal state other than Finished.
    /// Carries the last observed state and per-output diagnostics.
    #[error("Job ended in state {state}: {outputs:?}")]
    JobFailed { state: JobState, outputs: Vec<String> },

    #[error("Streaming endpoint not ready: {0}")]
    EndpointNotReady(String),

    #[error("Gave up after waiting {waited:?} for a terminal state")]
    DeadlineExceeded { waited: Duration },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;
