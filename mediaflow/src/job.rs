//! Encoding job definitions.
//!
//! A job is one execution of a transform against an input asset. The
//! orchestrator only ever reads jobs back from the service; after
//! submission the remote encoder owns every state transition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a job or of a single job output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    /// Accepted, waiting for capacity.
    Queued,
    /// Assigned to an encoding unit, not yet running.
    Scheduled,
    /// Actively encoding.
    Processing,
    /// Completed successfully.
    Finished,
    /// Failed; see per-output diagnostics.
    Error,
    /// Cancelled by an operator or the service.
    Canceled,
}

impl JobState {
    /// Check whether no further transitions can occur.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Finished | JobState::Error | JobState::Canceled)
    }

    /// Check whether the job is still making progress.
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobState::Queued => write!(f, "Queued"),
            JobState::Scheduled => write!(f, "Scheduled"),
            JobState::Processing => write!(f, "Processing"),
            JobState::Finished => write!(f, "Finished"),
            JobState::Error => write!(f, "Error"),
            JobState::Canceled => write!(f, "Canceled"),
        }
    }
}

/// Reference to the asset a job reads from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobInput {
    /// Name of the input asset.
    pub asset_name: String,
}

impl JobInput {
    /// Reference an input asset by name.
    pub fn asset(name: impl Into<String>) -> Self {
        Self { asset_name: name.into() }
    }
}

/// One output of a job, bound to an output asset.
///
/// Each output carries its own state and, while Processing, an integer
/// progress percentage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobOutput {
    /// Name of the asset the encoded result lands in.
    pub asset_name: String,
    /// Output-level state; may run ahead of or behind the job state.
    pub state: JobState,
    /// Progress percentage (0-100), meaningful while Processing.
    #[serde(default)]
    pub progress: u8,
    /// Failure detail reported by the encoder, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobOutput {
    /// Build the output reference used when submitting a job.
    pub fn for_asset(name: impl Into<String>) -> Self {
        Self {
            asset_name: name.into(),
            state: JobState::Queued,
            progress: 0,
            error: None,
        }
    }

    /// One-line diagnostic for error reporting.
    pub fn describe(&self, index: usize) -> String {
        let detail = self
            .error
            .as_deref()
            .map(|e| format!(": {e}"))
            .unwrap_or_default();
        format!(
            "output[{index}] asset={} state={}{detail}",
            self.asset_name, self.state
        )
    }
}

/// An encoding job as reported by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    /// Job name, unique within its transform.
    pub name: String,
    /// Overall job state.
    pub state: JobState,
    /// The single input reference.
    pub input: JobInput,
    /// Ordered output references.
    pub outputs: Vec<JobOutput>,
    /// Creation timestamp assigned by the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
}
