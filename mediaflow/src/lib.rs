//! Job orchestration for a cloud media-encoding account.
//!
//! This crate sequences one encoding run against a remote media service:
//! upload a source file into an input asset, create an output asset,
//! ensure an encoding transform exists, submit a job, poll it to a
//! terminal state, then publish a streaming locator and resolve playback
//! URLs. The heavy lifting (encoding, storage, token issuance, streaming)
//! happens in the remote services; this crate owns the sequencing, the
//! idempotent-creation rules, and the polling protocol.
//!
//! # Features
//!
//! - **Run-scoped naming**: every resource name derives from one token,
//!   so concurrent runs never collide
//! - **Idempotent creation**: create-or-update for input asset and
//!   transform, create-if-absent for the job, configurable collision
//!   policy for the output asset
//! - **Bounded polling**: fixed-interval poll loop with a wait ceiling
//!   and a cancellation token
//! - **Injected collaborators**: the API client, uploader, and clock are
//!   trait objects, so tests run without a real account
//!
//! # Example
//!
//! ```ignore
//! use mediaflow::{
//!     ClientCredentials, EncodingPreset, JobOrchestrator, RestMediaClient, RunNames, Settings,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = Settings::load(None)?;
//!
//!     let credentials = Arc::new(ClientCredentials::new(
//!         &settings.token_endpoint,
//!         &settings.tenant_id,
//!         &settings.client_id,
//!         &settings.client_secret,
//!         settings.audience(),
//!     )?);
//!     let api = Arc::new(RestMediaClient::new(settings.api_url()?, credentials)?);
//!
//!     let orchestrator = JobOrchestrator::builder()
//!         .api(api)
//!         .scope(settings.account_scope())
//!         .build()?;
//!
//!     let names = RunNames::generate(&settings.asset_name);
//!     let outcome = orchestrator
//!         .run(
//!             &settings.file_to_upload,
//!             &names,
//!             &settings.transform_name,
//!             EncodingPreset::AdaptiveStreaming,
//!         )
//!         .await?;
//!
//!     for url in &outcome.playback_urls {
//!         println!("{url}");
//!     }
//!     Ok(())
//! }
//! ```

mod auth;
mod client;
mod config;
mod error;
mod job;
mod naming;
mod orchestrator;
mod poll;
mod resource;
mod storage;

pub use auth::{ClientCredentials, StaticToken, TokenProvider};
pub use client::{MediaApi, RestMediaClient};
pub use config::{Settings, DEFAULT_SETTINGS_FILE};
pub use error::{OrchestratorError, Result};
pub use job::{Job, JobInput, JobOutput, JobState};
pub use naming::RunNames;
pub use orchestrator::{
    CollisionPolicy, JobOrchestrator, JobOrchestratorBuilder, RunOutcome,
    DEFAULT_STREAMING_ENDPOINT,
};
pub use poll::{Clock, PollOptions, TokioClock};
pub use resource::{
    AccountScope, Asset, AssetContainerSas, ContainerPermissions, ContainerSasRequest,
    EncodingPreset, EndpointResourceState, StreamingEndpoint, StreamingLocator, StreamingPath,
    StreamingPolicy, Transform, TransformOutput,
};
pub use storage::{BlobUploader, SignedUrlUploader};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
