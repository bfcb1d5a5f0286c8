//! The job orchestrator.
//!
//! Sequences one encoding run against a media account: create the input
//! asset and upload the source, create the output asset, ensure the
//! transform exists, submit the job, poll it to a terminal state, then
//! publish a streaming locator and resolve playback URLs.
//!
//! Every remote resource the run creates is named from one run-scoped
//! token ([`crate::naming::RunNames`]), so concurrent runs never collide.
//! Resource creation is idempotent: input asset and transform are
//! create-or-update, the job is create-if-absent, and the output asset is
//! create-if-absent with a configurable collision policy.

use crate::client::MediaApi;
use crate::error::{OrchestratorError, Result};
use crate::job::{Job, JobInput, JobOutput, JobState};
use crate::naming::{self, RunNames};
use crate::poll::{Clock, PollOptions, TokioClock};
use crate::resource::{
    AccountScope, Asset, ContainerPermissions, ContainerSasRequest, EncodingPreset,
    StreamingEndpoint, StreamingLocator, StreamingPolicy, Transform, TransformOutput,
};
use crate::storage::{BlobUploader, SignedUrlUploader};
use chrono::{Duration as ChronoDuration, Utc};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Every account has one streaming endpoint with this name.
pub const DEFAULT_STREAMING_ENDPOINT: &str = "default";

/// Lifetime requested for signed upload URLs.
const SAS_EXPIRY_HOURS: i64 = 4;

/// What to do when the requested output asset name is already taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollisionPolicy {
    /// Create under `{name}-{suffix}` instead and log a warning. The
    /// caller must use the returned asset's name, not the requested one.
    #[default]
    Rename,
    /// Surface the collision as an error.
    Fail,
}

/// Result of a completed end-to-end run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Input asset holding the uploaded source.
    pub input_asset: String,
    /// Output asset the encoded renditions landed in (post-rename name).
    pub output_asset: String,
    /// Final job snapshot.
    pub job: Job,
    /// Streaming locator publishing the output asset.
    pub locator: String,
    /// Absolute playback URLs on the streaming endpoint.
    pub playback_urls: Vec<Url>,
}

/// Sequences and supervises one encoding run.
pub struct JobOrchestrator {
    api: Arc<dyn MediaApi>,
    uploader: Arc<dyn BlobUploader>,
    clock: Arc<dyn Clock>,
    scope: AccountScope,
    collision_policy: CollisionPolicy,
    poll: PollOptions,
}

impl std::fmt::Debug for JobOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobOrchestrator")
            .field("scope", &self.scope)
            .field("collision_policy", &self.collision_policy)
            .field("poll", &self.poll)
            .finish_non_exhaustive()
    }
}

impl JobOrchestrator {
    /// Create an orchestrator builder.
    pub fn builder() -> JobOrchestratorBuilder {
        JobOrchestratorBuilder::default()
    }

    /// Create-or-update the input asset and upload the source file into
    /// its container through a signed URL.
    pub async fn create_input_asset(&self, name: &str, file: &Path) -> Result<Asset> {
        let asset = self.api.create_or_update_asset(&self.scope, name).await?;

        let request = ContainerSasRequest {
            permissions: ContainerPermissions::ReadWrite,
            expiry_time: Utc::now() + ChronoDuration::hours(SAS_EXPIRY_HOURS),
        };
        let sas = self
            .api
            .list_container_sas(&self.scope, &asset.name, &request)
            .await?;
        let upload_url = sas
            .asset_container_sas_urls
            .first()
            .ok_or_else(|| OrchestratorError::Upload("service returned no upload URLs".into()))?;
        let upload_url = Url::parse(upload_url)?;

        tracing::info!(asset = %asset.name, file = %file.display(), "uploading source file");
        self.uploader.upload_file(&upload_url, file).await?;

        Ok(asset)
    }

    /// Create the output asset, applying the collision policy if the name
    /// is already taken. An existing asset is never overwritten.
    pub async fn create_output_asset(&self, name: &str) -> Result<Asset> {
        if self.api.get_asset(&self.scope, name).await?.is_none() {
            return self.api.create_or_update_asset(&self.scope, name).await;
        }

        match self.collision_policy {
            CollisionPolicy::Fail => Err(OrchestratorError::NameInUse(name.to_string())),
            CollisionPolicy::Rename => {
                let renamed = format!("{name}-{}", naming::unique_suffix());
                tracing::warn!(
                    requested = name,
                    using = %renamed,
                    "output asset name already in use, creating under a new name"
                );
                self.api.create_or_update_asset(&self.scope, &renamed).await
            }
        }
    }

    /// Get-or-create the transform. An existing transform is trusted to
    /// encode compatibly; its preset is not reconciled.
    pub async fn ensure_transform(&self, name: &str, preset: EncodingPreset) -> Result<Transform> {
        if let Some(existing) = self.api.get_transform(&self.scope, name).await? {
            tracing::debug!(transform = name, "transform already exists");
            return Ok(existing);
        }

        tracing::info!(transform = name, ?preset, "creating transform");
        let outputs = [TransformOutput { preset }];
        self.api
            .create_or_update_transform(&self.scope, name, &outputs)
            .await
    }

    /// Submit the job if no job with this name exists yet. A submitted
    /// job's definition is never mutated afterwards.
    pub async fn submit_job(
        &self,
        transform_name: &str,
        job_name: &str,
        input_asset: &str,
        output_asset: &str,
    ) -> Result<Job> {
        if let Some(existing) = self.api.get_job(&self.scope, transform_name, job_name).await? {
            tracing::info!(job = job_name, state = %existing.state, "job already submitted");
            return Ok(existing);
        }

        tracing::info!(job = job_name, transform = transform_name, "submitting job");
        self.api
            .create_job(
                &self.scope,
                transform_name,
                job_name,
                JobInput::asset(input_asset),
                vec![JobOutput::for_asset(output_asset)],
            )
            .await
    }

    /// Poll the job until it reaches a terminal state and return the final
    /// snapshot. Progress is reported at every tick; the loop suspends for
    /// one fixed interval between polls and never busy-spins.
    pub async fn wait_for_job(&self, transform_name: &str, job_name: &str) -> Result<Job> {
        let mut waited = Duration::ZERO;
        loop {
            let job = self
                .api
                .get_job(&self.scope, transform_name, job_name)
                .await?
                .ok_or_else(|| OrchestratorError::NotFound {
                    kind: "job",
                    name: job_name.to_string(),
                })?;

            tracing::info!(job = %job.name, state = %job.state, "job state");
            for (index, output) in job.outputs.iter().enumerate() {
                if output.state == JobState::Processing {
                    tracing::info!(
                        output = index,
                        state = %output.state,
                        progress = output.progress,
                        "job output"
                    );
                } else {
                    tracing::info!(output = index, state = %output.state, "job output");
                }
            }

            if job.state.is_terminal() {
                return Ok(job);
            }
            self.pause(&mut waited).await?;
        }
    }

    /// Suspend for one poll interval, honoring the wait bound and the
    /// cancellation token.
    async fn pause(&self, waited: &mut Duration) -> Result<()> {
        if let Some(max_wait) = self.poll.max_wait {
            if *waited >= max_wait {
                return Err(OrchestratorError::DeadlineExceeded { waited: *waited });
            }
        }
        tokio::select! {
            biased;
            _ = self.poll.cancel.cancelled() => Err(OrchestratorError::Cancelled),
            _ = self.clock.sleep(self.poll.interval) => {
                *waited += self.poll.interval;
                Ok(())
            }
        }
    }

    /// Publish the output asset: create a clear-streaming locator, make
    /// sure the default endpoint is running, and resolve playback URLs.
    pub async fn publish(&self, output_asset: &str, locator_name: &str) -> Result<Vec<Url>> {
        let locator = StreamingLocator {
            name: locator_name.to_string(),
            asset_name: output_asset.to_string(),
            streaming_policy_name: StreamingPolicy::ClearStreamingOnly,
        };
        let locator = self.api.create_streaming_locator(&self.scope, &locator).await?;
        tracing::info!(locator = %locator.name, asset = output_asset, "streaming locator created");

        let endpoint = self.ensure_endpoint_running(DEFAULT_STREAMING_ENDPOINT).await?;

        let paths = self.api.list_streaming_paths(&self.scope, &locator.name).await?;
        let mut urls = Vec::new();
        for path_group in &paths {
            if let Some(path) = path_group.paths.first() {
                urls.push(Url::parse(&format!("https://{}{path}", endpoint.host_name))?);
            }
        }
        Ok(urls)
    }

    /// Fetch the endpoint and, if it is not serving, start it and poll
    /// until it is Running. The host name is unusable before that.
    async fn ensure_endpoint_running(&self, name: &str) -> Result<StreamingEndpoint> {
        let endpoint = self.get_endpoint(name).await?;
        if endpoint.resource_state.is_running() {
            return Ok(endpoint);
        }

        tracing::info!(endpoint = name, state = %endpoint.resource_state, "starting streaming endpoint");
        self.api.start_streaming_endpoint(&self.scope, name).await?;

        let mut waited = Duration::ZERO;
        loop {
            let endpoint = self.get_endpoint(name).await?;
            if endpoint.resource_state.is_running() {
                return Ok(endpoint);
            }
            tracing::debug!(endpoint = name, state = %endpoint.resource_state, "waiting for endpoint");
            self.pause(&mut waited).await.map_err(|e| match e {
                OrchestratorError::DeadlineExceeded { waited } => OrchestratorError::EndpointNotReady(
                    format!("endpoint {name} still not running after {waited:?}"),
                ),
                other => other,
            })?;
        }
    }

    async fn get_endpoint(&self, name: &str) -> Result<StreamingEndpoint> {
        self.api
            .get_streaming_endpoint(&self.scope, name)
            .await?
            .ok_or_else(|| OrchestratorError::NotFound {
                kind: "streaming endpoint",
                name: name.to_string(),
            })
    }

    /// The end-to-end flow: upload, encode, publish. Returns the playback
    /// URLs; a job ending Error or Canceled becomes [`OrchestratorError::JobFailed`]
    /// carrying per-output diagnostics.
    pub async fn run(
        &self,
        file: &Path,
        names: &RunNames,
        transform_name: &str,
        preset: EncodingPreset,
    ) -> Result<RunOutcome> {
        let input = self.create_input_asset(&names.input_asset, file).await?;
        let output = self.create_output_asset(&names.output_asset).await?;
        self.ensure_transform(transform_name, preset).await?;
        self.submit_job(transform_name, &names.job, &input.name, &output.name)
            .await?;

        let job = self.wait_for_job(transform_name, &names.job).await?;
        if job.state != JobState::Finished {
            return Err(OrchestratorError::JobFailed {
                state: job.state,
                outputs: job
                    .outputs
                    .iter()
                    .enumerate()
                    .map(|(i, o)| o.describe(i))
                    .collect(),
            });
        }
        tracing::info!(job = %job.name, "job finished");

        let playback_urls = self.publish(&output.name, &names.locator).await?;
        Ok(RunOutcome {
            input_asset: input.name,
            output_asset: output.name,
            job,
            locator: names.locator.clone(),
            playback_urls,
        })
    }

    /// Idempotent teardown: job first, then assets, then the optional
    /// content key policy. Absent resources do not error.
    pub async fn cleanup(
        &self,
        transform_name: &str,
        job_name: &str,
        asset_names: &[String],
        content_key_policy: Option<&str>,
    ) -> Result<()> {
        self.api.delete_job(&self.scope, transform_name, job_name).await?;
        for asset in asset_names {
            self.api.delete_asset(&self.scope, asset).await?;
        }
        if let Some(policy) = content_key_policy {
            self.api.delete_content_key_policy(&self.scope, policy).await?;
        }
        tracing::info!(job = job_name, assets = asset_names.len(), "cleanup complete");
        Ok(())
    }
}

/// Builder for [`JobOrchestrator`].
#[derive(Default)]
pub struct JobOrchestratorBuilder {
    api: Option<Arc<dyn MediaApi>>,
    uploader: Option<Arc<dyn BlobUploader>>,
    clock: Option<Arc<dyn Clock>>,
    scope: Option<AccountScope>,
    collision_policy: CollisionPolicy,
    poll: PollOptions,
}

impl JobOrchestratorBuilder {
    /// Set the management API client.
    pub fn api(mut self, api: Arc<dyn MediaApi>) -> Self {
        self.api = Some(api);
        self
    }

    /// Set the blob uploader.
    pub fn uploader(mut self, uploader: Arc<dyn BlobUploader>) -> Self {
        self.uploader = Some(uploader);
        self
    }

    /// Set the clock used for poll suspensions.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Set the account scope.
    pub fn scope(mut self, scope: AccountScope) -> Self {
        self.scope = Some(scope);
        self
    }

    /// Set the output-asset collision policy.
    pub fn collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.collision_policy = policy;
        self
    }

    /// Set the poll parameters.
    pub fn poll(mut self, poll: PollOptions) -> Self {
        self.poll = poll;
        self
    }

    /// Build the orchestrator.
    pub fn build(self) -> Result<JobOrchestrator> {
        let api = self
            .api
            .ok_or_else(|| OrchestratorError::Config("a MediaApi client is required".into()))?;
        let scope = self
            .scope
            .ok_or_else(|| OrchestratorError::Config("an account scope is required".into()))?;
        let uploader = match self.uploader {
            Some(uploader) => uploader,
            None => Arc::new(SignedUrlUploader::new()?),
        };
        let clock = self.clock.unwrap_or_else(|| Arc::new(TokioClock));

        Ok(JobOrchestrator {
            api,
            uploader,
            clock,
            scope,
            collision_policy: self.collision_policy,
            poll: self.poll,
        })
    }
}
