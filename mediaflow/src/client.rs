//! Management API boundary.
//!
//! The orchestrator never talks to the wire directly; it goes through
//! [`MediaApi`], which models the service as resource CRUD plus a few
//! actions. [`RestMediaClient`] is the HTTP implementation; tests
//! substitute their own.

use crate::auth::TokenProvider;
use crate::error::{OrchestratorError, Result};
use crate::job::{Job, JobInput, JobOutput};
use crate::resource::{
    AccountScope, Asset, AssetContainerSas, ContainerSasRequest, StreamingEndpoint,
    StreamingLocator, StreamingPath, Transform, TransformOutput,
};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use url::Url;

/// Wire contract version pinned by this client.
const API_VERSION: &str = "2023-01-01";

/// Remote resource CRUD exposed by the media account's management API.
///
/// Lookups return `None` for absent resources; deletes are idempotent and
/// succeed when the resource is already gone.
#[async_trait]
pub trait MediaApi: Send + Sync {
    async fn create_or_update_asset(&self, scope: &AccountScope, name: &str) -> Result<Asset>;

    async fn get_asset(&self, scope: &AccountScope, name: &str) -> Result<Option<Asset>>;

    async fn delete_asset(&self, scope: &AccountScope, name: &str) -> Result<()>;

    /// Issue short-lived signed upload URLs for an asset's container.
    async fn list_container_sas(
        &self,
        scope: &AccountScope,
        asset_name: &str,
        request: &ContainerSasRequest,
    ) -> Result<AssetContainerSas>;

    async fn get_transform(&self, scope: &AccountScope, name: &str) -> Result<Option<Transform>>;

    async fn create_or_update_transform(
        &self,
        scope: &AccountScope,
        name: &str,
        outputs: &[TransformOutput],
    ) -> Result<Transform>;

    async fn get_job(
        &self,
        scope: &AccountScope,
        transform_name: &str,
        name: &str,
    ) -> Result<Option<Job>>;

    async fn create_job(
        &self,
        scope: &AccountScope,
        transform_name: &str,
        name: &str,
        input: JobInput,
        outputs: Vec<JobOutput>,
    ) -> Result<Job>;

    async fn delete_job(
        &self,
        scope: &AccountScope,
        transform_name: &str,
        name: &str,
    ) -> Result<()>;

    async fn create_streaming_locator(
        &self,
        scope: &AccountScope,
        locator: &StreamingLocator,
    ) -> Result<StreamingLocator>;

    /// Relative playback paths published by a locator.
    async fn list_streaming_paths(
        &self,
        scope: &AccountScope,
        locator_name: &str,
    ) -> Result<Vec<StreamingPath>>;

    async fn get_streaming_endpoint(
        &self,
        scope: &AccountScope,
        name: &str,
    ) -> Result<Option<StreamingEndpoint>>;

    /// Begin starting a stopped endpoint. Completion is observed by
    /// polling [`MediaApi::get_streaming_endpoint`].
    async fn start_streaming_endpoint(&self, scope: &AccountScope, name: &str) -> Result<()>;

    async fn delete_content_key_policy(&self, scope: &AccountScope, name: &str) -> Result<()>;
}

/// HTTP client for the management API, bearer-authenticated per request.
pub struct RestMediaClient {
    http: reqwest::Client,
    endpoint: Url,
    token: Arc<dyn TokenProvider>,
}

impl RestMediaClient {
    /// Create a client for one management API endpoint.
    pub fn new(endpoint: Url, token: Arc<dyn TokenProvider>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()?;
        Ok(Self { http, endpoint, token })
    }

    /// Build a resource URL under the account scope.
    fn resource_url(&self, scope: &AccountScope, segments: &[&str]) -> Result<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| OrchestratorError::Config("API endpoint cannot be a base URL".into()))?
            .pop_if_empty()
            .extend([
                "subscriptions",
                scope.subscription_id.as_str(),
                "resourceGroups",
                scope.resource_group.as_str(),
                "mediaServices",
                scope.account_name.as_str(),
            ])
            .extend(segments.iter().copied());
        url.query_pairs_mut().append_pair("api-version", API_VERSION);
        Ok(url)
    }

    async fn authed(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let token = self.token.bearer_token().await?;
        Ok(builder.bearer_auth(token).send().await?)
    }

    async fn api_error(response: reqwest::Response) -> OrchestratorError {
        let status = response.status();
        let message = response.text().await.unwrap_or_default();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            OrchestratorError::Auth(format!(
                "management API rejected the credential ({status}): {message}"
            ))
        } else {
            OrchestratorError::Api { status: status.as_u16(), message }
        }
    }

    async fn get_optional<T: DeserializeOwned>(&self, url: Url) -> Result<Option<T>> {
        let response = self.authed(self.http.get(url)).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.json().await?)),
            _ => Err(Self::api_error(response).await),
        }
    }

    async fn put_json<B, T>(&self, url: Url, body: &B) -> Result<T>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.authed(self.http.put(url).json(body)).await?;
        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(Self::api_error(response).await)
        }
    }

    async fn post_json<B, T>(&self, url: Url, body: &B) -> Result<T>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.authed(self.http.post(url).json(body)).await?;
        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(Self::api_error(response).await)
        }
    }

    async fn post_action(&self, url: Url) -> Result<()> {
        let response = self.authed(self.http.post(url)).await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::api_error(response).await)
        }
    }

    /// DELETE with absent-resource tolerance.
    async fn delete(&self, url: Url) -> Result<()> {
        let response = self.authed(self.http.delete(url)).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(()),
            status if status.is_success() => Ok(()),
            _ => Err(Self::api_error(response).await),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListPathsResponse {
    streaming_paths: Vec<StreamingPath>,
}

#[async_trait]
impl MediaApi for RestMediaClient {
    async fn create_or_update_asset(&self, scope: &AccountScope, name: &str) -> Result<Asset> {
        let url = self.resource_url(scope, &["assets", name])?;
        self.put_json(url, &serde_json::json!({})).await
    }

    async fn get_asset(&self, scope: &AccountScope, name: &str) -> Result<Option<Asset>> {
        let url = self.resource_url(scope, &["assets", name])?;
        self.get_optional(url).await
    }

    async fn delete_asset(&self, scope: &AccountScope, name: &str) -> Result<()> {
        let url = self.resource_url(scope, &["assets", name])?;
        self.delete(url).await
    }

    async fn list_container_sas(
        &self,
        scope: &AccountScope,
        asset_name: &str,
        request: &ContainerSasRequest,
    ) -> Result<AssetContainerSas> {
        let url = self.resource_url(scope, &["assets", asset_name, "listContainerSas"])?;
        self.post_json(url, request).await
    }

    async fn get_transform(&self, scope: &AccountScope, name: &str) -> Result<Option<Transform>> {
        let url = self.resource_url(scope, &["transforms", name])?;
        self.get_optional(url).await
    }

    async fn create_or_update_transform(
        &self,
        scope: &AccountScope,
        name: &str,
        outputs: &[TransformOutput],
    ) -> Result<Transform> {
        let url = self.resource_url(scope, &["transforms", name])?;
        self.put_json(url, &serde_json::json!({ "outputs": outputs })).await
    }

    async fn get_job(
        &self,
        scope: &AccountScope,
        transform_name: &str,
        name: &str,
    ) -> Result<Option<Job>> {
        let url = self.resource_url(scope, &["transforms", transform_name, "jobs", name])?;
        self.get_optional(url).await
    }

    async fn create_job(
        &self,
        scope: &AccountScope,
        transform_name: &str,
        name: &str,
        input: JobInput,
        outputs: Vec<JobOutput>,
    ) -> Result<Job> {
        let url = self.resource_url(scope, &["transforms", transform_name, "jobs", name])?;
        self.put_json(url, &serde_json::json!({ "input": input, "outputs": outputs }))
            .await
    }

    async fn delete_job(
        &self,
        scope: &AccountScope,
        transform_name: &str,
        name: &str,
    ) -> Result<()> {
        let url = self.resource_url(scope, &["transforms", transform_name, "jobs", name])?;
        self.delete(url).await
    }

    async fn create_streaming_locator(
        &self,
        scope: &AccountScope,
        locator: &StreamingLocator,
    ) -> Result<StreamingLocator> {
        let url = self.resource_url(scope, &["streamingLocators", &locator.name])?;
        self.put_json(url, locator).await
    }

    async fn list_streaming_paths(
        &self,
        scope: &AccountScope,
        locator_name: &str,
    ) -> Result<Vec<StreamingPath>> {
        let url = self.resource_url(scope, &["streamingLocators", locator_name, "listPaths"])?;
        let response: ListPathsResponse = self.post_json(url, &serde_json::json!({})).await?;
        Ok(response.streaming_paths)
    }

    async fn get_streaming_endpoint(
        &self,
        scope: &AccountScope,
        name: &str,
    ) -> Result<Option<StreamingEndpoint>> {
        let url = self.resource_url(scope, &["streamingEndpoints", name])?;
        self.get_optional(url).await
    }

    async fn start_streaming_endpoint(&self, scope: &AccountScope, name: &str) -> Result<()> {
        let url = self.resource_url(scope, &["streamingEndpoints", name, "start"])?;
        self.post_action(url).await
    }

    async fn delete_content_key_policy(&self, scope: &AccountScope, name: &str) -> Result<()> {
        let url = self.resource_url(scope, &["contentKeyPolicies", name])?;
        self.delete(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticToken;

    fn client() -> RestMediaClient {
        RestMediaClient::new(
            Url::parse("https://api.example.com").unwrap(),
            Arc::new(StaticToken("t".into())),
        )
        .unwrap()
    }

    fn scope() -> AccountScope {
        AccountScope::new("sub-1", "rg-1", "acct-1")
    }

    #[test]
    fn test_asset_url() {
        let url = client().resource_url(&scope(), &["assets", "input-abc"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example.com/subscriptions/sub-1/resourceGroups/rg-1/mediaServices/acct-1/assets/input-abc?api-version=2023-01-01"
        );
    }

    #[test]
    fn test_nested_job_url() {
        let url = client()
            .resource_url(&scope(), &["transforms", "t1", "jobs", "job-abc"])
            .unwrap();
        assert!(url.path().ends_with("/mediaServices/acct-1/transforms/t1/jobs/job-abc"));
        assert_eq!(url.query(), Some("api-version=2023-01-01"));
    }

    #[test]
    fn test_endpoint_with_trailing_slash() {
        let client = RestMediaClient::new(
            Url::parse("https://api.example.com/").unwrap(),
            Arc::new(StaticToken("t".into())),
        )
        .unwrap();
        let url = client.resource_url(&scope(), &["assets", "a"]).unwrap();
        assert!(!url.path().contains("//"));
    }

    #[test]
    fn test_list_paths_response_parsing() {
        let json = r#"{"streamingPaths":[{"streamingProtocol":"Hls","paths":["/a/b.m3u8"]}]}"#;
        let parsed: ListPathsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.streaming_paths[0].paths[0], "/a/b.m3u8");
    }
}
