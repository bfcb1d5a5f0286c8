//! Remote resource definitions for a media account.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity every management API call is scoped to.
///
/// Passed explicitly to each operation so independent runs (and tests)
/// never share hidden client state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountScope {
    /// Subscription the account is billed under.
    pub subscription_id: String,
    /// Resource group containing the account.
    pub resource_group: String,
    /// Media account name.
    pub account_name: String,
}

impl AccountScope {
    /// Create a new account scope.
    pub fn new(
        subscription_id: impl Into<String>,
        resource_group: impl Into<String>,
        account_name: impl Into<String>,
    ) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resource_group: resource_group.into(),
            account_name: account_name.into(),
        }
    }
}

/// A named storage container holding source or encoded media.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    /// Asset name, unique within the account.
    pub name: String,
    /// Backing storage container, assigned by the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
}

/// A reusable encoding recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transform {
    /// Transform name, unique within the account.
    pub name: String,
    /// Output descriptors; one encoded result per entry.
    pub outputs: Vec<TransformOutput>,
}

/// One output a transform produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformOutput {
    /// Encoding recipe for this output.
    pub preset: EncodingPreset,
}

/// Built-in encoding presets offered by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncodingPreset {
    /// Bitrate ladder sized to the input, packaged for streaming.
    AdaptiveStreaming,
    /// Content-analysis driven ladder.
    ContentAwareEncoding,
    /// Single 720p H.264 rendition.
    H264SingleBitrate720p,
}

/// Predefined streaming policies a locator can bind an asset to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamingPolicy {
    /// Unencrypted streaming.
    ClearStreamingOnly,
    /// AES clear-key envelope encryption.
    ClearKey,
    /// Unencrypted streaming plus direct download.
    DownloadAndClearStreaming,
}

/// Publishable binding of an asset to a streaming policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamingLocator {
    /// Locator name, unique within the account.
    pub name: String,
    /// Asset the locator exposes.
    pub asset_name: String,
    /// Policy governing playback.
    pub streaming_policy_name: StreamingPolicy,
}

/// One group of playback paths exposed by a locator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamingPath {
    /// Protocol the paths serve ("Hls", "Dash", "SmoothStreaming").
    pub streaming_protocol: String,
    /// Relative playback paths on the streaming endpoint.
    pub paths: Vec<String>,
}

/// Serving state of a streaming endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndpointResourceState {
    Stopped,
    Starting,
    Running,
    Stopping,
    Scaling,
    Deleting,
}

impl EndpointResourceState {
    /// The only state in which the endpoint's host name serves traffic.
    pub fn is_running(&self) -> bool {
        matches!(self, EndpointResourceState::Running)
    }
}

impl std::fmt::Display for EndpointResourceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EndpointResourceState::Stopped => "Stopped",
            EndpointResourceState::Starting => "Starting",
            EndpointResourceState::Running => "Running",
            EndpointResourceState::Stopping => "Stopping",
            EndpointResourceState::Scaling => "Scaling",
            EndpointResourceState::Deleting => "Deleting",
        };
        write!(f, "{s}")
    }
}

/// A named serving node for published locators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamingEndpoint {
    /// Endpoint name; every account has one named "default".
    pub name: String,
    /// Public host name; only usable while Running.
    pub host_name: String,
    /// Current serving state.
    pub resource_state: EndpointResourceState,
}

/// Permissions requested on a signed container URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContainerPermissions {
    Read,
    ReadWrite,
    ReadWriteDelete,
}

/// Request body for a signed upload URL on an asset's container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerSasRequest {
    /// Access the URL grants.
    pub permissions: ContainerPermissions,
    /// Instant after which the URL stops working. Kept a bounded few
    /// hours in the future to limit exposure.
    pub expiry_time: DateTime<Utc>,
}

/// Signed upload URLs returned for an asset's container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetContainerSas {
    /// One or more equivalent signed container URLs.
    pub asset_container_sas_urls: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_wire_names() {
        assert_eq!(
            serde_json::to_string(&EncodingPreset::AdaptiveStreaming).unwrap(),
            "\"AdaptiveStreaming\""
        );
        assert_eq!(
            serde_json::to_string(&StreamingPolicy::ClearStreamingOnly).unwrap(),
            "\"ClearStreamingOnly\""
        );
    }

    #[test]
    fn test_endpoint_running() {
        assert!(EndpointResourceState::Running.is_running());
        assert!(!EndpointResourceState::Starting.is_running());
        assert!(!EndpointResourceState::Stopped.is_running());
    }

    #[test]
    fn test_locator_serialization() {
        let locator = StreamingLocator {
            name: "locator-1".into(),
            asset_name: "out".into(),
            streaming_policy_name: StreamingPolicy::ClearStreamingOnly,
        };
        let json = serde_json::to_string(&locator).unwrap();
        assert!(json.contains("\"assetName\":\"out\""));
        assert!(json.contains("\"streamingPolicyName\":\"ClearStreamingOnly\""));
    }

    #[test]
    fn test_sas_response_parsing() {
        let json = r#"{"assetContainerSasUrls":["https://store.example.com/c?sig=x"]}"#;
        let sas: AssetContainerSas = serde_json::from_str(json).unwrap();
        assert_eq!(sas.asset_container_sas_urls.len(), 1);
    }
}
