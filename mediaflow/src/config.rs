//! Process configuration.
//!
//! Settings come from an optional JSON file overlaid by `MEDIAFLOW_*`
//! environment variables (env wins). `.env` loading is the binary's
//! responsibility, before calling [`Settings::load`].

use crate::error::{OrchestratorError, Result};
use crate::resource::AccountScope;
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use url::Url;

/// File consulted when no explicit path is given.
pub const DEFAULT_SETTINGS_FILE: &str = "settings.json";

const DEFAULT_TRANSFORM_NAME: &str = "AdaptiveStreaming";
const DEFAULT_ASSET_NAME: &str = "encoded";

/// Resolved process configuration.
#[derive(Clone)]
pub struct Settings {
    /// Subscription the media account lives under.
    pub subscription_id: String,
    /// Resource group containing the account.
    pub resource_group: String,
    /// Media account name.
    pub account_name: String,
    /// Identity provider tenant.
    pub tenant_id: String,
    /// Service principal client id.
    pub client_id: String,
    /// Service principal secret.
    pub client_secret: String,
    /// Identity provider base URL.
    pub token_endpoint: String,
    /// Management API base URL.
    pub api_endpoint: String,
    /// Audience requested for the bearer token; defaults to the API
    /// endpoint when unset.
    pub token_audience: Option<String>,
    /// Account region; informational.
    pub location: Option<String>,
    /// Local source file to upload.
    pub file_to_upload: PathBuf,
    /// Base name for the output asset.
    pub asset_name: String,
    /// Stable transform name, so reruns reuse the same recipe.
    pub transform_name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawSettings {
    subscription_id: Option<String>,
    resource_group: Option<String>,
    account_name: Option<String>,
    tenant_id: Option<String>,
    client_id: Option<String>,
    client_secret: Option<String>,
    token_endpoint: Option<String>,
    api_endpoint: Option<String>,
    token_audience: Option<String>,
    location: Option<String>,
    file_to_upload: Option<String>,
    asset_name: Option<String>,
    transform_name: Option<String>,
}

impl Settings {
    /// Load settings from `path` (or `settings.json` if present), then
    /// apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut raw = match path {
            Some(p) => Self::read_file(p)?,
            None => {
                let default = Path::new(DEFAULT_SETTINGS_FILE);
                if default.exists() {
                    Self::read_file(default)?
                } else {
                    RawSettings::default()
                }
            }
        };

        overlay(&mut raw.subscription_id, "MEDIAFLOW_SUBSCRIPTION_ID");
        overlay(&mut raw.resource_group, "MEDIAFLOW_RESOURCE_GROUP");
        overlay(&mut raw.account_name, "MEDIAFLOW_ACCOUNT_NAME");
        overlay(&mut raw.tenant_id, "MEDIAFLOW_TENANT_ID");
        overlay(&mut raw.client_id, "MEDIAFLOW_CLIENT_ID");
        overlay(&mut raw.client_secret, "MEDIAFLOW_CLIENT_SECRET");
        overlay(&mut raw.token_endpoint, "MEDIAFLOW_TOKEN_ENDPOINT");
        overlay(&mut raw.api_endpoint, "MEDIAFLOW_API_ENDPOINT");
        overlay(&mut raw.token_audience, "MEDIAFLOW_TOKEN_AUDIENCE");
        overlay(&mut raw.location, "MEDIAFLOW_LOCATION");
        overlay(&mut raw.file_to_upload, "MEDIAFLOW_FILE_TO_UPLOAD");
        overlay(&mut raw.asset_name, "MEDIAFLOW_ASSET_NAME");
        overlay(&mut raw.transform_name, "MEDIAFLOW_TRANSFORM_NAME");

        Self::validate(raw)
    }

    fn read_file(path: &Path) -> Result<RawSettings> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            OrchestratorError::Config(format!("cannot read settings file {}: {e}", path.display()))
        })?;
        Self::parse(&contents)
    }

    fn parse(json: &str) -> Result<RawSettings> {
        serde_json::from_str(json)
            .map_err(|e| OrchestratorError::Config(format!("invalid settings file: {e}")))
    }

    fn validate(raw: RawSettings) -> Result<Self> {
        Ok(Self {
            subscription_id: require(raw.subscription_id, "subscriptionId")?,
            resource_group: require(raw.resource_group, "resourceGroup")?,
            account_name: require(raw.account_name, "accountName")?,
            tenant_id: require(raw.tenant_id, "tenantId")?,
            client_id: require(raw.client_id, "clientId")?,
            client_secret: require(raw.client_secret, "clientSecret")?,
            token_endpoint: require(raw.token_endpoint, "tokenEndpoint")?,
            api_endpoint: require(raw.api_endpoint, "apiEndpoint")?,
            token_audience: raw.token_audience.filter(|s| !s.is_empty()),
            location: raw.location.filter(|s| !s.is_empty()),
            file_to_upload: PathBuf::from(require(raw.file_to_upload, "fileToUpload")?),
            asset_name: raw
                .asset_name
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_ASSET_NAME.to_string()),
            transform_name: raw
                .transform_name
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_TRANSFORM_NAME.to_string()),
        })
    }

    /// Scope for management API calls.
    pub fn account_scope(&self) -> AccountScope {
        AccountScope::new(&self.subscription_id, &self.resource_group, &self.account_name)
    }

    /// Parsed management API endpoint.
    pub fn api_url(&self) -> Result<Url> {
        Ok(Url::parse(&self.api_endpoint)?)
    }

    /// Audience for the bearer token.
    pub fn audience(&self) -> &str {
        self.token_audience.as_deref().unwrap_or(&self.api_endpoint)
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("subscription_id", &self.subscription_id)
            .field("resource_group", &self.resource_group)
            .field("account_name", &self.account_name)
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("token_endpoint", &self.token_endpoint)
            .field("api_endpoint", &self.api_endpoint)
            .field("location", &self.location)
            .field("file_to_upload", &self.file_to_upload)
            .field("asset_name", &self.asset_name)
            .field("transform_name", &self.transform_name)
            .finish()
    }
}

fn overlay(slot: &mut Option<String>, var: &str) {
    if let Ok(value) = env::var(var) {
        if !value.is_empty() {
            *slot = Some(value);
        }
    }
}

fn require(value: Option<String>, field: &str) -> Result<String> {
    value
        .filter(|s| !s.is_empty())
        .ok_or_else(|| OrchestratorError::Config(format!("missing required setting `{field}`")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"{
        "subscriptionId": "sub-1",
        "resourceGroup": "rg-1",
        "accountName": "acct-1",
        "tenantId": "tenant-1",
        "clientId": "client-1",
        "clientSecret": "s3cret",
        "tokenEndpoint": "https://login.example.com",
        "apiEndpoint": "https://api.example.com",
        "fileToUpload": "video.mp4"
    }"#;

    #[test]
    fn test_parse_and_validate() {
        let raw = Settings::parse(FULL).unwrap();
        let settings = Settings::validate(raw).unwrap();
        assert_eq!(settings.account_name, "acct-1");
        assert_eq!(settings.file_to_upload, PathBuf::from("video.mp4"));
        assert_eq!(settings.transform_name, "AdaptiveStreaming");
        assert_eq!(settings.asset_name, "encoded");
        assert_eq!(settings.audience(), "https://api.example.com");
    }

    #[test]
    fn test_missing_field_is_named() {
        let raw = Settings::parse(r#"{"subscriptionId": "sub-1"}"#).unwrap();
        let err = Settings::validate(raw).unwrap_err();
        assert!(err.to_string().contains("resourceGroup"));
    }

    #[test]
    fn test_env_overrides_file() {
        env::set_var("MEDIAFLOW_ACCOUNT_NAME", "from-env");
        let mut raw = Settings::parse(FULL).unwrap();
        overlay(&mut raw.account_name, "MEDIAFLOW_ACCOUNT_NAME");
        env::remove_var("MEDIAFLOW_ACCOUNT_NAME");

        let settings = Settings::validate(raw).unwrap();
        assert_eq!(settings.account_name, "from-env");
    }

    #[test]
    fn test_debug_redacts_secret() {
        let raw = Settings::parse(FULL).unwrap();
        let settings = Settings::validate(raw).unwrap();
        let debug = format!("{settings:?}");
        assert!(!debug.contains("s3cret"));
    }

    #[test]
    fn test_scope() {
        let raw = Settings::parse(FULL).unwrap();
        let settings = Settings::validate(raw).unwrap();
        let scope = settings.account_scope();
        assert_eq!(scope.subscription_id, "sub-1");
        assert_eq!(scope.resource_group, "rg-1");
        assert_eq!(scope.account_name, "acct-1");
    }
}
