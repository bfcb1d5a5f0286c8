//! Source-file upload through a short-lived signed container URL.
//!
//! Transfer mechanics belong to the storage service; this module only
//! addresses the blob inside the signed container and sends the bytes.

use crate::error::{OrchestratorError, Result};
use async_trait::async_trait;
use std::path::Path;
use url::Url;

/// Uploads one local file into a signed container.
#[async_trait]
pub trait BlobUploader: Send + Sync {
    /// Upload `path` into the container behind `container_sas`, named
    /// after the file. Failure is fatal to the run.
    async fn upload_file(&self, container_sas: &Url, path: &Path) -> Result<()>;
}

/// Uploader that PUTs the file body directly to the signed URL.
#[derive(Debug, Clone)]
pub struct SignedUrlUploader {
    http: reqwest::Client,
}

impl SignedUrlUploader {
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(600))
            .build()?;
        Ok(Self { http })
    }

    /// Address a blob inside the signed container, preserving the
    /// signature query.
    fn blob_url(container_sas: &Url, file_name: &str) -> Result<Url> {
        let mut url = container_sas.clone();
        url.path_segments_mut()
            .map_err(|_| OrchestratorError::Upload("signed URL cannot be a base".into()))?
            .pop_if_empty()
            .push(file_name);
        Ok(url)
    }
}

#[async_trait]
impl BlobUploader for SignedUrlUploader {
    async fn upload_file(&self, container_sas: &Url, path: &Path) -> Result<()> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                OrchestratorError::Upload(format!("source path has no file name: {}", path.display()))
            })?;

        let url = Self::blob_url(container_sas, file_name)?;
        let body = tokio::fs::read(path).await?;
        let size = body.len();

        tracing::debug!(blob = file_name, bytes = size, "uploading blob");
        let response = self
            .http
            .put(url)
            .header("x-ms-blob-type", "BlockBlob")
            .header("content-type", "application/octet-stream")
            .body(body)
            .send()
            .await
            .map_err(|e| OrchestratorError::Upload(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(OrchestratorError::Upload(format!(
                "storage returned {status}: {message}"
            )));
        }
        Ok(())
    }
}
