//! HTTP upload adapter

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{StatusCode, Url};

use crate::application::ports::{UploadError, UploadReceipt, Uploader};
use crate::domain::audio::AudioData;
use crate::domain::recording::Duration;

/// Uploads recordings as a raw POST body
pub struct HttpUploader {
    url: Url,
    client: reqwest::Client,
}

impl HttpUploader {
    /// Create an uploader posting to `path` on `server_url`.
    ///
    /// An absolute `path` replaces any path already on the server URL.
    pub fn new(server_url: &str, path: &str, timeout: Duration) -> Result<Self, UploadError> {
        let url = Self::endpoint_url(server_url, path)?;
        let client = reqwest::Client::builder()
            .timeout(timeout.as_std())
            .build()
            .map_err(|e| UploadError::RequestFailed(format!("Failed to build client: {}", e)))?;

        Ok(Self { url, client })
    }

    /// Resolve the upload URL from a server base and a path
    fn endpoint_url(server_url: &str, path: &str) -> Result<Url, UploadError> {
        let base = Url::parse(server_url.trim())
            .map_err(|e| UploadError::InvalidEndpoint(format!("{}: {}", server_url, e)))?;

        if !matches!(base.scheme(), "http" | "https") {
            return Err(UploadError::InvalidEndpoint(format!(
                "{}: scheme must be http or https",
                server_url
            )));
        }

        base.join(path.trim())
            .map_err(|e| UploadError::InvalidEndpoint(format!("{}: {}", path, e)))
    }

    fn map_send_error(e: reqwest::Error) -> UploadError {
        if e.is_timeout() {
            UploadError::Timeout
        } else {
            UploadError::RequestFailed(e.to_string())
        }
    }
}

#[async_trait]
impl Uploader for HttpUploader {
    async fn upload(&self, audio: &AudioData) -> Result<UploadReceipt, UploadError> {
        let bytes_sent = audio.size_bytes();

        let response = self
            .client
            .post(self.url.clone())
            .header(CONTENT_TYPE, audio.mime_type().as_str())
            .body(audio.data().to_vec())
            .send()
            .await
            .map_err(Self::map_send_error)?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(UploadError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(UploadReceipt {
            status: status.as_u16(),
            bytes_sent,
        })
    }

    fn endpoint(&self) -> String {
        self.url.to_string()
    }
}
