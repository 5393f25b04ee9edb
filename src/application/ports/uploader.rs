//! Upload port interface

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::audio::AudioData;

/// Upload errors
#[derive(Debug, Clone, Error)]
pub enum UploadError {
    #[error("Server rejected upload with HTTP {status}{}", format_body(.body))]
    Rejected { status: u16, body: String },

    #[error("Upload timed out")]
    Timeout,

    #[error("Upload request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid upload endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Upload was cancelled")]
    Cancelled,
}

fn format_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {}", trimmed)
    }
}

/// Acknowledgement of a delivered recording
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    /// HTTP status the server answered with
    pub status: u16,
    /// Size of the request body
    pub bytes_sent: usize,
}

/// Port for delivering a recording to the server
#[async_trait]
pub trait Uploader: Send + Sync {
    /// Send the recording as a single request body.
    ///
    /// Only a 200 response counts as delivered; the response body is ignored.
    async fn upload(&self, audio: &AudioData) -> Result<UploadReceipt, UploadError>;

    /// Where recordings are sent, for display
    fn endpoint(&self) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_display_includes_status_and_body() {
        let err = UploadError::Rejected {
            status: 500,
            body: "disk full\n".to_string(),
        };
        assert_eq!(err.to_string(), "Server rejected upload with HTTP 500: disk full");
    }

    #[test]
    fn rejected_display_without_body() {
        let err = UploadError::Rejected {
            status: 404,
            body: String::new(),
        };
        assert_eq!(err.to_string(), "Server rejected upload with HTTP 404");
    }
}
