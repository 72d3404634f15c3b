use async_trait::async_trait;
use thiserror::Error;
use crate::credentials::Credential;
use crate::encoder::EncodedImage;
use crate::job::GenerationJob;
use crate::video_types::{AspectRatio, Resolution, VIDEOS_PER_JOB};

/// Message the service uses when a key belongs to no usable project
pub const ENTITY_NOT_FOUND: &str = "Requested entity was not found.";

/// Everything `submit` sends for one job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitPayload {
    pub image: EncodedImage,
    pub prompt: String,
    pub aspect_ratio: AspectRatio,
    pub resolution: Resolution,
    pub number_of_videos: u32,
}

impl SubmitPayload {
    pub fn new(image: EncodedImage, prompt: impl Into<String>, aspect_ratio: AspectRatio) -> Self {
        Self {
            image,
            prompt: prompt.into(),
            aspect_ratio,
            resolution: Resolution::default(),
            number_of_videos: VIDEOS_PER_JOB,
        }
    }
}

/// Classification the state machine relies on instead of inspecting
/// messages itself.
pub trait ErrorClass {
    /// The service rejected the credential (or its project)
    fn is_auth_error(&self) -> bool;
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Non-success HTTP status
    #[error("HTTP {code} {status_text}: {body}")]
    Status {
        code: u16,
        status_text: String,
        body: String,
    },

    /// Structured error object reported by the service
    #[error("{status} ({code}): {message}")]
    Remote {
        code: u16,
        status: String,
        message: String,
    },

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ClientError {
    /// Text shown to the user for this error
    pub fn user_message(&self) -> String {
        match self {
            Self::Status { status_text, .. } => status_text.clone(),
            Self::Remote { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl ErrorClass for ClientError {
    fn is_auth_error(&self) -> bool {
        match self {
            // Operation errors carry gRPC codes and no status string
            Self::Remote { code, status, message } => {
                (*code == 404 && status == "NOT_FOUND") || message.contains(ENTITY_NOT_FOUND)
            }
            // Only the raw body is available here
            Self::Status { body, .. } => body.contains(ENTITY_NOT_FOUND),
            Self::Transport(msg) | Self::InvalidResponse(msg) => msg.contains(ENTITY_NOT_FOUND),
        }
    }
}

/// Remote video-synthesis service.
///
/// Jobs run for minutes and only expose a status check, so callers drive the
/// polling themselves.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Start a job. The returned job is normally not done yet.
    async fn submit(&self, payload: &SubmitPayload, credential: &Credential) -> Result<GenerationJob, ClientError>;

    /// Refresh a job's status. Safe to call any number of times.
    async fn poll(&self, job: &GenerationJob, credential: &Credential) -> Result<GenerationJob, ClientError>;

    /// Download the finished asset
    async fn fetch_asset(&self, uri: &str, credential: &Credential) -> Result<Vec<u8>, ClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_not_found_is_auth() {
        let err = ClientError::Remote {
            code: 404,
            status: "NOT_FOUND".into(),
            message: ENTITY_NOT_FOUND.into(),
        };
        assert!(err.is_auth_error());
    }

    #[test]
    fn test_operation_status_without_status_string_is_auth() {
        let err = ClientError::Remote {
            code: 5,
            status: String::new(),
            message: ENTITY_NOT_FOUND.into(),
        };
        assert!(err.is_auth_error());
    }

    #[test]
    fn test_substring_fallback() {
        let err = ClientError::Status {
            code: 404,
            status_text: "Not Found".into(),
            body: format!("{{\"error\":{{\"message\":\"{}\"}}}}", ENTITY_NOT_FOUND),
        };
        assert!(err.is_auth_error());
    }

    #[test]
    fn test_other_errors_are_not_auth() {
        let err = ClientError::Remote {
            code: 400,
            status: "INVALID_ARGUMENT".into(),
            message: "Image too large".into(),
        };
        assert!(!err.is_auth_error());
        assert!(!ClientError::Transport("connection reset".into()).is_auth_error());
    }

    #[test]
    fn test_user_message_uses_status_text() {
        let err = ClientError::Status {
            code: 403,
            status_text: "Forbidden".into(),
            body: String::new(),
        };
        assert_eq!(err.user_message(), "Forbidden");
    }
}
