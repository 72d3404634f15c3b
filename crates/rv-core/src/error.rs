use std::fmt;
use thiserror::Error;

/// Failure classes a generation flow can end in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Missing image or prompt, caught before any network call
    Validation,
    /// Source image could not be turned into a transport payload
    Encoding,
    /// Remote service rejected or failed the initial job request
    Submission,
    /// A status refresh failed while the job was running
    Poll,
    /// Job reported done but carried no result reference
    MissingResult,
    /// Final binary retrieval failed
    AssetFetch,
    /// Credential or project rejected by the remote service
    Auth,
    /// Polling exceeded the configured maximum duration
    Timeout,
}

impl ErrorKind {
    pub fn name(&self) -> &str {
        match self {
            Self::Validation => "ValidationError",
            Self::Encoding => "EncodingError",
            Self::Submission => "SubmissionError",
            Self::Poll => "PollError",
            Self::MissingResult => "MissingResultError",
            Self::AssetFetch => "AssetFetchError",
            Self::Auth => "AuthError",
            Self::Timeout => "TimeoutError",
        }
    }

    /// Whether picking a different API key is the way out of this failure
    pub fn requires_credential(&self) -> bool {
        matches!(self, Self::Auth)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The payload of `OrchestrationState::Failed`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct GenerationError {
    pub kind: ErrorKind,
    pub message: String,
}

impl GenerationError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum EncodingError {
    #[error("Failed to read image {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Image source is empty")]
    Empty,

    #[error("Malformed data URI: {0}")]
    MalformedDataUri(String),
}

#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("Credential selection failed: {0}")]
    Selection(String),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Unknown aspect ratio '{0}', expected 16:9 or 9:16")]
    UnknownAspectRatio(String),
}

pub type Result<T> = std::result::Result<T, Error>;
