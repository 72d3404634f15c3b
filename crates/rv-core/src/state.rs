use crate::error::{ErrorKind, GenerationError};
use crate::job::GenerationJob;
use crate::resources::ResourceHandle;

/// Where a generation flow currently stands. Exactly one is current.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum OrchestrationState {
    #[default]
    Idle,
    /// No usable credential; the user has to pick one first
    AwaitingApiKey,
    Submitting,
    Polling(GenerationJob),
    Fetching(GenerationJob),
    Ready(ResourceHandle),
    Failed(GenerationError),
}

impl OrchestrationState {
    pub fn failed(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::Failed(GenerationError::new(kind, message))
    }

    /// A job is in flight
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Submitting | Self::Polling(_) | Self::Fetching(_))
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Idle => "idle",
            Self::AwaitingApiKey => "awaiting-api-key",
            Self::Submitting => "submitting",
            Self::Polling(_) => "polling",
            Self::Fetching(_) => "fetching",
            Self::Ready(_) => "ready",
            Self::Failed(_) => "failed",
        }
    }

    pub fn error(&self) -> Option<&GenerationError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error().map(|e| e.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_states() {
        let job = GenerationJob::pending("operations/x");
        assert!(OrchestrationState::Submitting.is_busy());
        assert!(OrchestrationState::Polling(job.clone()).is_busy());
        assert!(OrchestrationState::Fetching(job).is_busy());
        assert!(!OrchestrationState::Idle.is_busy());
        assert!(!OrchestrationState::AwaitingApiKey.is_busy());
        assert!(!OrchestrationState::failed(ErrorKind::Poll, "boom").is_busy());
    }

    #[test]
    fn test_error_kind() {
        let state = OrchestrationState::failed(ErrorKind::MissingResult, "no video");
        assert_eq!(state.error_kind(), Some(ErrorKind::MissingResult));
        assert_eq!(state.label(), "failed");
        assert_eq!(OrchestrationState::Idle.error_kind(), None);
    }
}
