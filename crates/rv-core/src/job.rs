use chrono::{DateTime, Utc};

/// A remote long-running generation task.
///
/// Created when submission succeeds and afterwards only replaced by the
/// result of a poll. Terminal once `done` is set.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationJob {
    /// Opaque operation handle assigned by the service
    pub name: String,
    pub done: bool,
    /// Where the finished asset can be downloaded from
    pub result_uri: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GenerationJob {
    pub fn pending(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            done: false,
            result_uri: None,
            submitted_at: now,
            updated_at: now,
        }
    }

    /// Fold a fresh status report into this job, keeping the original
    /// submission time.
    pub fn refreshed(&self, done: bool, result_uri: Option<String>) -> Self {
        Self {
            name: self.name.clone(),
            done,
            result_uri,
            submitted_at: self.submitted_at,
            updated_at: Utc::now(),
        }
    }

    pub fn elapsed(&self) -> chrono::Duration {
        self.updated_at - self.submitted_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_job() {
        let job = GenerationJob::pending("operations/abc");
        assert!(!job.done);
        assert!(job.result_uri.is_none());
        assert_eq!(job.submitted_at, job.updated_at);
    }

    #[test]
    fn test_refresh_keeps_identity() {
        let job = GenerationJob::pending("operations/abc");
        let done = job.refreshed(true, Some("https://example.test/v.mp4".into()));
        assert_eq!(done.name, "operations/abc");
        assert_eq!(done.submitted_at, job.submitted_at);
        assert!(done.done);
        assert!(done.elapsed() >= chrono::Duration::zero());
    }
}
