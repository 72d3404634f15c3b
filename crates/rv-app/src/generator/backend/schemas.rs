use serde::{Deserialize, Serialize};
use rv_core::client::{ClientError, SubmitPayload};
use rv_core::job::GenerationJob;

/// Body of `models/{model}:predictLongRunning`
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PredictRequest {
    pub instances: Vec<PredictInstance>,
    pub parameters: PredictParameters,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PredictInstance {
    pub prompt: String,
    pub image: InlineImage,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InlineImage {
    pub bytes_base64_encoded: String,
    pub mime_type: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PredictParameters {
    pub aspect_ratio: String,
    pub resolution: String,
    pub number_of_videos: u32,
}

impl From<&SubmitPayload> for PredictRequest {
    fn from(payload: &SubmitPayload) -> Self {
        Self {
            instances: vec![PredictInstance {
                prompt: payload.prompt.clone(),
                image: InlineImage {
                    bytes_base64_encoded: payload.image.data.clone(),
                    mime_type: payload.image.mime_type.clone(),
                },
            }],
            parameters: PredictParameters {
                aspect_ratio: payload.aspect_ratio.id().to_string(),
                resolution: payload.resolution.id().to_string(),
                number_of_videos: payload.number_of_videos,
            },
        }
    }
}

/// Long-running operation as returned by submit and by each poll
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Operation {
    pub name: String,
    #[serde(default)]
    pub done: bool,
    pub response: Option<OperationResponse>,
    pub error: Option<ApiStatus>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OperationResponse {
    pub generate_video_response: Option<GenerateVideoResponse>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateVideoResponse {
    #[serde(default)]
    pub generated_samples: Vec<GeneratedSample>,
    #[serde(default)]
    pub rai_media_filtered_reasons: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct GeneratedSample {
    pub video: Option<VideoRef>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct VideoRef {
    pub uri: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ApiStatus {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
}

impl From<ApiStatus> for ClientError {
    fn from(status: ApiStatus) -> Self {
        ClientError::Remote {
            code: status.code,
            status: status.status,
            message: status.message,
        }
    }
}

/// `{"error": {...}}` body of a failed call
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ErrorEnvelope {
    pub error: ApiStatus,
}

impl Operation {
    /// URI of the first generated clip, if the job produced one
    pub fn video_uri(&self) -> Option<String> {
        self.response
            .as_ref()?
            .generate_video_response
            .as_ref()?
            .generated_samples
            .iter()
            .find_map(|sample| sample.video.as_ref()?.uri.clone())
    }

    pub fn filtered_reasons(&self) -> &[String] {
        self.response
            .as_ref()
            .and_then(|r| r.generate_video_response.as_ref())
            .map(|r| r.rai_media_filtered_reasons.as_slice())
            .unwrap_or_default()
    }

    /// Fold into a job, keeping `previous`'s timestamps when there is one.
    /// An operation-level error becomes a client error.
    pub fn into_job(self, previous: Option<&GenerationJob>) -> Result<GenerationJob, ClientError> {
        if let Some(error) = self.error {
            return Err(error.into());
        }

        let uri = self.video_uri();
        let job = match previous {
            Some(prev) => prev.refreshed(self.done, uri),
            None => GenerationJob::pending(self.name).refreshed(self.done, uri),
        };
        Ok(job)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rv_core::encoder::EncodedImage;
    use rv_core::AspectRatio;
    use serde_json::json;

    #[test]
    fn test_predict_request_shape() {
        let payload = SubmitPayload::new(
            EncodedImage {
                data: "/9j/4A==".into(),
                mime_type: "image/jpeg".into(),
            },
            "a gentle breeze",
            AspectRatio::Portrait,
        );

        let body = serde_json::to_value(PredictRequest::from(&payload)).unwrap();

        assert_eq!(body, json!({
            "instances": [{
                "prompt": "a gentle breeze",
                "image": {
                    "bytesBase64Encoded": "/9j/4A==",
                    "mimeType": "image/jpeg"
                }
            }],
            "parameters": {
                "aspectRatio": "9:16",
                "resolution": "720p",
                "numberOfVideos": 1
            }
        }));
    }

    #[test]
    fn test_pending_operation() {
        let op: Operation = serde_json::from_value(json!({
            "name": "models/veo/operations/abc123"
        }))
        .unwrap();

        let job = op.into_job(None).unwrap();
        assert_eq!(job.name, "models/veo/operations/abc123");
        assert!(!job.done);
        assert!(job.result_uri.is_none());
    }

    #[test]
    fn test_done_operation_with_video() {
        let op: Operation = serde_json::from_value(json!({
            "name": "models/veo/operations/abc123",
            "done": true,
            "response": {
                "@type": "type.googleapis.com/google.ai.generativelanguage.v1beta.PredictLongRunningResponse",
                "generateVideoResponse": {
                    "generatedSamples": [
                        { "video": { "uri": "https://files.test/v1beta/files/xyz:download?alt=media" } }
                    ]
                }
            }
        }))
        .unwrap();

        let previous = GenerationJob::pending("models/veo/operations/abc123");
        let job = op.into_job(Some(&previous)).unwrap();
        assert!(job.done);
        assert_eq!(job.submitted_at, previous.submitted_at);
        assert_eq!(
            job.result_uri.as_deref(),
            Some("https://files.test/v1beta/files/xyz:download?alt=media")
        );
    }

    #[test]
    fn test_done_operation_filtered() {
        let op: Operation = serde_json::from_value(json!({
            "name": "operations/abc",
            "done": true,
            "response": {
                "generateVideoResponse": {
                    "raiMediaFilteredCount": 1,
                    "raiMediaFilteredReasons": ["The prompt could not be processed."]
                }
            }
        }))
        .unwrap();

        assert_eq!(op.filtered_reasons().len(), 1);
        let job = op.into_job(None).unwrap();
        assert!(job.done);
        assert!(job.result_uri.is_none());
    }

    #[test]
    fn test_operation_error_becomes_client_error() {
        let op: Operation = serde_json::from_value(json!({
            "name": "operations/abc",
            "done": true,
            "error": { "code": 3, "message": "Image too large", "status": "INVALID_ARGUMENT" }
        }))
        .unwrap();

        let err = op.into_job(None).unwrap_err();
        assert_eq!(err.user_message(), "Image too large");
    }

    #[test]
    fn test_error_envelope() {
        let envelope: ErrorEnvelope = serde_json::from_str(
            r#"{"error":{"code":404,"message":"Requested entity was not found.","status":"NOT_FOUND"}}"#,
        )
        .unwrap();
        assert_eq!(envelope.error.code, 404);
        assert_eq!(envelope.error.status, "NOT_FOUND");
    }
}
