//! Operation resource as returned by `GET /v1beta/{operation}`.

use serde::Deserialize;

use vgen_models::PollOutcome;

/// Long-running operation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub done: bool,
    pub error: Option<OperationError>,
    pub response: Option<OperationResponse>,
}

/// `google.rpc.Status`.
#[derive(Debug, Clone, Deserialize)]
pub struct OperationError {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResponse {
    /// REST shape
    pub generate_video_response: Option<GenerateVideoResponse>,
    /// SDK-normalized shape, seen on some API versions
    #[serde(default)]
    pub generated_videos: Vec<GeneratedSample>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateVideoResponse {
    #[serde(default)]
    pub generated_samples: Vec<GeneratedSample>,
    #[serde(default)]
    pub rai_media_filtered_reasons: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneratedSample {
    pub video: Option<VideoRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoRef {
    pub uri: Option<String>,
}

impl Operation {
    /// URI of the first generated video, if any.
    pub fn first_video_uri(&self) -> Option<&str> {
        let response = self.response.as_ref()?;
        let samples = response
            .generate_video_response
            .as_ref()
            .map(|r| r.generated_samples.as_slice())
            .filter(|s| !s.is_empty())
            .unwrap_or(response.generated_videos.as_slice());

        samples
            .iter()
            .filter_map(|s| s.video.as_ref()?.uri.as_deref())
            .find(|uri| !uri.is_empty())
    }

    /// Map the operation onto the reconciler's view of it.
    ///
    /// An error wins over everything else. A finished operation without a
    /// video (for example a safety-filtered one) counts as failed.
    pub fn to_outcome(&self) -> PollOutcome {
        if let Some(err) = &self.error {
            let message = if err.message.is_empty() {
                format!("operation failed with code {}", err.code)
            } else {
                err.message.clone()
            };
            return PollOutcome::Failed { message };
        }

        if !self.done {
            return PollOutcome::Pending;
        }

        match self.first_video_uri() {
            Some(uri) => PollOutcome::Succeeded {
                result_location: uri.to_string(),
            },
            None => {
                let reasons = self
                    .response
                    .as_ref()
                    .and_then(|r| r.generate_video_response.as_ref())
                    .map(|r| r.rai_media_filtered_reasons.join("; "))
                    .filter(|r| !r.is_empty());
                PollOutcome::Failed {
                    message: match reasons {
                        Some(r) => format!("no video generated: {}", r),
                        None => "operation completed without a video".to_string(),
                    },
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> Operation {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_running_operation_is_pending() {
        let op = parse(json!({"name": "models/veo/operations/abc"}));
        assert_eq!(op.to_outcome(), PollOutcome::Pending);
    }

    #[test]
    fn test_error_wins_even_when_not_done() {
        let op = parse(json!({"name": "x", "error": {"code": 3, "message": "bad image"}}));
        assert_eq!(
            op.to_outcome(),
            PollOutcome::Failed { message: "bad image".into() }
        );
    }

    #[test]
    fn test_rest_response_shape() {
        let op = parse(json!({
            "name": "x",
            "done": true,
            "response": {"generateVideoResponse": {"generatedSamples": [
                {"video": {"uri": "https://files.example/v1.mp4"}}
            ]}}
        }));
        assert_eq!(
            op.to_outcome(),
            PollOutcome::Succeeded { result_location: "https://files.example/v1.mp4".into() }
        );
    }

    #[test]
    fn test_sdk_response_shape() {
        let op = parse(json!({
            "done": true,
            "response": {"generatedVideos": [{"video": {"uri": "gs://bucket/v.mp4"}}]}
        }));
        assert_eq!(op.first_video_uri(), Some("gs://bucket/v.mp4"));
    }

    #[test]
    fn test_done_without_video_is_failed() {
        let op = parse(json!({
            "done": true,
            "response": {"generateVideoResponse": {"raiMediaFilteredReasons": ["celebrity"]}}
        }));
        assert_eq!(
            op.to_outcome(),
            PollOutcome::Failed { message: "no video generated: celebrity".into() }
        );
    }
}
