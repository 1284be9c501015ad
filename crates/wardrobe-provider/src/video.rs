//! Veo video generation via Gemini long-running operations
//!
//! https://ai.google.dev/gemini-api/docs/video

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::gemini::{GeminiClient, GeminiError};
use crate::{VideoBackend, VideoJob, VideoRequest};

pub struct GeminiVideo {
    client: GeminiClient,
    model: String,
    resolution: String,
}

impl GeminiVideo {
    pub fn new(client: GeminiClient, model: impl Into<String>, resolution: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            resolution: resolution.into(),
        }
    }

    fn build_request(&self, request: &VideoRequest) -> VeoRequest {
        VeoRequest {
            instances: vec![VeoInstance {
                prompt: request.prompt.clone(),
            }],
            parameters: VeoParameters {
                aspect_ratio: request.aspect_ratio.as_str().to_string(),
                resolution: self.resolution.clone(),
                sample_count: 1,
            },
        }
    }
}

#[async_trait]
impl VideoBackend for GeminiVideo {
    async fn create_job(&self, request: &VideoRequest, api_key: &str) -> Result<VideoJob> {
        let url = format!(
            "{}/models/{}:predictLongRunning",
            self.client.base_url(),
            self.model
        );
        let payload = self.build_request(request);
        let resp = self.client.post_json(&url, api_key, &payload).await?;
        let operation: GeminiOperation = resp
            .json()
            .await
            .context("video operation response is not valid json")?;

        tracing::info!(operation = %operation.name, model = %self.model, "video job created");
        Ok(operation.into_job())
    }

    async fn job_status(&self, handle: &str, api_key: &str) -> Result<VideoJob> {
        let url = format!("{}/{}", self.client.base_url(), handle.trim_start_matches('/'));
        let resp = self.client.get(&url, api_key).await?;
        let operation: GeminiOperation = resp
            .json()
            .await
            .context("video operation status is not valid json")?;
        Ok(operation.into_job())
    }

    async fn fetch_asset(&self, uri: &str, api_key: &str) -> Result<Bytes> {
        let resp = self.client.get(uri, api_key).await?;
        let body = resp.bytes().await.context("failed to read video payload")?;
        tracing::debug!(bytes = body.len(), "video payload downloaded");
        Ok(body)
    }
}

// ============================================================
// Veo API Types
// ============================================================

#[derive(Debug, Clone, Serialize)]
struct VeoRequest {
    instances: Vec<VeoInstance>,
    parameters: VeoParameters,
}

#[derive(Debug, Clone, Serialize)]
struct VeoInstance {
    prompt: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct VeoParameters {
    aspect_ratio: String,
    resolution: String,
    sample_count: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiOperation {
    name: String,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    response: Option<OperationResponse>,
    #[serde(default)]
    error: Option<GeminiError>,
}

impl GeminiOperation {
    fn into_job(self) -> VideoJob {
        let result_uri = self
            .response
            .and_then(|r| r.generate_video_response)
            .and_then(|r| r.generated_samples.into_iter().next())
            .and_then(|sample| sample.video)
            .and_then(|video| video.uri);

        VideoJob {
            handle: self.name,
            done: self.done,
            result_uri,
            error: self.error.map(|e| e.message),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OperationResponse {
    #[serde(default)]
    generate_video_response: Option<GenerateVideoResponse>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateVideoResponse {
    #[serde(default)]
    generated_samples: Vec<GeneratedSample>,
}

#[derive(Debug, Clone, Deserialize)]
struct GeneratedSample {
    #[serde(default)]
    video: Option<GeneratedVideo>,
}

#[derive(Debug, Clone, Deserialize)]
struct GeneratedVideo {
    #[serde(default)]
    uri: Option<String>,
}
