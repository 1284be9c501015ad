pub mod gemini;
pub mod video;

use std::pin::Pin;

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use futures_core::Stream;
use serde::{Deserialize, Serialize};
use wardrobe_schema::AspectRatio;

pub use gemini::{GeminiAnalyzer, GeminiChat, GeminiChatSession, GeminiClient};
pub use video::GeminiVideo;

/// Ordered text fragments of a streamed reply.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Attributes suggested by the vision model. `season` is passed through as
/// returned; callers decide how to treat values outside the season enum.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClothingAnalysis {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub color: String,
    pub season: String,
}

#[async_trait]
pub trait ImageAnalyzer: Send + Sync {
    /// `image_base64` is the bare base64 payload, without a `data:` prefix.
    async fn analyze(&self, image_base64: &str, mime_type: &str) -> Result<ClothingAnalysis>;
}

/// One exchange sent on a conversational session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub message: String,
    pub system_instruction: String,
}

pub trait ChatBackend: Send + Sync {
    /// Open a fresh conversational session with empty history.
    fn open_session(&self) -> Box<dyn ChatSession>;
}

#[async_trait]
pub trait ChatSession: Send {
    async fn send_stream(&mut self, turn: ChatTurn) -> Result<TextStream>;

    /// Append a completed exchange to the session history so later turns see it.
    fn record_exchange(&mut self, message: &str, reply: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRequest {
    pub prompt: String,
    pub aspect_ratio: AspectRatio,
}

/// Snapshot of a long-running generation job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoJob {
    pub handle: String,
    pub done: bool,
    pub result_uri: Option<String>,
    pub error: Option<String>,
}

impl VideoJob {
    pub fn pending(handle: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
            done: false,
            result_uri: None,
            error: None,
        }
    }

    pub fn finished(handle: impl Into<String>, result_uri: Option<String>) -> Self {
        Self {
            handle: handle.into(),
            done: true,
            result_uri,
            error: None,
        }
    }
}

#[async_trait]
pub trait VideoBackend: Send + Sync {
    async fn create_job(&self, request: &VideoRequest, api_key: &str) -> Result<VideoJob>;
    async fn job_status(&self, handle: &str, api_key: &str) -> Result<VideoJob>;
    async fn fetch_asset(&self, uri: &str, api_key: &str) -> Result<Bytes>;
}
