//! Google Gemini API adapters
//!
//! https://ai.google.dev/api/generate-content

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use futures_core::Stream;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tokio_stream::StreamExt;
use wardrobe_schema::Season;

use crate::{ChatBackend, ChatSession, ChatTurn, ClothingAnalysis, ImageAnalyzer, TextStream};

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Credentials travel in this header, never in the request URL.
const API_KEY_HEADER: &str = "x-goog-api-key";

const ANALYSIS_PROMPT: &str = "Analyze this image of a clothing item. Identify its name, type, \
primary color, and the most suitable season. Return the response as a JSON object matching \
the provided schema. Be accurate.";

/// Shared HTTP plumbing for every Gemini endpoint.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
}

impl GeminiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build gemini http client")?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) async fn post_json<T: Serialize + ?Sized>(
        &self,
        url: &str,
        api_key: &str,
        payload: &T,
    ) -> Result<reqwest::Response> {
        self.send(
            self.http
                .post(url)
                .header(API_KEY_HEADER, api_key)
                .header("content-type", "application/json")
                .json(payload),
        )
        .await
    }

    pub(crate) async fn get(&self, url: &str, api_key: &str) -> Result<reqwest::Response> {
        self.send(self.http.get(url).header(API_KEY_HEADER, api_key)).await
    }

    /// Transport errors are stripped of their request URL.
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let resp = match request.send().await {
            Ok(r) => r,
            Err(e) if e.is_timeout() => {
                return Err(anyhow!(
                    "gemini api error (timeout) [retryable]: request timed out"
                ));
            }
            Err(e) if e.is_connect() => {
                return Err(anyhow!(
                    "gemini api error (connect) [retryable]: {}",
                    e.without_url()
                ));
            }
            Err(e) => return Err(e.without_url().into()),
        };

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(format_api_error(status, &text));
        }
        Ok(resp)
    }
}

// ============================================================
// Image analysis
// ============================================================

pub struct GeminiAnalyzer {
    client: GeminiClient,
    api_key: String,
    model: String,
}

impl GeminiAnalyzer {
    pub fn new(client: GeminiClient, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    fn build_request(&self, image_base64: &str, mime_type: &str) -> GeminiRequest {
        GeminiRequest {
            contents: vec![GeminiContent {
                role: "user".to_string(),
                parts: vec![
                    GeminiPart::InlineData {
                        inline_data: GeminiInlineData {
                            mime_type: mime_type.to_string(),
                            data: image_base64.to_string(),
                        },
                    },
                    GeminiPart::text(ANALYSIS_PROMPT),
                ],
            }],
            system_instruction: None,
            generation_config: Some(GeminiGenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                response_schema: Some(clothing_schema()),
                thinking_config: None,
            }),
        }
    }
}

#[async_trait]
impl ImageAnalyzer for GeminiAnalyzer {
    async fn analyze(&self, image_base64: &str, mime_type: &str) -> Result<ClothingAnalysis> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.client.base_url, self.model
        );
        tracing::debug!(model = %self.model, mime_type, "requesting clothing analysis");

        let payload = self.build_request(image_base64, mime_type);
        let resp = self.client.post_json(&url, &self.api_key, &payload).await?;
        let body: GeminiResponse = resp
            .json()
            .await
            .context("gemini analysis response is not valid json")?;

        let text = response_text(&body)?;
        serde_json::from_str(text.trim())
            .with_context(|| format!("gemini analysis output does not match schema: {text}"))
    }
}

fn clothing_schema() -> serde_json::Value {
    let seasons: Vec<&str> = Season::ALL_VALUES.iter().map(Season::as_str).collect();
    serde_json::json!({
        "type": "OBJECT",
        "properties": {
            "name": {
                "type": "STRING",
                "description": "A short, descriptive name for the clothing item (e.g., 'Blue Striped T-Shirt')."
            },
            "type": {
                "type": "STRING",
                "description": "The type of clothing (e.g., 'T-Shirt', 'Jeans', 'Dress', 'Jacket')."
            },
            "color": {
                "type": "STRING",
                "description": "The dominant color of the clothing item."
            },
            "season": {
                "type": "STRING",
                "enum": seasons,
                "description": "The most suitable season for this item."
            }
        },
        "required": ["name", "type", "color", "season"]
    })
}

// ============================================================
// Streaming chat
// ============================================================

pub struct GeminiChat {
    client: GeminiClient,
    api_key: String,
    model: String,
    thinking_budget: Option<u32>,
}

impl GeminiChat {
    pub fn new(client: GeminiClient, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            thinking_budget: None,
        }
    }

    pub fn with_thinking_budget(mut self, budget: u32) -> Self {
        self.thinking_budget = Some(budget);
        self
    }
}

impl ChatBackend for GeminiChat {
    fn open_session(&self) -> Box<dyn ChatSession> {
        Box::new(GeminiChatSession {
            client: self.client.clone(),
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            thinking_budget: self.thinking_budget,
            history: Vec::new(),
        })
    }
}

/// Multi-turn conversation. Gemini is stateless over REST, so the session
/// keeps the history and replays it with every turn.
pub struct GeminiChatSession {
    client: GeminiClient,
    api_key: String,
    model: String,
    thinking_budget: Option<u32>,
    history: Vec<GeminiContent>,
}

impl GeminiChatSession {
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    fn build_request(&self, turn: &ChatTurn) -> GeminiRequest {
        let mut contents = self.history.clone();
        contents.push(GeminiContent::text("user", &turn.message));

        GeminiRequest {
            contents,
            system_instruction: Some(GeminiContent::text("user", &turn.system_instruction)),
            generation_config: self.thinking_budget.map(|budget| GeminiGenerationConfig {
                thinking_config: Some(GeminiThinkingConfig {
                    thinking_budget: budget,
                }),
                ..Default::default()
            }),
        }
    }
}

#[async_trait]
impl ChatSession for GeminiChatSession {
    async fn send_stream(&mut self, turn: ChatTurn) -> Result<TextStream> {
        let url = format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.client.base_url, self.model
        );
        tracing::debug!(model = %self.model, history = self.history.len(), "opening chat stream");

        let payload = self.build_request(&turn);
        let resp = self.client.post_json(&url, &self.api_key, &payload).await?;
        Ok(Box::pin(parse_sse_stream(resp.bytes_stream())))
    }

    fn record_exchange(&mut self, message: &str, reply: &str) {
        self.history.push(GeminiContent::text("user", message));
        self.history.push(GeminiContent::text("model", reply));
    }
}

fn parse_sse_stream(
    byte_stream: impl Stream<Item = std::result::Result<bytes::Bytes, reqwest::Error>> + Send + 'static,
) -> impl Stream<Item = Result<String>> + Send {
    async_stream::stream! {
        tokio::pin!(byte_stream);
        let mut buffer: Vec<u8> = Vec::new();

        while let Some(chunk_result) = byte_stream.next().await {
            match chunk_result {
                Ok(bytes) => {
                    buffer.extend_from_slice(&bytes);

                    while let Some((end, separator)) = find_event_boundary(&buffer) {
                        let event = buffer[..end].to_vec();
                        buffer.drain(..end + separator);

                        match event_text(&event) {
                            Ok(Some(text)) => {
                                yield Ok(text);
                            }
                            Ok(None) => {}
                            Err(e) => {
                                yield Err(e);
                                return;
                            }
                        }
                    }
                }
                Err(e) => {
                    yield Err(anyhow!("stream error: {}", e.without_url()));
                    return;
                }
            }
        }

        // Trailing event without a blank-line terminator
        if !buffer.iter().all(u8::is_ascii_whitespace) {
            match event_text(&buffer) {
                Ok(Some(text)) => {
                    yield Ok(text);
                }
                Ok(None) => {}
                Err(e) => {
                    yield Err(e);
                }
            }
        }
    }
}

/// Position and length of the first `\n\n` or `\r\n\r\n` separator.
fn find_event_boundary(buffer: &[u8]) -> Option<(usize, usize)> {
    (0..buffer.len()).find_map(|i| {
        let rest = &buffer[i..];
        if rest.starts_with(b"\r\n\r\n") {
            Some((i, 4))
        } else if rest.starts_with(b"\n\n") {
            Some((i, 2))
        } else {
            None
        }
    })
}

fn event_text(event: &[u8]) -> Result<Option<String>> {
    let event = String::from_utf8_lossy(event);
    let mut text = String::new();

    for line in event.lines() {
        let Some(data) = line.strip_prefix("data:") else {
            continue;
        };
        let data = data.trim();
        if data.is_empty() || data == "[DONE]" {
            continue;
        }

        let response: GeminiResponse =
            serde_json::from_str(data).map_err(|e| anyhow!("invalid sse event payload: {e}"))?;
        if let Some(error) = response.error {
            return Err(anyhow!(
                "gemini api error ({}): {}",
                error.code,
                error.message
            ));
        }
        text.push_str(&candidate_text(&response));
    }

    Ok((!text.is_empty()).then_some(text))
}

fn candidate_text(response: &GeminiResponse) -> String {
    let Some(candidate) = response.candidates.first() else {
        return String::new();
    };
    candidate
        .content
        .parts
        .iter()
        .filter_map(|part| match part {
            GeminiPart::Text { text, thought } if thought != &Some(true) => Some(text.as_str()),
            _ => None,
        })
        .collect()
}

fn response_text(response: &GeminiResponse) -> Result<String> {
    if let Some(error) = &response.error {
        return Err(anyhow!("gemini api error ({}): {}", error.code, error.message));
    }
    if response.candidates.is_empty() {
        return Err(anyhow!("gemini api error: empty candidates"));
    }
    let text = candidate_text(response);
    if text.trim().is_empty() {
        return Err(anyhow!("gemini api error: empty response text"));
    }
    Ok(text)
}

pub(crate) fn format_api_error(status: StatusCode, text: &str) -> anyhow::Error {
    let retryable = match status.as_u16() {
        429 | 500..=599 => " [retryable]",
        _ => "",
    };
    anyhow!("gemini api error ({status}){retryable}: {text}")
}

// ============================================================
// Gemini API Types
// ============================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    role: String,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

impl GeminiContent {
    fn text(role: &str, text: &str) -> Self {
        Self {
            role: role.to_string(),
            parts: vec![GeminiPart::text(text)],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum GeminiPart {
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: GeminiInlineData,
    },
    Text {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        thought: Option<bool>,
    },
    Other(serde_json::Value),
}

impl GeminiPart {
    fn text(text: &str) -> Self {
        GeminiPart::Text {
            text: text.to_string(),
            thought: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking_config: Option<GeminiThinkingConfig>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiThinkingConfig {
    thinking_budget: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    error: Option<GeminiError>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: GeminiContent,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GeminiError {
    #[serde(default)]
    pub(crate) code: i64,
    #[serde(default)]
    pub(crate) message: String,
}
