//! Gemini REST API client
//!
//! Talks to `generateContent` and `streamGenerateContent?alt=sse`.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, StatusCode};
use sa_core::config::DEFAULT_BASE_URL;
use sa_core::event::GroundingSource;
use sa_core::{Content, GroundingMetadata, Part, UsageMetadata};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

use super::sse::SseDecoder;
use super::{GenerateConfig, LlmRequest, LlmResponse, Model, ModelStream, STREAM_BUFFER};
use crate::error::{Result, RunnerError};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Client for one Gemini model
#[derive(Clone)]
pub struct GeminiModel {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl std::fmt::Debug for GeminiModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiModel")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl GeminiModel {
    /// Create a client for `model` authenticated with `api_key`
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(RunnerError::MissingCredential {
                name: "Gemini API key".into(),
            });
        }

        let model = model.into();
        if model.trim().is_empty() {
            return Err(RunnerError::invalid_config("model name must not be empty"));
        }

        let client = Client::builder().build()?;

        Ok(Self {
            client,
            api_key,
            model,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Override the API root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/models/{}:{}", self.base_url, self.model, method)
    }

    async fn post(&self, url: String, request: LlmRequest) -> Result<reqwest::Response> {
        let body = GenerateContentRequest::from(request);
        debug!(
            "Sending {} content(s) and {} tool(s) to {}",
            body.contents.len(),
            body.tools.len(),
            url
        );

        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status, &body));
        }

        Ok(response)
    }
}

#[async_trait]
impl Model for GeminiModel {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse> {
        let response = self.post(self.endpoint("generateContent"), request).await?;
        let text = response.text().await?;
        decode_response(&text)
    }

    async fn generate_stream(&self, request: LlmRequest) -> Result<ModelStream> {
        let url = format!("{}?alt=sse", self.endpoint("streamGenerateContent"));
        let response = self.post(url, request).await?;

        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        let model = self.model.clone();

        tokio::spawn(async move {
            let mut stream = response.bytes_stream();
            let mut decoder = SseDecoder::new();
            let mut chunk_count = 0usize;

            while let Some(chunk) = stream.next().await {
                let bytes = match chunk {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        warn!("Gemini stream error after {} chunks: {}", chunk_count, e);
                        let _ = tx.send(Err(e.into())).await;
                        return;
                    }
                };

                for payload in decoder.push(&bytes) {
                    chunk_count += 1;
                    if tx.send(decode_response(&payload)).await.is_err() {
                        debug!("Model stream receiver dropped");
                        return;
                    }
                }
            }

            if let Some(payload) = decoder.finish() {
                chunk_count += 1;
                let _ = tx.send(decode_response(&payload)).await;
            }

            info!("{} stream closed after {} chunks", model, chunk_count);
        });

        Ok(ReceiverStream::new(rx))
    }
}

fn decode_response(payload: &str) -> Result<LlmResponse> {
    let response: GenerateContentResponse = serde_json::from_str(payload)
        .map_err(|e| RunnerError::decode(format!("{}: {}", e, truncate(payload, 200))))?;
    response.into_llm_response()
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        format!("{}...", text.chars().take(max_chars).collect::<String>())
    } else {
        text.to_string()
    }
}

fn api_error(status: StatusCode, body: &str) -> RunnerError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.describe())
        .unwrap_or_else(|_| body.to_string());

    RunnerError::Api {
        status: status.as_u16(),
        message,
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<serde_json::Value>,
    #[serde(skip_serializing_if = "GenerateConfig::is_empty")]
    generation_config: GenerateConfig,
}

impl From<LlmRequest> for GenerateContentRequest {
    fn from(request: LlmRequest) -> Self {
        Self {
            contents: request.contents,
            system_instruction: request
                .system_instruction
                .filter(|text| !text.trim().is_empty())
                .map(|text| SystemInstruction {
                    parts: vec![Part::text(text)],
                }),
            tools: request.tools,
            generation_config: request.config,
        }
    }
}

#[derive(Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    usage_metadata: Option<WireUsage>,
    error: Option<ErrorBody>,
}

impl GenerateContentResponse {
    fn into_llm_response(self) -> Result<LlmResponse> {
        if let Some(error) = self.error {
            return Err(RunnerError::Api {
                status: error.code.unwrap_or(500),
                message: error.describe(),
            });
        }

        let usage = self.usage_metadata.map(UsageMetadata::from);

        let Some(candidate) = self.candidates.into_iter().next() else {
            if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
                return Err(RunnerError::Blocked { reason });
            }
            return Ok(LlmResponse {
                usage,
                ..Default::default()
            });
        };

        Ok(LlmResponse {
            content: candidate.content,
            finish_reason: candidate.finish_reason,
            grounding: candidate
                .grounding_metadata
                .map(GroundingMetadata::from)
                .filter(|g| !g.is_empty()),
            usage,
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
    grounding_metadata: Option<WireGrounding>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireGrounding {
    #[serde(default)]
    web_search_queries: Vec<String>,
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Deserialize)]
struct GroundingChunk {
    web: Option<WebChunk>,
}

#[derive(Deserialize)]
struct WebChunk {
    uri: Option<String>,
    title: Option<String>,
}

impl From<WireGrounding> for GroundingMetadata {
    fn from(wire: WireGrounding) -> Self {
        Self {
            web_search_queries: wire.web_search_queries,
            sources: wire
                .grounding_chunks
                .into_iter()
                .filter_map(|chunk| chunk.web)
                .filter_map(|web| {
                    web.uri.map(|uri| GroundingSource {
                        uri,
                        title: web.title,
                    })
                })
                .collect(),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireUsage {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

impl From<WireUsage> for UsageMetadata {
    fn from(wire: WireUsage) -> Self {
        Self {
            prompt_tokens: wire.prompt_token_count,
            candidate_tokens: wire.candidates_token_count,
            total_tokens: wire.total_token_count,
        }
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    code: Option<u16>,
    message: Option<String>,
    status: Option<String>,
}

impl ErrorBody {
    fn describe(&self) -> String {
        let message = self.message.clone().unwrap_or_default();
        match self.status.as_deref() {
            Some(status) if !status.is_empty() => format!("{}: {}", status, message),
            _ => message,
        }
    }
}
