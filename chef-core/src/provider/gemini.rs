//! Google Gemini provider implementation
//!
//! Talks to the `generateContent` family of the Generative Language REST API:
//! - `POST {base}/models/{model}:generateContent`
//! - `POST {base}/models/{model}:streamGenerateContent?alt=sse`
//! - `GET  {base}/models`

use super::*;
use futures_util::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

/// Gemini provider
pub struct GeminiProvider {
    client: Client,
    config: ProviderConfig,
}

impl GeminiProvider {
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs.unwrap_or(120)))
            .build()
            .map_err(|e| ProviderError::Other(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn base_url(&self) -> &str {
        self.config
            .base_url
            .as_deref()
            .unwrap_or(GEMINI_BASE_URL)
            .trim_end_matches('/')
    }

    fn api_key(&self) -> Result<&str, ProviderError> {
        self.config
            .api_key
            .as_deref()
            .ok_or(ProviderError::AuthenticationFailed)
    }

    fn authorized(&self, req: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder, ProviderError> {
        let mut req = req.header("x-goog-api-key", self.api_key()?);
        for (key, value) in &self.config.headers {
            req = req.header(key, value);
        }
        Ok(req)
    }

    /// List models available to this key, following pagination.
    #[instrument(skip(self))]
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, ProviderError> {
        let mut models = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut req = self.client.get(format!("{}/models", self.base_url()));
            if let Some(token) = &page_token {
                req = req.query(&[("pageToken", token.as_str())]);
            }

            let response = self
                .authorized(req)?
                .send()
                .await
                .map_err(|e| ProviderError::Network(e.to_string()))?;

            if !response.status().is_success() {
                return Err(error_for_status(response, self.default_model()).await);
            }

            let page: ModelsResponse = response
                .json()
                .await
                .map_err(|e| ProviderError::Parse(e.to_string()))?;

            models.extend(page.models);
            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!(count = models.len(), "listed gemini models");
        Ok(models)
    }
}

impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn default_model(&self) -> &str {
        self.config
            .default_model
            .as_deref()
            .unwrap_or(GEMINI_DEFAULT_MODEL)
    }

    #[instrument(skip(self, request), fields(messages = request.messages.len()))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        let model = request
            .model
            .clone()
            .unwrap_or_else(|| self.default_model().to_string());
        let api_request = build_request(&request);

        let req = self
            .client
            .post(format!("{}/models/{}:generateContent", self.base_url(), model))
            .json(&api_request);

        let response = self
            .authorized(req)?
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(error_for_status(response, &model).await);
        }

        let api_response: GeminiResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        let completion = into_completion(api_response, &model)?;
        debug!(
            finish_reason = ?completion.finish_reason,
            tool_calls = completion.tool_calls.len(),
            total_tokens = completion.usage.total_tokens,
            "gemini completion"
        );
        Ok(completion)
    }

    #[instrument(skip(self, request), fields(messages = request.messages.len()))]
    async fn stream(&self, request: CompletionRequest) -> Result<StreamReceiver, ProviderError> {
        let model = request
            .model
            .clone()
            .unwrap_or_else(|| self.default_model().to_string());
        let api_request = build_request(&request);

        let req = self
            .client
            .post(format!(
                "{}/models/{}:streamGenerateContent",
                self.base_url(),
                model
            ))
            .query(&[("alt", "sse")])
            .json(&api_request);

        let response = self
            .authorized(req)?
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(error_for_status(response, &model).await);
        }

        let stream = async_stream::stream! {
            let mut byte_stream = response.bytes_stream();
            let mut events = SseEvents::default();

            while let Some(chunk_result) = byte_stream.next().await {
                let bytes = match chunk_result {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        yield StreamChunk::Error(e.to_string());
                        return;
                    }
                };

                for event in events.push(&bytes) {
                    for line in event.lines() {
                        let Some(data) = line.strip_prefix("data:") else {
                            continue;
                        };
                        let chunk: GeminiResponse = match serde_json::from_str(data.trim()) {
                            Ok(chunk) => chunk,
                            Err(e) => {
                                warn!(error = %e, "skipping malformed stream event");
                                continue;
                            }
                        };

                        let usage = chunk.usage_metadata.as_ref().map(UsageMetadata::to_usage);
                        for candidate in chunk.candidates {
                            let parts = candidate.content.map(|c| c.parts).unwrap_or_default();
                            for part in parts {
                                if let Some(text) = part.text {
                                    yield StreamChunk::Text(text);
                                }
                            }
                            if let Some(reason) = candidate.finish_reason.as_deref() {
                                yield StreamChunk::Done {
                                    finish_reason: map_finish_reason(reason, false),
                                    usage: usage.clone(),
                                };
                                return;
                            }
                        }
                    }
                }
            }
        };

        Ok(StreamReceiver::new(stream))
    }
}

/// Splits a server-sent event byte stream into whole events.
///
/// Bytes are held until a blank line closes the event, so a character split
/// across network chunks is decoded only once all of it has arrived.
#[derive(Debug, Default)]
struct SseEvents {
    buffer: Vec<u8>,
}

impl SseEvents {
    fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend(bytes.iter().copied().filter(|&b| b != b'\r'));

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.windows(2).position(|w| w == b"\n\n") {
            let event: Vec<u8> = self.buffer.drain(..pos + 2).take(pos).collect();
            events.push(String::from_utf8_lossy(&event).into_owned());
        }
        events
    }
}

// ============================================================================
// Request / response mapping
// ============================================================================

fn build_request(request: &CompletionRequest) -> GeminiRequest {
    let mut system_parts = Vec::new();
    let mut contents: Vec<GeminiContent> = Vec::new();

    for msg in &request.messages {
        match msg.role {
            Role::System => {
                if let Some(text) = &msg.content {
                    system_parts.push(GeminiPart::text(text));
                }
            }
            Role::User => contents.push(GeminiContent {
                role: Some("user".into()),
                parts: vec![GeminiPart::text(msg.content.as_deref().unwrap_or_default())],
            }),
            Role::Assistant => {
                let mut parts = Vec::new();
                if let Some(text) = msg.content.as_deref().filter(|t| !t.is_empty()) {
                    parts.push(GeminiPart::text(text));
                }
                for call in msg.tool_calls.iter().flatten() {
                    let args = serde_json::from_str(&call.arguments)
                        .unwrap_or_else(|_| serde_json::json!({}));
                    parts.push(GeminiPart {
                        function_call: Some(FunctionCall {
                            name: call.name.clone(),
                            args,
                        }),
                        ..Default::default()
                    });
                }
                contents.push(GeminiContent {
                    role: Some("model".into()),
                    parts,
                });
            }
            Role::Tool => {
                let part = GeminiPart {
                    function_response: Some(FunctionResponse {
                        name: msg.tool_call_id.clone().unwrap_or_default(),
                        response: serde_json::json!({
                            "content": msg.content.clone().unwrap_or_default()
                        }),
                    }),
                    ..Default::default()
                };
                // Consecutive tool results travel in one turn.
                match contents.last_mut() {
                    Some(last) if last.is_function_responses() => last.parts.push(part),
                    _ => contents.push(GeminiContent {
                        role: Some("user".into()),
                        parts: vec![part],
                    }),
                }
            }
        }
    }

    let system_instruction = (!system_parts.is_empty()).then(|| GeminiContent {
        role: None,
        parts: system_parts,
    });

    let tools = request.tools.as_ref().filter(|t| !t.is_empty()).map(|tools| {
        vec![GeminiTool {
            function_declarations: tools
                .iter()
                .map(|t| FunctionDeclaration {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: has_properties(&t.parameters).then(|| t.parameters.clone()),
                })
                .collect(),
        }]
    });

    let generation_config = GenerationConfig {
        temperature: request.temperature,
        top_p: request.top_p,
        max_output_tokens: request.max_tokens,
        stop_sequences: request.stop.clone(),
        response_mime_type: request
            .response_schema
            .as_ref()
            .map(|_| "application/json".to_string()),
        response_schema: request.response_schema.clone(),
    };

    GeminiRequest {
        contents,
        system_instruction,
        tools,
        generation_config: (!generation_config.is_empty()).then_some(generation_config),
    }
}

/// Gemini rejects object schemas with an empty `properties` map.
fn has_properties(schema: &serde_json::Value) -> bool {
    schema
        .get("properties")
        .and_then(|p| p.as_object())
        .map(|p| !p.is_empty())
        .unwrap_or(false)
}

fn into_completion(response: GeminiResponse, model: &str) -> Result<CompletionResponse, ProviderError> {
    let usage = response
        .usage_metadata
        .as_ref()
        .map(UsageMetadata::to_usage)
        .unwrap_or_default();

    let Some(candidate) = response.candidates.into_iter().next() else {
        let reason = response.prompt_feedback.and_then(|f| f.block_reason);
        return Err(match reason {
            Some(reason) => ProviderError::InvalidRequest(format!("prompt blocked: {}", reason)),
            None => ProviderError::EmptyResponse,
        });
    };

    let mut text = String::new();
    let mut tool_calls = Vec::new();
    for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
        if let Some(t) = part.text {
            text.push_str(&t);
        }
        if let Some(call) = part.function_call {
            tool_calls.push(ToolCall {
                id: call.name.clone(),
                name: call.name,
                arguments: call.args.to_string(),
            });
        }
    }

    let finish_reason = map_finish_reason(
        candidate.finish_reason.as_deref().unwrap_or_default(),
        !tool_calls.is_empty(),
    );

    Ok(CompletionResponse {
        id: response.response_id.unwrap_or_default(),
        model: response.model_version.unwrap_or_else(|| model.to_string()),
        content: (!text.is_empty()).then_some(text),
        tool_calls,
        finish_reason,
        usage,
    })
}

fn map_finish_reason(reason: &str, has_tool_calls: bool) -> FinishReason {
    if has_tool_calls {
        return FinishReason::ToolCalls;
    }
    match reason {
        "STOP" => FinishReason::Stop,
        "MAX_TOKENS" => FinishReason::Length,
        "SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT" | "SPII" => {
            FinishReason::ContentFilter
        }
        _ => FinishReason::Unknown,
    }
}

async fn error_for_status(response: reqwest::Response, model: &str) -> ProviderError {
    let status = response.status().as_u16();
    let retry_after = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());
    let text = response.text().await.unwrap_or_default();

    warn!(status, body = %text, "gemini request failed");

    match status {
        429 => ProviderError::RateLimited { retry_after },
        401 | 403 => ProviderError::AuthenticationFailed,
        400 if text.contains("API_KEY_INVALID") => ProviderError::AuthenticationFailed,
        404 => ProviderError::ModelNotFound(model.to_string()),
        _ => ProviderError::Api { status, message: text },
    }
}

// ============================================================================
// Gemini API Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<GeminiTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

impl GeminiContent {
    fn is_function_responses(&self) -> bool {
        !self.parts.is_empty() && self.parts.iter().all(|p| p.function_response.is_some())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_call: Option<FunctionCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_response: Option<FunctionResponse>,
}

impl GeminiPart {
    fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    args: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct FunctionResponse {
    name: String,
    response: serde_json::Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiTool {
    function_declarations: Vec<FunctionDeclaration>,
}

#[derive(Debug, Serialize)]
struct FunctionDeclaration {
    name: String,
    description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameters: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop_sequences: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<serde_json::Value>,
}

impl GenerationConfig {
    fn is_empty(&self) -> bool {
        self.temperature.is_none()
            && self.top_p.is_none()
            && self.max_output_tokens.is_none()
            && self.stop_sequences.is_none()
            && self.response_schema.is_none()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
    prompt_feedback: Option<PromptFeedback>,
    model_version: Option<String>,
    response_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: usize,
    #[serde(default)]
    candidates_token_count: usize,
    #[serde(default)]
    total_token_count: usize,
}

impl UsageMetadata {
    fn to_usage(&self) -> Usage {
        Usage {
            prompt_tokens: self.prompt_token_count,
            completion_tokens: self.candidates_token_count,
            total_tokens: self.total_token_count,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
    next_page_token: Option<String>,
}

/// A model entry from the `models` listing
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    /// Resource name, e.g. `models/gemini-2.0-flash`
    pub name: String,
    pub display_name: Option<String>,
    #[serde(default)]
    pub supported_generation_methods: Vec<String>,
}

impl ModelInfo {
    pub fn supports_generate_content(&self) -> bool {
        self.supported_generation_methods
            .iter()
            .any(|m| m == "generateContent")
    }
}
