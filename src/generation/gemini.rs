//! Gemini `generateContent` adapter

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{
    ContextRole, GenerationError, GenerationErrorKind, GenerationRequest, Generator,
};

/// Gemini REST API base URL
const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Default request timeout
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Generator backed by the Gemini API
#[derive(Clone)]
pub struct GeminiGenerator {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiGenerator {
    /// Create a generator for `model`
    #[must_use]
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| Client::new());

        let model = model.into();
        let model = model
            .strip_prefix("models/")
            .map_or_else(|| model.clone(), str::to_string);

        Self {
            client,
            api_key: api_key.into(),
            model,
            base_url: API_BASE.to_string(),
        }
    }

    /// Point the generator at a different API root
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Model name without the `models/` prefix
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl Generator for GeminiGenerator {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> std::result::Result<String, GenerationError> {
        let body = GenerateContentRequest::from_request(request);

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::classified(format!("Gemini request failed: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| GenerationError::classified(format!("Gemini response read error: {e}")))?;

        if !status.is_success() {
            return Err(map_http_error(status.as_u16(), &text));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&text).map_err(|e| {
            GenerationError::new(
                GenerationErrorKind::Other,
                format!("Gemini response parse error: {e}"),
            )
        })?;

        let reply = parsed.text();
        if reply.trim().is_empty() {
            return Err(GenerationError::new(
                GenerationErrorKind::Other,
                "Gemini returned no text in the response candidates",
            ));
        }

        tracing::debug!(
            model = %self.model,
            chars = reply.chars().count(),
            "Gemini reply received"
        );
        Ok(reply)
    }
}

/// Build an error from a non-success response, status first then body keywords
fn map_http_error(status: u16, body: &str) -> GenerationError {
    let detail = serde_json::from_str::<ErrorWrapper>(body)
        .ok()
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_default();
            if status_text.is_empty() {
                msg
            } else {
                format!("{status_text}: {msg}")
            }
        })
        .filter(|detail| !detail.is_empty())
        .unwrap_or_else(|| body.to_string());

    let message = format!("Gemini API error {status}: {detail}");
    let kind = GenerationErrorKind::from_status(status)
        .unwrap_or_else(|| GenerationErrorKind::classify(body));

    GenerationError::new(kind, message)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

impl GenerateContentRequest {
    fn from_request(request: &GenerationRequest) -> Self {
        let mut contents: Vec<Content> = request
            .context
            .iter()
            .map(|turn| Content::text(Some(turn.role), &turn.text))
            .collect();
        contents.push(Content::text(Some(ContextRole::User), &request.input));

        Self {
            system_instruction: Content::text(None, &request.system_instruction),
            contents,
            generation_config: GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_output_tokens,
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part>,
}

impl Content {
    fn text(role: Option<ContextRole>, text: &str) -> Self {
        Self {
            role: role.map(ContextRole::as_str),
            parts: vec![Part {
                text: text.to_string(),
            }],
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}
