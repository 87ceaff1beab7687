use super::client::GeminiHttpClient;
use super::types::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part,
};
use crate::ai::{accumulate, GenerationService, ResponsePart};
use crate::models::{
    ChatMessage, Config, GenerationRequest, GenerationResult, MessageContent, Role,
};
use crate::{Error, Result};
use async_trait::async_trait;
use base64::Engine as _;
use futures_util::{stream, StreamExt, TryStreamExt};
use std::time::Duration;

/// Image + text generation against Gemini's streaming endpoint.
///
/// Holds no HTTP client when no credential is configured, so an unconfigured
/// deployment fails before any network call.
pub struct GeminiGenerationClient {
    http: Option<GeminiHttpClient>,
    generation_config: GenerationConfig,
}

impl GeminiGenerationClient {
    pub fn new(api_key: Option<String>, model: String) -> Self {
        Self::new_with_client(
            api_key,
            model,
            Duration::from_secs(120),
            reqwest::Client::new(),
        )
    }

    pub fn new_with_client(
        api_key: Option<String>,
        model: String,
        timeout: Duration,
        client: reqwest::Client,
    ) -> Self {
        Self {
            http: api_key.map(|key| GeminiHttpClient::new_with_client(key, model, timeout, client)),
            generation_config: GenerationConfig::default(),
        }
    }

    pub fn from_config(config: &Config, client: reqwest::Client) -> Self {
        Self::new_with_client(
            config.gemini_api_key.clone(),
            config.gemini_model.clone(),
            config.provider_timeout,
            client,
        )
        .with_base_url(config.gemini_base_url.clone())
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.http = self.http.map(|http| http.with_base_url(base_url));
        self
    }
}

/// Build the provider request: image and prompt first, then prior turns in order.
pub fn build_request(
    request: &GenerationRequest,
    generation_config: &GenerationConfig,
) -> GenerateContentRequest {
    let mut contents = vec![Content::new(
        "user",
        vec![
            Part::inline_data(&request.image.mime_type, &request.image.bytes),
            Part::text(&request.prompt),
        ],
    )];

    contents.extend(
        request
            .history
            .iter()
            .enumerate()
            .filter_map(|(index, message)| history_content(index, message)),
    );

    GenerateContentRequest {
        contents,
        generation_config: generation_config.clone(),
    }
}

fn history_content(index: usize, message: &ChatMessage) -> Option<Content> {
    match (message.role, &message.content) {
        (Role::User, MessageContent::Text(text)) => {
            Some(Content::new("user", vec![Part::text(text)]))
        }
        (Role::User, MessageContent::Binary(_)) => {
            tracing::warn!(
                "Skipping chat history entry {}: user turns are sent as text only",
                index
            );
            None
        }
        (Role::Model, MessageContent::Text(text)) => {
            Some(Content::new("model", vec![Part::text(text)]))
        }
        (Role::Model, MessageContent::Binary(data)) => match &message.mime_type {
            Some(mime_type) => Some(Content::new(
                "model",
                vec![Part::inline_data(mime_type, data)],
            )),
            None => {
                tracing::warn!(
                    "Skipping chat history entry {}: binary model turn has no MIME type",
                    index
                );
                None
            }
        },
    }
}

/// Flatten one streamed chunk into response parts.
fn chunk_parts(chunk: GenerateContentResponse) -> Result<Vec<ResponsePart>> {
    if let Some(error) = chunk.error {
        tracing::error!(
            "Gemini stream aborted (code {:?}, status {:?}): {}",
            error.code,
            error.status,
            error.message
        );
        return Err(Error::ProviderRequest(format!(
            "Gemini stream error ({}): {}",
            error.status.as_deref().unwrap_or("UNKNOWN"),
            error.message
        )));
    }

    if let Some(reason) = chunk.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(Error::ProviderRequest(format!(
            "Gemini blocked the prompt: {}",
            reason
        )));
    }

    let Some(candidate) = chunk.candidates.into_iter().next() else {
        return Ok(Vec::new());
    };

    if let Some(reason) = candidate.finish_reason.as_deref() {
        if reason != "STOP" {
            tracing::warn!("Gemini finished with reason {}", reason);
        }
    }

    let Some(content) = candidate.content else {
        return Ok(Vec::new());
    };

    content
        .parts
        .into_iter()
        .filter_map(|part| match part {
            Part::Text { text } => Some(Ok(ResponsePart::Text(text))),
            Part::InlineData { inline_data } => Some(
                base64::engine::general_purpose::STANDARD
                    .decode(&inline_data.data)
                    .map(|data| ResponsePart::InlineData {
                        mime_type: inline_data.mime_type,
                        data,
                    })
                    .map_err(|e| {
                        Error::ProviderRequest(format!(
                            "Failed to decode Gemini base64 image: {}",
                            e
                        ))
                    }),
            ),
            Part::Other(value) => {
                tracing::debug!("Ignoring unsupported Gemini part: {}", value);
                None
            }
        })
        .collect()
}

#[async_trait]
impl GenerationService for GeminiGenerationClient {
    fn is_configured(&self) -> bool {
        self.http.is_some()
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        let http = self.http.as_ref().ok_or_else(|| {
            Error::ProviderConfig("GEMINI_API_KEY environment variable is not set".to_string())
        })?;

        tracing::info!(
            "Requesting generation from Gemini (model: {}, history turns: {})",
            http.model(),
            request.history.len()
        );

        let body = build_request(request, &self.generation_config);
        let chunks = http.stream_generate_content(&body).await?;

        let parts = chunks
            .map(|chunk| chunk.and_then(chunk_parts))
            .map_ok(|parts| stream::iter(parts.into_iter().map(Ok::<_, Error>)))
            .try_flatten();

        let result = accumulate(parts).await?;

        tracing::info!(
            "Gemini response complete: {} chars of text, image: {}",
            result.text.len(),
            result
                .image
                .as_ref()
                .map(|i| i.mime_type.as_str())
                .unwrap_or("none")
        );

        Ok(result)
    }
}
