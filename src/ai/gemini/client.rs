use super::sse;
use super::types::{GenerateContentRequest, GenerateContentResponse};
use crate::models::DEFAULT_GEMINI_BASE_URL;
use crate::{Error, Result};
use futures_util::Stream;
use reqwest::Client;
use std::time::Duration;

/// Lightweight Gemini REST client for the streaming `generateContent` endpoint.
pub struct GeminiHttpClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl GeminiHttpClient {
    /// Construct a Gemini client on a shared `reqwest::Client`.
    ///
    /// `model` should be the bare model ID (for example `gemini-2.0-flash-exp`);
    /// a leading `models/` segment is stripped.
    pub fn new_with_client(
        api_key: String,
        model: String,
        timeout: Duration,
        client: Client,
    ) -> Self {
        let model = model.strip_prefix("models/").unwrap_or(&model).to_string();

        Self {
            client,
            api_key,
            model,
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            timeout,
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Returns the configured model ID without the `models/` prefix.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Calls `streamGenerateContent` and returns the decoded chunks as a lazy stream.
    ///
    /// The request is sent and its status checked before this returns; the
    /// body is read only as the stream is polled.
    pub async fn stream_generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<impl Stream<Item = Result<GenerateContentResponse>>> {
        let url = format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse",
            self.base_url, self.model
        );

        tracing::debug!("Sending streamGenerateContent request to Gemini ({})", self.model);

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send request to Gemini: {}", e);
                Error::ProviderRequest(format!("Failed to send request to Gemini: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            tracing::error!("Gemini API error (status {}): {}", status, error_text);
            return Err(Error::ProviderRequest(format!(
                "Gemini API error (status {}): {}",
                status, error_text
            )));
        }

        Ok(sse::decode_stream(response.bytes_stream()))
    }
}
