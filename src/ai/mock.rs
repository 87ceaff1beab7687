use super::{accumulate, GenerationService, ResponsePart};
use crate::models::{GenerationRequest, GenerationResult};
use crate::{Error, Result};
use async_trait::async_trait;
use futures_util::stream;
use std::sync::{Arc, Mutex};

/// Scripted provider. Every call replays the same parts through [`accumulate`].
pub struct MockGenerationClient {
    steps: Arc<Mutex<Vec<std::result::Result<ResponsePart, String>>>>,
    requests: Arc<Mutex<Vec<GenerationRequest>>>,
    call_count: Arc<Mutex<usize>>,
    configured: bool,
    failure: Option<String>,
}

impl MockGenerationClient {
    pub fn new() -> Self {
        Self {
            steps: Arc::new(Mutex::new(Vec::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
            configured: true,
            failure: None,
        }
    }

    pub fn with_text(self, text: &str) -> Self {
        self.with_part(ResponsePart::text(text))
    }

    pub fn with_image(self, mime_type: &str, data: Vec<u8>) -> Self {
        self.with_part(ResponsePart::inline_data(mime_type, data))
    }

    pub fn with_part(self, part: ResponsePart) -> Self {
        self.steps.lock().unwrap().push(Ok(part));
        self
    }

    /// Interrupt the stream at this point with a provider error.
    pub fn with_stream_error(self, message: &str) -> Self {
        self.steps.lock().unwrap().push(Err(message.to_string()));
        self
    }

    /// Fail before any output is produced.
    pub fn with_failure(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    pub fn unconfigured(mut self) -> Self {
        self.configured = false;
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    pub fn last_request(&self) -> Option<GenerationRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

impl Default for MockGenerationClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationService for MockGenerationClient {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        *self.call_count.lock().unwrap() += 1;
        self.requests.lock().unwrap().push(request.clone());

        if !self.configured {
            return Err(Error::ProviderConfig(
                "GEMINI_API_KEY environment variable is not set".to_string(),
            ));
        }
        if let Some(message) = &self.failure {
            return Err(Error::ProviderRequest(message.clone()));
        }

        let steps = self.steps.lock().unwrap().clone();
        accumulate(stream::iter(
            steps
                .into_iter()
                .map(|step| step.map_err(Error::ProviderRequest)),
        ))
        .await
    }
}
