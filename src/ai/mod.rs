//! Generative provider integration
//!
//! Sends an image, a prompt and prior conversation turns to the provider and
//! folds its streamed reply into text plus at most one generated image.

pub mod gemini;
pub mod mock;
pub mod response;

pub use gemini::GeminiGenerationClient;
pub use mock::MockGenerationClient;
pub use response::{accumulate, ResponsePart};

use crate::models::{GenerationRequest, GenerationResult};
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Whether a provider credential is present. Never touches the network.
    fn is_configured(&self) -> bool;

    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult>;
}
