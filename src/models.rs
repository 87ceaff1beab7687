//! Data models and structures
//!
//! Defines the JSON contract of the relay's HTTP surface, the transient
//! request/result values passed between components, and runtime configuration.

use crate::image::ImagePayload;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// Body of a prior conversation turn. Binary content travels as a JSON array of bytes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Binary(Vec<u8>),
}

impl Default for MessageContent {
    fn default() -> Self {
        MessageContent::Text(String::new())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub role: Role,
    #[serde(default)]
    pub content: MessageContent,
    #[serde(default, alias = "mime_type", skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Text(text.into()),
            mime_type: None,
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            content: MessageContent::Text(text.into()),
            mime_type: None,
        }
    }

    pub fn model_binary(data: Vec<u8>, mime_type: Option<String>) -> Self {
        Self {
            role: Role::Model,
            content: MessageContent::Binary(data),
            mime_type,
        }
    }
}

// HTTP request/response models
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessImageRequest {
    pub image: Option<String>,
    pub prompt: Option<String>,
    pub chat_history: Option<Vec<ChatMessage>>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProcessImageResponse {
    pub text: String,
    pub image: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub provider_configured: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// One call's worth of input for the generation provider.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub image: ImagePayload,
    pub prompt: String,
    pub history: Vec<ChatMessage>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedImage {
    pub data: Vec<u8>,
    pub mime_type: String,
}

/// Accumulated provider output. The image and its MIME type travel together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationResult {
    pub text: String,
    pub image: Option<GeneratedImage>,
}

// Configuration
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash-exp";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";
pub const DEFAULT_PORT: u16 = 5000;

#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub provider_timeout: Duration,
    pub cors_origin: String,
    pub host: String,
    pub port: u16,
    pub static_dir: PathBuf,
    pub max_body_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            provider_timeout: Duration::from_secs(120),
            cors_origin: DEFAULT_CORS_ORIGIN.to_string(),
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            static_dir: PathBuf::from("static"),
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            gemini_api_key: var("GEMINI_API_KEY"),
            gemini_model: var("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            gemini_base_url: var("GEMINI_BASE_URL").unwrap_or(defaults.gemini_base_url),
            provider_timeout: match var("PROVIDER_TIMEOUT_SECS") {
                Some(v) => Duration::from_secs(parse_var("PROVIDER_TIMEOUT_SECS", &v)?),
                None => defaults.provider_timeout,
            },
            cors_origin: var("CORS_ORIGIN").unwrap_or(defaults.cors_origin),
            host: var("HOST").unwrap_or(defaults.host),
            port: match var("PORT") {
                Some(v) => parse_var("PORT", &v)?,
                None => defaults.port,
            },
            static_dir: var("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.static_dir),
            max_body_bytes: match var("MAX_BODY_BYTES") {
                Some(v) => parse_var("MAX_BODY_BYTES", &v)?,
                None => defaults.max_body_bytes,
            },
        })
    }

    pub fn provider_configured(&self) -> bool {
        self.gemini_api_key.is_some()
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{} has invalid value '{}'", key, value)))
}
