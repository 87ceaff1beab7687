use base64::Engine as _;
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockBuilder, ResponseTemplate};

pub const STREAM_GENERATE_CONTENT_PATH_REGEX: &str =
    r"^/v1beta/models/[^/]+:streamGenerateContent$";

pub fn post_path_regex(regex: &str) -> MockBuilder {
    Mock::given(method("POST")).and(path_regex(regex))
}

/// Serialize chunks the way Gemini frames them with `alt=sse`.
pub fn sse_response(chunks: &[serde_json::Value]) -> ResponseTemplate {
    let body: String = chunks
        .iter()
        .map(|chunk| format!("data: {}\r\n\r\n", chunk))
        .collect();
    ResponseTemplate::new(200).set_body_raw(body, "text/event-stream")
}

pub fn text_chunk(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] }
        }]
    })
}

pub fn image_chunk(mime_type: &str, data: &[u8]) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{
            "content": {
                "role": "model",
                "parts": [{
                    "inlineData": {
                        "mimeType": mime_type,
                        "data": base64::engine::general_purpose::STANDARD.encode(data)
                    }
                }]
            }
        }]
    })
}
