use super::AppState;
use crate::image::{decode_inbound_image, encode_for_transport, mime};
use crate::models::{GenerationRequest, ProcessImageRequest, ProcessImageResponse};
use crate::{Error, Result};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use std::sync::Arc;

pub fn add_route(app: Router<Arc<AppState>>) -> Router<Arc<AppState>> {
    app.route("/process-image", post(process_image))
}

async fn process_image(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<ProcessImageRequest>, JsonRejection>,
) -> Result<Json<ProcessImageResponse>> {
    let Json(request) = payload.map_err(|e| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Error::PayloadTooLarge(e.body_text())
        } else {
            Error::ClientInput(format!("Invalid JSON body: {}", e.body_text()))
        }
    })?;

    let (raw_image, prompt) = required_fields(request.image, request.prompt)?;
    let history = request.chat_history.unwrap_or_default();

    let image = tokio::task::spawn_blocking(move || decode_inbound_image(&raw_image))
        .await
        .map_err(|e| Error::Internal(format!("Image decoding task join error: {}", e)))??;

    tracing::info!(
        "Processing {} image ({} bytes) with {} history turns",
        image.format,
        image.bytes.len(),
        history.len()
    );

    let generation = GenerationRequest {
        image,
        prompt,
        history,
    };
    let result = state.generator.generate(&generation).await?;

    let (image, image_url) = match result.image {
        Some(generated) => {
            let artifact = state
                .store
                .save(&generated.data, &generated.mime_type)
                .await?;
            let format = mime::subtype(&generated.mime_type).unwrap_or("png");
            (
                Some(encode_for_transport(&generated.data, format)),
                Some(artifact.url),
            )
        }
        None => (None, None),
    };

    Ok(Json(ProcessImageResponse {
        text: result.text,
        image,
        image_url,
    }))
}

/// Both fields must be present and non-empty; the error names every missing one.
fn required_fields(image: Option<String>, prompt: Option<String>) -> Result<(String, String)> {
    let image = image.filter(|s| !s.is_empty());
    let prompt = prompt.filter(|s| !s.is_empty());

    match (image, prompt) {
        (Some(image), Some(prompt)) => Ok((image, prompt)),
        (image, prompt) => {
            let missing: Vec<&str> = [("'image'", image.is_none()), ("'prompt'", prompt.is_none())]
                .into_iter()
                .filter_map(|(name, absent)| absent.then_some(name))
                .collect();
            let verb = if missing.len() > 1 { "are" } else { "is" };
            Err(Error::ClientInput(format!(
                "Missing required fields: {} {} required",
                missing.join(" and "),
                verb
            )))
        }
    }
}
