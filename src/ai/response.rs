use crate::models::{GeneratedImage, GenerationResult};
use crate::{Error, Result};
use futures_util::{Stream, StreamExt};

/// Provider-neutral unit of streamed output.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponsePart {
    Text(String),
    InlineData { mime_type: String, data: Vec<u8> },
}

impl ResponsePart {
    pub fn text(text: impl Into<String>) -> Self {
        ResponsePart::Text(text.into())
    }

    pub fn inline_data(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        ResponsePart::InlineData {
            mime_type: mime_type.into(),
            data,
        }
    }
}

/// Drain a response stream, concatenating text and keeping the first inline image.
///
/// Any error in the stream aborts the whole call; nothing partial is returned.
pub async fn accumulate<S>(parts: S) -> Result<GenerationResult>
where
    S: Stream<Item = Result<ResponsePart>>,
{
    let mut parts = std::pin::pin!(parts);
    let mut result = GenerationResult::default();

    while let Some(part) = parts.next().await {
        match part? {
            ResponsePart::Text(text) => result.text.push_str(&text),
            ResponsePart::InlineData { mime_type, data } => {
                if let Some(kept) = &result.image {
                    tracing::warn!(
                        "Ignoring additional inline {} part ({} bytes); keeping first {} image",
                        mime_type,
                        data.len(),
                        kept.mime_type
                    );
                    continue;
                }
                tracing::debug!("Provider returned {} image ({} bytes)", mime_type, data.len());
                result.image = Some(GeneratedImage { data, mime_type });
            }
        }
    }

    if result.text.is_empty() && result.image.is_none() {
        return Err(Error::ProviderRequest(
            "Provider returned an empty response".to_string(),
        ));
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;
    use pretty_assertions::assert_eq;

    fn ok_stream(parts: Vec<ResponsePart>) -> impl Stream<Item = Result<ResponsePart>> {
        stream::iter(parts.into_iter().map(Ok))
    }

    #[tokio::test]
    async fn test_text_chunks_are_concatenated() {
        let result = accumulate(ok_stream(vec![
            ResponsePart::text("Hello, "),
            ResponsePart::text("world"),
        ]))
        .await
        .unwrap();

        assert_eq!(result.text, "Hello, world");
        assert_eq!(result.image, None);
    }

    #[tokio::test]
    async fn test_image_then_text() {
        let result = accumulate(ok_stream(vec![
            ResponsePart::inline_data("image/png", vec![1, 2, 3]),
            ResponsePart::text("Here is "),
            ResponsePart::text("your image"),
        ]))
        .await
        .unwrap();

        assert_eq!(result.text, "Here is your image");
        assert_eq!(
            result.image,
            Some(GeneratedImage {
                data: vec![1, 2, 3],
                mime_type: "image/png".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_first_image_wins() {
        let result = accumulate(ok_stream(vec![
            ResponsePart::inline_data("image/png", vec![1]),
            ResponsePart::inline_data("image/jpeg", vec![2]),
        ]))
        .await
        .unwrap();

        let image = result.image.unwrap();
        assert_eq!(image.data, vec![1]);
        assert_eq!(image.mime_type, "image/png");
    }

    #[tokio::test]
    async fn test_image_only_result_has_empty_text() {
        let result = accumulate(ok_stream(vec![ResponsePart::inline_data(
            "image/webp",
            vec![9],
        )]))
        .await
        .unwrap();

        assert!(result.text.is_empty());
        assert!(result.image.is_some());
    }

    #[tokio::test]
    async fn test_empty_stream_is_an_error() {
        let err = accumulate(ok_stream(vec![])).await.unwrap_err();
        assert!(matches!(err, Error::ProviderRequest(_)));
    }

    #[tokio::test]
    async fn test_mid_stream_error_discards_partial_output() {
        let parts = stream::iter(vec![
            Ok(ResponsePart::text("partial")),
            Err(Error::ProviderRequest("connection reset".to_string())),
            Ok(ResponsePart::text("never seen")),
        ]);

        let err = accumulate(parts).await.unwrap_err();
        assert!(err.to_string().contains("connection reset"));
    }
}
