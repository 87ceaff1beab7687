//! Server-sent-event decoding for `streamGenerateContent?alt=sse`.
//!
//! Network reads do not line up with event boundaries, so bytes are buffered
//! until a full line arrives. Each event's `data:` lines carry one JSON chunk.

use super::types::GenerateContentResponse;
use crate::{Error, Result};
use futures_util::{stream, Stream, StreamExt};
use std::collections::VecDeque;
use std::fmt::Display;
use std::pin::Pin;

#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    /// Bytes of `buffer` already known to hold no newline.
    scanned: usize,
    data: String,
}

impl SseDecoder {
    /// Feed raw bytes, returning every chunk completed by them.
    pub fn push(&mut self, bytes: &[u8]) -> Result<Vec<GenerateContentResponse>> {
        self.buffer.extend_from_slice(bytes);

        let mut buffer = std::mem::take(&mut self.buffer);
        let mut chunks = Vec::new();
        let mut start = 0;
        let mut search_from = self.scanned;
        while let Some(offset) = buffer[search_from..].iter().position(|b| *b == b'\n') {
            let end = search_from + offset;
            if let Some(chunk) = self.process_line(&buffer[start..=end])? {
                chunks.push(chunk);
            }
            start = end + 1;
            search_from = start;
        }

        buffer.drain(..start);
        self.scanned = buffer.len();
        self.buffer = buffer;
        Ok(chunks)
    }

    /// Flush an unterminated trailing line and any pending event at end of stream.
    pub fn finish(&mut self) -> Result<Option<GenerateContentResponse>> {
        let line = std::mem::take(&mut self.buffer);
        self.scanned = 0;
        if let Some(chunk) = self.process_line(&line)? {
            return Ok(Some(chunk));
        }
        self.dispatch()
    }

    fn process_line(&mut self, line: &[u8]) -> Result<Option<GenerateContentResponse>> {
        let line = String::from_utf8_lossy(line);
        let line = line.trim_end_matches(['\r', '\n']);

        if line.is_empty() {
            return self.dispatch();
        }

        // Other SSE fields (event, id, retry) and comments carry nothing we use.
        if let Some(data) = line.strip_prefix("data:") {
            if !self.data.is_empty() {
                self.data.push('\n');
            }
            self.data.push_str(data.strip_prefix(' ').unwrap_or(data));
        }
        Ok(None)
    }

    fn dispatch(&mut self) -> Result<Option<GenerateContentResponse>> {
        let data = std::mem::take(&mut self.data);
        let data = data.trim();
        if data.is_empty() || data == "[DONE]" {
            return Ok(None);
        }

        serde_json::from_str(data).map(Some).map_err(|e| {
            tracing::error!("Failed to parse Gemini stream chunk: {}\nData: {}", e, data);
            Error::ProviderRequest(format!("Failed to parse Gemini stream chunk: {}", e))
        })
    }
}

struct DecodeState<S> {
    body: Pin<Box<S>>,
    decoder: SseDecoder,
    ready: VecDeque<GenerateContentResponse>,
    finished: bool,
}

/// Turn a raw byte stream into a lazy stream of decoded chunks.
pub fn decode_stream<S, B, E>(body: S) -> impl Stream<Item = Result<GenerateContentResponse>>
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
{
    let state = DecodeState {
        body: Box::pin(body),
        decoder: SseDecoder::default(),
        ready: VecDeque::new(),
        finished: false,
    };
    stream::try_unfold(state, next_chunk::<S, B, E>)
}

async fn next_chunk<S, B, E>(
    mut state: DecodeState<S>,
) -> Result<Option<(GenerateContentResponse, DecodeState<S>)>>
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
{
    loop {
        if let Some(chunk) = state.ready.pop_front() {
            return Ok(Some((chunk, state)));
        }
        if state.finished {
            return Ok(None);
        }

        match state.body.next().await {
            Some(Ok(bytes)) => {
                let chunks = state.decoder.push(bytes.as_ref())?;
                state.ready.extend(chunks);
            }
            Some(Err(e)) => {
                tracing::error!("Gemini stream interrupted: {}", e);
                return Err(Error::ProviderRequest(format!(
                    "Gemini stream interrupted: {}",
                    e
                )));
            }
            None => {
                state.ready.extend(state.decoder.finish()?);
                state.finished = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::TryStreamExt;

    fn text_of(chunk: &GenerateContentResponse) -> String {
        use super::super::types::Part;
        chunk.candidates[0]
            .content
            .as_ref()
            .unwrap()
            .parts
            .iter()
            .filter_map(|p| match p {
                Part::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    const CHUNK_A: &str = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Hello, "}]}}]}"#;
    const CHUNK_B: &str = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"world"}]}}]}"#;

    #[test]
    fn test_decoder_handles_crlf_events() {
        let mut decoder = SseDecoder::default();
        let body = format!("data: {}\r\n\r\ndata: {}\r\n\r\n", CHUNK_A, CHUNK_B);

        let chunks = decoder.push(body.as_bytes()).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(text_of(&chunks[0]), "Hello, ");
        assert_eq!(text_of(&chunks[1]), "world");
        assert!(decoder.finish().unwrap().is_none());
    }

    #[test]
    fn test_decoder_buffers_split_lines() {
        let mut decoder = SseDecoder::default();
        let body = format!("data: {}\n\n", CHUNK_A);
        let (first, second) = body.as_bytes().split_at(17);

        assert!(decoder.push(first).unwrap().is_empty());
        let chunks = decoder.push(second).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(text_of(&chunks[0]), "Hello, ");
    }

    #[test]
    fn test_decoder_handles_byte_at_a_time_reads() {
        let mut decoder = SseDecoder::default();
        let body = format!("data: {}\n\ndata: {}\r\n\r\n", CHUNK_A, CHUNK_B);

        let mut chunks = Vec::new();
        for byte in body.as_bytes() {
            chunks.extend(decoder.push(std::slice::from_ref(byte)).unwrap());
        }

        assert_eq!(chunks.len(), 2);
        assert_eq!(text_of(&chunks[0]), "Hello, ");
        assert_eq!(text_of(&chunks[1]), "world");
        assert!(decoder.finish().unwrap().is_none());
    }

    #[test]
    fn test_decoder_keeps_partial_line_after_complete_ones() {
        let mut decoder = SseDecoder::default();
        let body = format!("data: {}\n\ndata: {}", CHUNK_A, CHUNK_B);
        let (first, second) = body.as_bytes().split_at(body.len() - 5);

        let chunks = decoder.push(first).unwrap();
        assert_eq!(chunks.len(), 1);
        assert!(decoder.push(second).unwrap().is_empty());

        let chunks = decoder.push(b"\n\n").unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(text_of(&chunks[0]), "world");
    }

    #[test]
    fn test_decoder_flushes_unterminated_event() {
        let mut decoder = SseDecoder::default();
        assert!(decoder
            .push(format!("data: {}", CHUNK_B).as_bytes())
            .unwrap()
            .is_empty());

        let chunk = decoder.finish().unwrap().unwrap();
        assert_eq!(text_of(&chunk), "world");
    }

    #[test]
    fn test_decoder_ignores_comments_and_other_fields() {
        let mut decoder = SseDecoder::default();
        let body = format!(": keep-alive\nevent: message\ndata: {}\n\n", CHUNK_A);

        let chunks = decoder.push(body.as_bytes()).unwrap();
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn test_decoder_rejects_malformed_json() {
        let mut decoder = SseDecoder::default();
        let err = decoder.push(b"data: {not json\n\n").unwrap_err();
        assert!(matches!(err, Error::ProviderRequest(_)));
    }

    #[tokio::test]
    async fn test_decode_stream_across_reads() {
        let body = format!("data: {}\n\ndata: {}\n\n", CHUNK_A, CHUNK_B);
        let reads: Vec<std::result::Result<Vec<u8>, String>> = body
            .as_bytes()
            .chunks(7)
            .map(|c| Ok(c.to_vec()))
            .collect();

        let chunks: Vec<_> = decode_stream(stream::iter(reads))
            .try_collect()
            .await
            .unwrap();

        assert_eq!(chunks.len(), 2);
        assert_eq!(text_of(&chunks[1]), "world");
    }

    #[tokio::test]
    async fn test_decode_stream_surfaces_transport_errors() {
        let reads: Vec<std::result::Result<Vec<u8>, String>> = vec![
            Ok(format!("data: {}\n\n", CHUNK_A).into_bytes()),
            Err("connection reset by peer".to_string()),
        ];

        let result: Result<Vec<_>> = decode_stream(stream::iter(reads)).try_collect().await;
        let err = result.unwrap_err();
        assert!(err.to_string().contains("connection reset by peer"));
    }
}
