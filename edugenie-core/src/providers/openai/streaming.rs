//! Streaming support for OpenAI responses

use super::converter::from_openai_stream_chunk;
use super::types::OpenAIStreamChunk;
use crate::providers::{ContentStream, ProviderError};
use bytes::Bytes;
use eventsource_stream::Eventsource;
use futures::{Stream, StreamExt};

/// Parse a Server-Sent Events stream from OpenAI into content fragments
pub fn parse_stream(
    stream: impl Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static,
) -> ContentStream {
    let event_stream = stream.eventsource();

    Box::pin(
        event_stream
            // The last message is "data: [DONE]"
            .take_while(|result| {
                let done = matches!(result, Ok(event) if event.data.trim() == "[DONE]");
                futures::future::ready(!done)
            })
            .filter_map(|result| async move {
                match result {
                    Ok(event) => match serde_json::from_str::<OpenAIStreamChunk>(&event.data) {
                        Ok(chunk) => from_openai_stream_chunk(chunk).map(Ok),
                        Err(e) => {
                            tracing::warn!("Failed to parse stream chunk: {}", e);
                            None
                        }
                    },
                    Err(e) => Some(Err(ProviderError::ParseError(format!("Stream error: {}", e)))),
                }
            }),
    )
}
