//! Conversion between the EduGenie protocol and the OpenAI format

use super::types::*;
use crate::protocol::{CompletionRequest, CompletionResult, ConversationTurn};

/// Convert a CompletionRequest to OpenAI format
pub fn to_openai_request(request: &CompletionRequest) -> OpenAIRequest {
    OpenAIRequest {
        model: request.model.clone(),
        messages: request.messages.iter().map(to_openai_message).collect(),
        temperature: request.temperature,
        max_tokens: request.max_tokens,
        top_p: request.top_p,
        stream: request.stream,
    }
}

fn to_openai_message(turn: &ConversationTurn) -> OpenAIMessage {
    OpenAIMessage {
        role: turn.role.as_str().to_string(),
        content: Some(turn.content.clone()),
    }
}

/// Convert an OpenAI response to a CompletionResult
///
/// Only the first choice is read; missing text or finish reason become "".
pub fn from_openai_response(response: OpenAIResponse) -> CompletionResult {
    let Some(choice) = response.choices.into_iter().next() else {
        return CompletionResult::default();
    };

    CompletionResult {
        text: choice
            .message
            .and_then(|message| message.content)
            .unwrap_or_default(),
        finish_reason: choice.finish_reason.unwrap_or_default(),
    }
}

/// Content fragment carried by a stream chunk, if any
pub fn from_openai_stream_chunk(chunk: OpenAIStreamChunk) -> Option<String> {
    chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .filter(|content| !content.is_empty())
}
