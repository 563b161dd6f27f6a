//! Completion invocation and chunk stitching

use super::detector::{needs_continuation, strip_marker};
use super::turns::CONTINUE_TURN;
use super::{ChatProfile, ContinuationError};
use crate::protocol::{CompletionRequest, CompletionResult, ConversationTurn};
use crate::providers::{CompletionService, ProviderResult};
use tracing::{debug, warn};
use uuid::Uuid;

/// Issue one completion call for the composed turns
pub async fn invoke(
    service: &dyn CompletionService,
    model: &str,
    profile: &ChatProfile,
    turns: &[ConversationTurn],
    request_id: Option<Uuid>,
) -> ProviderResult<CompletionResult> {
    let mut request = CompletionRequest::new(model, turns.to_vec())
        .with_temperature(profile.temperature)
        .with_max_tokens(profile.budget.max_output_tokens)
        .with_request_id(request_id);
    if let Some(top_p) = profile.top_p {
        request = request.with_top_p(top_p);
    }
    service.complete(request).await
}

/// Where the stitching loop is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StitchState {
    AwaitingFirstChunk,
    Accumulating,
    Done,
}

/// Text gathered across chunks of one reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkAccumulator {
    combined_text: String,
    chunk_count: u32,
    needs_more: bool,
}

impl ChunkAccumulator {
    fn start(first_chunk: &str, needs_more: bool) -> Self {
        Self {
            combined_text: first_chunk.to_string(),
            chunk_count: 1,
            needs_more,
        }
    }

    fn append(&mut self, chunk: &str) {
        if chunk.is_empty() {
            return;
        }
        if !self.combined_text.is_empty() {
            self.combined_text.push_str("\n\n");
        }
        self.combined_text.push_str(chunk);
    }

    pub fn chunk_count(&self) -> u32 {
        self.chunk_count
    }

    pub fn needs_more(&self) -> bool {
        self.needs_more
    }
}

/// Final product of a stitched reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StitchOutcome {
    /// Marker-stripped chunks joined by blank lines
    pub text: String,

    /// True only when the chunk ceiling stopped a still-truncated reply
    pub has_more: bool,

    /// Completion calls made
    pub chunk_count: u32,
}

/// Drives completion calls until a reply is complete or the ceiling is hit
pub struct ChunkStitcher<'a> {
    service: &'a dyn CompletionService,
    profile: &'a ChatProfile,
    model: String,
    request_id: Option<Uuid>,
}

impl<'a> ChunkStitcher<'a> {
    /// Create a stitcher using the service's default model
    pub fn new(service: &'a dyn CompletionService, profile: &'a ChatProfile) -> Self {
        Self {
            service,
            profile,
            model: service.default_model().to_string(),
            request_id: None,
        }
    }

    /// Override the model identifier
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Tag every chunk's call with the caller's request id
    pub fn with_request_id(mut self, request_id: Uuid) -> Self {
        self.request_id = Some(request_id);
        self
    }

    fn next_state(&self, accumulator: &ChunkAccumulator) -> StitchState {
        if accumulator.needs_more && accumulator.chunk_count < self.profile.budget.chunk_limit() {
            StitchState::Accumulating
        } else {
            StitchState::Done
        }
    }

    /// Run the loop over the composed turns.
    ///
    /// An empty first reply is an error. An empty reply after that ends the
    /// loop with whatever was gathered so far. Any provider error discards
    /// the accumulated text.
    pub async fn run(&self, mut turns: Vec<ConversationTurn>) -> Result<StitchOutcome, ContinuationError> {
        let mut state = StitchState::AwaitingFirstChunk;
        debug!("Stitch state: {:?}", state);

        let first = invoke(self.service, &self.model, self.profile, &turns, self.request_id).await?;
        if first.is_empty() {
            return Err(ContinuationError::EmptyResponse);
        }

        let mut last_chunk = strip_marker(&first.text);
        let mut accumulator = ChunkAccumulator::start(&last_chunk, needs_continuation(&first));
        state = self.next_state(&accumulator);

        while state == StitchState::Accumulating {
            debug!(
                "Stitch state: {:?}, fetching chunk {}",
                state,
                accumulator.chunk_count + 1
            );
            turns.push(ConversationTurn::assistant(last_chunk));
            turns.push(ConversationTurn::user(CONTINUE_TURN));

            let next = invoke(self.service, &self.model, self.profile, &turns, self.request_id).await?;
            accumulator.chunk_count += 1;

            if next.is_empty() {
                warn!(
                    "Empty reply at chunk {}; returning {} chars gathered so far",
                    accumulator.chunk_count,
                    accumulator.combined_text.len()
                );
                accumulator.needs_more = false;
                break;
            }

            last_chunk = strip_marker(&next.text);
            accumulator.append(&last_chunk);
            accumulator.needs_more = needs_continuation(&next);
            state = self.next_state(&accumulator);
        }

        let text = accumulator.combined_text.trim().to_string();
        if text.is_empty() {
            return Err(ContinuationError::EmptyResponse);
        }

        let has_more = accumulator.needs_more && accumulator.chunk_count >= self.profile.budget.chunk_limit();
        debug!(
            "Stitch state: {:?} after {} chunk(s), has_more={}",
            StitchState::Done,
            accumulator.chunk_count,
            has_more
        );

        Ok(StitchOutcome {
            text,
            has_more,
            chunk_count: accumulator.chunk_count,
        })
    }
}
