//! Folding delta events into the final commit message.

use crate::error::LlmError;
use crate::llm::decoder::DeltaEvent;

/// Text collected from one response stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregationResult {
    /// The commit message.
    pub content: String,
    /// Reasoning trace, never part of the message.
    pub reasoning: String,
}

/// Accumulates deltas in arrival order.
#[derive(Debug, Default)]
pub struct Aggregator {
    content: String,
    reasoning: String,
    done: bool,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one event. Events after `Done` are ignored.
    pub fn push(&mut self, event: DeltaEvent) {
        if self.done {
            return;
        }
        match event {
            DeltaEvent::Content(text) => self.content.push_str(&text),
            DeltaEvent::Reasoning(text) => self.reasoning.push_str(&text),
            DeltaEvent::Done => self.done = true,
        }
    }

    /// Produce the result, trimming newlines around the content.
    ///
    /// # Errors
    ///
    /// * `EmptyResult` if no content text was received
    pub fn finish(self) -> Result<AggregationResult, LlmError> {
        let content = self
            .content
            .trim_matches(|c| c == '\n' || c == '\r')
            .to_string();
        if content.is_empty() {
            return Err(LlmError::EmptyResult);
        }
        Ok(AggregationResult {
            content,
            reasoning: self.reasoning,
        })
    }
}

/// Aggregate a complete event sequence.
pub fn aggregate(
    events: impl IntoIterator<Item = DeltaEvent>,
) -> Result<AggregationResult, LlmError> {
    let mut aggregator = Aggregator::new();
    for event in events {
        aggregator.push(event);
    }
    aggregator.finish()
}
