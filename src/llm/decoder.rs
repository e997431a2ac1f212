//! Incremental decoding of streamed completion responses.
//!
//! Both supported protocols stream one JSON record per line. Ollama emits
//! bare NDJSON:
//! ```text
//! {"model":"llama3.2","response":"fix: ","done":false}
//! {"model":"llama3.2","response":"typo","done":false}
//! ```
//! OpenAI-compatible services use SSE framing and end with a sentinel:
//! ```text
//! data: {"choices":[{"delta":{"content":"fix: typo"}}]}
//!
//! data: [DONE]
//! ```
//!
//! Reads from the network can end anywhere, including inside a JSON value or
//! a multi-byte character, so the decoder keeps the unterminated tail of each
//! read in `carry` and only parses lines once their newline has arrived.

use serde_json::Value;
use tracing::debug;

use crate::llm::registry::ProtocolKind;

/// End-of-stream marker, after the `data:` prefix is removed.
const SENTINEL: &str = "[DONE]";

/// Event-stream field prefix.
const SSE_DATA_PREFIX: &str = "data:";

/// One decoded fragment of a streamed response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeltaEvent {
    /// Answer text.
    Content(String),
    /// Reasoning text, kept apart from the answer.
    Reasoning(String),
    /// No further events follow.
    Done,
}

/// Line-oriented decoder for one response stream.
#[derive(Debug)]
pub struct StreamDecoder {
    protocol: ProtocolKind,
    carry: Vec<u8>,
    done: bool,
}

impl StreamDecoder {
    pub fn new(protocol: ProtocolKind) -> Self {
        Self {
            protocol,
            carry: Vec::new(),
            done: false,
        }
    }

    /// Whether `Done` has been emitted.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Bytes received after the last complete line.
    pub fn carry(&self) -> &[u8] {
        &self.carry
    }

    /// Decode one read from the response body.
    ///
    /// Only newline-terminated lines are processed; the remainder is held
    /// back until the next call.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<DeltaEvent> {
        let mut events = Vec::new();
        if self.done {
            return events;
        }

        self.carry.extend_from_slice(chunk);
        let Some(last_newline) = self.carry.iter().rposition(|&b| b == b'\n') else {
            return events;
        };

        let rest = self.carry.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.carry, rest);

        for line in complete.split(|&b| b == b'\n') {
            self.process_line(line, &mut events);
            if self.done {
                self.carry.clear();
                break;
            }
        }
        events
    }

    /// Signal end of input.
    ///
    /// Whatever is left in `carry` is complete now and gets processed before
    /// `Done` is emitted.
    pub fn finish(&mut self) -> Vec<DeltaEvent> {
        let mut events = Vec::new();
        if self.done {
            return events;
        }

        let tail = std::mem::take(&mut self.carry);
        self.process_line(&tail, &mut events);
        if !self.done {
            self.done = true;
            events.push(DeltaEvent::Done);
        }
        events
    }

    fn process_line(&mut self, raw: &[u8], events: &mut Vec<DeltaEvent>) {
        let text = String::from_utf8_lossy(raw);
        let mut line = text.trim();
        if line.is_empty() {
            return;
        }

        if let Some(stripped) = line.strip_prefix(SSE_DATA_PREFIX) {
            line = stripped.trim_start();
        }

        if line == SENTINEL {
            self.done = true;
            events.push(DeltaEvent::Done);
            return;
        }

        let record: Value = match serde_json::from_str(line) {
            Ok(record) => record,
            Err(e) => {
                debug!(error = %e, line, "skipping malformed stream record");
                return;
            }
        };
        if !record.as_object().is_some_and(|fields| !fields.is_empty()) {
            return;
        }

        match self.protocol {
            ProtocolKind::Ollama => ollama_deltas(&record, events),
            ProtocolKind::OpenAiCompatible => chat_deltas(&record, events),
        }
    }
}

fn ollama_deltas(record: &Value, events: &mut Vec<DeltaEvent>) {
    if let Some(text) = non_empty_str(&record["response"]) {
        events.push(DeltaEvent::Content(text.to_string()));
    }
}

fn chat_deltas(record: &Value, events: &mut Vec<DeltaEvent>) {
    let choice = &record["choices"][0];

    if let Some(delta) = choice.get("delta").filter(|d| d.is_object()) {
        if let Some(text) = non_empty_str(&delta["reasoning_content"]) {
            events.push(DeltaEvent::Reasoning(text.to_string()));
        }
        if let Some(text) = non_empty_str(&delta["content"]) {
            events.push(DeltaEvent::Content(text.to_string()));
        }
    } else if let Some(message) = choice.get("message").filter(|m| m.is_object()) {
        if let Some(text) = non_empty_str(&message["content"]) {
            events.push(DeltaEvent::Content(text.to_string()));
        }
    }
}

fn non_empty_str(value: &Value) -> Option<&str> {
    value.as_str().filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all<C: AsRef<[u8]>>(protocol: ProtocolKind, chunks: &[C]) -> Vec<DeltaEvent> {
        let mut decoder = StreamDecoder::new(protocol);
        let mut events = Vec::new();
        for chunk in chunks {
            events.extend(decoder.feed(chunk.as_ref()));
        }
        events.extend(decoder.finish());
        events
    }

    fn content(s: &str) -> DeltaEvent {
        DeltaEvent::Content(s.to_string())
    }

    #[test]
    fn test_ollama_response_field() {
        let events = decode_all(
            ProtocolKind::Ollama,
            &[b"{\"response\":\"fix: \"}\n{\"response\":\"update\\n\"}\n"],
        );

        assert_eq!(
            events,
            vec![content("fix: "), content("update\n"), DeltaEvent::Done]
        );
    }

    #[test]
    fn test_ollama_empty_response_and_final_record_are_inert() {
        let events = decode_all(
            ProtocolKind::Ollama,
            &[b"{\"response\":\"\",\"done\":false}\n{\"done\":true,\"eval_count\":10}\n"],
        );

        assert_eq!(events, vec![DeltaEvent::Done]);
    }

    #[test]
    fn test_chat_delta_with_reasoning_and_content() {
        // Arrange - both fields in the same record
        let input = br#"data: {"choices":[{"delta":{"reasoning_content":"think","content":"feat: x"}}]}
"#;

        // Act
        let events = decode_all(ProtocolKind::OpenAiCompatible, &[input]);

        // Assert - reasoning is emitted before content
        assert_eq!(
            events,
            vec![
                DeltaEvent::Reasoning("think".to_string()),
                content("feat: x"),
                DeltaEvent::Done
            ]
        );
    }

    #[test]
    fn test_chat_message_record_inside_stream() {
        let input = br#"{"choices":[{"message":{"role":"assistant","content":"chore: bump"}}]}
"#;

        let events = decode_all(ProtocolKind::OpenAiCompatible, &[input]);

        assert_eq!(events, vec![content("chore: bump"), DeltaEvent::Done]);
    }

    #[test]
    fn test_chat_metadata_only_records_are_inert() {
        let input = b"data: {\"id\":\"x\",\"choices\":[]}\n\
                      data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\
                      data: {\"choices\":[{\"finish_reason\":\"stop\"}],\"usage\":{}}\n";

        let events = decode_all(ProtocolKind::OpenAiCompatible, &[input]);

        assert_eq!(events, vec![DeltaEvent::Done]);
    }

    #[test]
    fn test_incomplete_line_is_carried_to_next_read() {
        let mut decoder = StreamDecoder::new(ProtocolKind::Ollama);

        // First read stops in the middle of a JSON value
        let first = decoder.feed(b"{\"response\":\"a\"}\n{\"respo");
        assert_eq!(first, vec![content("a")]);
        assert_eq!(decoder.carry(), b"{\"respo");

        let second = decoder.feed(b"nse\":\"b\"}\n");
        assert_eq!(second, vec![content("b")]);
        assert!(decoder.carry().is_empty());
    }

    #[test]
    fn test_unterminated_final_line_is_processed_at_end_of_input() {
        let mut decoder = StreamDecoder::new(ProtocolKind::Ollama);

        assert!(decoder.feed(b"{\"response\":\"tail\"}").is_empty());
        let events = decoder.finish();

        assert_eq!(events, vec![content("tail"), DeltaEvent::Done]);
        assert!(decoder.is_done());
    }

    #[test]
    fn test_sentinel_terminates_and_ignores_trailing_bytes() {
        let mut decoder = StreamDecoder::new(ProtocolKind::OpenAiCompatible);

        let events = decoder.feed(
            b"data: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\n\
              data: [DONE]\n\
              data: {\"choices\":[{\"delta\":{\"content\":\"late\"}}]}\n",
        );
        let after = decoder.feed(b"data: {\"choices\":[{\"delta\":{\"content\":\"later\"}}]}\n");
        let finished = decoder.finish();

        assert_eq!(events, vec![content("ok"), DeltaEvent::Done]);
        assert!(after.is_empty());
        assert!(finished.is_empty());
    }

    #[test]
    fn test_sentinel_without_trailing_newline() {
        let events = decode_all(
            ProtocolKind::OpenAiCompatible,
            &[b"data: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\n\ndata: [DONE]"],
        );

        assert_eq!(events, vec![content("ok"), DeltaEvent::Done]);
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let input = b": keep-alive\n\
                      data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\n\
                      data: {not json}\n\
                      event: ping\n\
                      data: {}\n\
                      data: [1, 2]\n\
                      data: {\"choices\":[{\"delta\":{\"content\":\"b\"}}]}\n";

        let events = decode_all(ProtocolKind::OpenAiCompatible, &[input]);

        assert_eq!(events, vec![content("a"), content("b"), DeltaEvent::Done]);
    }

    #[test]
    fn test_crlf_line_endings() {
        let events = decode_all(
            ProtocolKind::OpenAiCompatible,
            &[b"data: {\"choices\":[{\"delta\":{\"content\":\"x\"}}]}\r\n\r\ndata: [DONE]\r\n"],
        );

        assert_eq!(events, vec![content("x"), DeltaEvent::Done]);
    }

    #[test]
    fn test_multibyte_character_split_across_reads() {
        let line = "{\"response\":\"修复 🎉\"}\n".as_bytes();
        // Split inside the four-byte emoji
        let split = line.len() - 5;

        let events = decode_all(ProtocolKind::Ollama, &[&line[..split], &line[split..]]);

        assert_eq!(events, vec![content("修复 🎉"), DeltaEvent::Done]);
    }

    #[test]
    fn test_every_split_offset_decodes_identically() {
        let stream = "data: {\"choices\":[{\"delta\":{\"reasoning_content\":\"思考\"}}]}\n\n\
                      data: {\"choices\":[{\"delta\":{\"content\":\"feat: \"}}]}\n\n\
                      data: {\"choices\":[{\"delta\":{\"content\":\"add ✨\"}}]}\n\n\
                      data: [DONE]\n"
            .as_bytes();
        let expected = decode_all(ProtocolKind::OpenAiCompatible, &[stream]);

        for offset in 0..=stream.len() {
            let events = decode_all(
                ProtocolKind::OpenAiCompatible,
                &[&stream[..offset], &stream[offset..]],
            );
            assert_eq!(events, expected, "split at byte {offset}");
        }
    }

    #[test]
    fn test_one_byte_reads() {
        let stream = b"{\"response\":\"a\"}\n{\"response\":\"b\"}\n";
        let chunks: Vec<&[u8]> = stream.chunks(1).collect();

        let events = decode_all(ProtocolKind::Ollama, &chunks);

        assert_eq!(events, vec![content("a"), content("b"), DeltaEvent::Done]);
    }
}
