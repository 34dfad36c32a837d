//! Server-sent event parsing and framing
//!
//! The upstream model server streams OpenAI-format completion chunks as SSE.
//! This module parses inbound `data:` frames (incrementally, since TCP
//! chunks need not align with frame boundaries) and builds the outbound
//! frames the gateway emits to its own clients.

use serde_json::Value;

/// Terminal frame closing an SSE stream
pub const DONE_FRAME: &str = "data: [DONE]\n\n";

/// A parsed SSE event
#[derive(Debug, Clone, PartialEq)]
pub enum SseEvent {
    /// Data event containing the payload
    Data(String),
    /// Terminal [DONE] marker
    Done,
}

/// Incremental SSE frame parser.
///
/// Feed raw chunks as they arrive; complete frames (terminated by a blank
/// line) are returned as events, anything after the last blank line is kept
/// pending until more input arrives.
#[derive(Debug, Default)]
pub struct SseFrameBuffer {
    pending: String,
}

impl SseFrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and drain all complete frames
    pub fn push(&mut self, chunk: &str) -> Vec<SseEvent> {
        self.pending.push_str(chunk);

        let mut events = Vec::new();
        while let Some(boundary) = self.pending.find("\n\n") {
            let frame: String = self.pending.drain(..boundary + 2).collect();
            if let Some(event) = parse_frame(&frame) {
                events.push(event);
            }
        }
        events
    }

    /// Drain whatever remains as a final frame (streams need not end with a
    /// blank line)
    pub fn finish(&mut self) -> Option<SseEvent> {
        let remainder = std::mem::take(&mut self.pending);
        parse_frame(&remainder)
    }
}

/// Parse a single frame: consecutive `data:` lines joined with newlines,
/// comment lines (leading `:`) and unknown fields skipped
fn parse_frame(frame: &str) -> Option<SseEvent> {
    let mut data = String::new();
    for line in frame.lines() {
        let line = line.trim_end_matches('\r');
        if let Some(payload) = line.strip_prefix("data: ") {
            if payload == "[DONE]" {
                return Some(SseEvent::Done);
            }
            if !data.is_empty() {
                data.push('\n');
            }
            data.push_str(payload);
        }
    }
    if data.is_empty() {
        None
    } else {
        Some(SseEvent::Data(data))
    }
}

/// Parse a complete SSE document into events
pub fn parse_sse_events(raw: &str) -> Vec<SseEvent> {
    let mut buffer = SseFrameBuffer::new();
    let mut events = buffer.push(raw);
    if let Some(event) = buffer.finish() {
        events.push(event);
    }
    events
}

/// Extract the content delta from an OpenAI-format completion chunk.
///
/// Chunks look like:
/// ```json
/// {"id":"chatcmpl-123","choices":[{"index":0,"delta":{"content":"Hello"}}]}
/// ```
pub fn delta_content(json_str: &str) -> Option<String> {
    let value: Value = serde_json::from_str(json_str).ok()?;

    value
        .get("choices")?
        .get(0)?
        .get("delta")?
        .get("content")?
        .as_str()
        .map(|s| s.to_string())
}

/// Build an outbound `data:` frame from a JSON payload
pub fn data_frame(payload: &Value) -> String {
    format!("data: {payload}\n\n")
}
