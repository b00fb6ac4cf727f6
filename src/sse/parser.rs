//! SSE stream parsing logic
//!
//! Contains the stateful SseParser for accumulating lines and emitting events,
//! as well as the core parsing functions.

use crate::sse::events::{SseEvent, SseLine, SseParseError};

/// Parse a single SSE line into its component type
pub fn parse_sse_line(line: &str) -> SseLine {
    if line.is_empty() {
        return SseLine::Empty;
    }

    if let Some(stripped) = line.strip_prefix(':') {
        return SseLine::Comment(stripped.trim().to_string());
    }

    if let Some(rest) = line.strip_prefix("event:") {
        return SseLine::Event(rest.trim().to_string());
    }

    if let Some(rest) = line.strip_prefix("data:") {
        return SseLine::Data(rest.trim().to_string());
    }

    // Unknown line format - treat as comment
    SseLine::Comment(line.to_string())
}

/// Parse SSE event type and data into a typed SseEvent.
///
/// The insights endpoint sends fragments on the default (unnamed) event with
/// a JSON-encoded string payload, `done` with an ignored payload, and `error`
/// with an optional JSON-encoded diagnostic string.
///
/// Returns `Ok(None)` for named events this client does not know, so a newer
/// backend does not break an older client.
pub fn parse_sse_event(event_type: &str, data: &str) -> Result<Option<SseEvent>, SseParseError> {
    match event_type {
        // Default/unnamed event: one JSON-encoded text fragment
        "" | "message" => match serde_json::from_str::<String>(data) {
            Ok(text) => Ok(Some(SseEvent::Fragment { text })),
            Err(e) => Err(SseParseError::InvalidJson {
                event_type: "message".to_string(),
                source: e.to_string(),
            }),
        },
        // Payload is ignored by contract ("data: {}" on the wire)
        "done" => Ok(Some(SseEvent::Done)),
        "error" => {
            let message = serde_json::from_str::<String>(data).ok();
            Ok(Some(SseEvent::Error { message }))
        }
        // Ignore unknown named events instead of erroring (more resilient)
        _ => Ok(None),
    }
}

/// Stateful SSE parser that accumulates lines and emits complete events
#[derive(Debug, Default)]
pub struct SseParser {
    /// Current event type being accumulated
    current_event_type: Option<String>,
    /// Accumulated data lines (SSE allows multiple data: lines)
    data_buffer: Vec<String>,
}

impl SseParser {
    /// Create a new SSE parser
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a line to the parser, potentially returning a complete event
    ///
    /// Returns:
    /// - `Ok(Some(event))` - A complete event was parsed
    /// - `Ok(None)` - Line was consumed but no event is ready
    /// - `Err(error)` - Parse error occurred
    pub fn feed_line(&mut self, line: &str) -> Result<Option<SseEvent>, SseParseError> {
        let parsed = parse_sse_line(line);

        match parsed {
            SseLine::Event(event_type) => {
                self.current_event_type = Some(event_type);
                Ok(None)
            }
            SseLine::Data(data) => {
                self.data_buffer.push(data);
                Ok(None)
            }
            SseLine::Empty => {
                // Empty line signals end of event - try to emit
                self.try_emit_event()
            }
            SseLine::Comment(_) => {
                // Comments (keep-alives) are ignored
                Ok(None)
            }
        }
    }

    /// Try to emit a complete event from accumulated state
    fn try_emit_event(&mut self) -> Result<Option<SseEvent>, SseParseError> {
        // If we have no event type or data, nothing to emit
        if self.current_event_type.is_none() && self.data_buffer.is_empty() {
            return Ok(None);
        }

        let event_type = self.current_event_type.take();
        let data = self.data_buffer.join("\n");
        self.data_buffer.clear();

        match event_type {
            Some(et) => {
                // 'done' and 'error' are valid without a payload
                if data.is_empty() && (et == "done" || et == "error") {
                    parse_sse_event(&et, "")
                } else if data.is_empty() {
                    Err(SseParseError::MissingData { event_type: et })
                } else {
                    parse_sse_event(&et, &data)
                }
            }
            // Data without an event type is the default fragment event
            None => parse_sse_event("", &data),
        }
    }

    /// Reset the parser state
    pub fn reset(&mut self) {
        self.current_event_type = None;
        self.data_buffer.clear();
    }
}
