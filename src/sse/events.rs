//! SSE event types and definitions
//!
//! Contains the typed events emitted by the EMS insights streaming endpoint.

/// Typed SSE events from the insights endpoint.
///
/// The wire format is narrow: unnamed events carry a JSON-encoded string
/// fragment, `done` signals normal completion, and `error` carries an
/// optional human-readable diagnostic.
#[derive(Debug, Clone, PartialEq)]
pub enum SseEvent {
    /// One incremental unit of generated text.
    Fragment { text: String },
    /// Stream completed successfully. Any payload is ignored.
    Done,
    /// Server-reported failure. `message` is absent when the payload
    /// could not be decoded as a JSON string.
    Error { message: Option<String> },
}

impl SseEvent {
    /// Returns the event type name as a string for logging purposes.
    pub fn event_type_name(&self) -> &'static str {
        match self {
            SseEvent::Fragment { .. } => "fragment",
            SseEvent::Done => "done",
            SseEvent::Error { .. } => "error",
        }
    }
}

/// Represents a parsed SSE line
#[derive(Debug, Clone, PartialEq)]
pub enum SseLine {
    /// Event type declaration (e.g., "event: done")
    Event(String),
    /// Data payload (e.g., "data: \"hello\"")
    Data(String),
    /// Empty line - signals end of event
    Empty,
    /// Comment line (starts with ':')
    Comment(String),
}

/// Errors that can occur during SSE parsing
#[derive(Debug, Clone, PartialEq)]
pub enum SseParseError {
    /// Invalid JSON in data payload
    InvalidJson {
        event_type: String,
        source: String,
    },
    /// Missing data for an event that requires a payload
    MissingData {
        event_type: String,
    },
}

impl std::fmt::Display for SseParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SseParseError::InvalidJson { event_type, source } => {
                write!(f, "Invalid JSON for event '{}': {}", event_type, source)
            }
            SseParseError::MissingData { event_type } => {
                write!(f, "Missing data for event type: {}", event_type)
            }
        }
    }
}

impl std::error::Error for SseParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sse_event_type_name() {
        assert_eq!(
            SseEvent::Fragment {
                text: "".to_string(),
            }
            .event_type_name(),
            "fragment"
        );
        assert_eq!(SseEvent::Done.event_type_name(), "done");
        assert_eq!(SseEvent::Error { message: None }.event_type_name(), "error");
    }

    #[test]
    fn test_sse_parse_error_display() {
        let err = SseParseError::InvalidJson {
            event_type: "message".to_string(),
            source: "expected value".to_string(),
        };
        assert!(format!("{}", err).contains("Invalid JSON"));

        let err = SseParseError::MissingData {
            event_type: "message".to_string(),
        };
        assert!(format!("{}", err).contains("Missing data"));
    }
}
