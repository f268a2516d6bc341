//! Compile event model: wire envelopes, the observer seam, and the
//! single-fire completion latch.
//!
//! The backend frames every event as one SSE line:
//! `data: {"type": <tag>, "content": <string>}`. Event tags outside the
//! known set are dropped silently so that new backend event types never
//! break older clients.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::Deserialize;
use tracing::debug;

/// Prefix marking a protocol event line in the stream.
pub const DATA_LINE_PREFIX: &str = "data: ";

/// One event from a streaming compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileEvent {
    /// A compiler log line.
    Log(String),
    /// The final blueprint artifact (at most one per compilation).
    Blueprint(String),
    /// The final structured artifact (at most one per compilation).
    Json(String),
    /// A compile error message; does not itself terminate the stream.
    Error(String),
    /// Transient progress text.
    Status(String),
    /// Position in the backend work queue; 0 means "running now".
    Queue(u32),
    /// Terminal marker.
    End,
}

/// The `{"type", "content"}` envelope the backend serializes events into.
#[derive(Debug, Deserialize)]
struct WireEnvelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    content: String,
}

impl CompileEvent {
    /// Parse one line of the stream into an event.
    ///
    /// Returns `None` for anything that is not a well-formed event: lines
    /// without the `data: ` prefix, unparseable JSON, unknown event tags,
    /// and queue payloads that are not a number. None of these abort the
    /// stream; they only emit a debug diagnostic.
    pub fn parse_line(line: &str) -> Option<CompileEvent> {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let payload = line.strip_prefix(DATA_LINE_PREFIX)?;
        let envelope: WireEnvelope = match serde_json::from_str(payload) {
            Ok(envelope) => envelope,
            Err(err) => {
                debug!(error = %err, "skipping malformed stream line");
                return None;
            }
        };
        match envelope.kind.as_str() {
            "log" => Some(Self::Log(envelope.content)),
            "blueprint" => Some(Self::Blueprint(envelope.content)),
            "json" => Some(Self::Json(envelope.content)),
            "error" => Some(Self::Error(envelope.content)),
            "status" => Some(Self::Status(envelope.content)),
            "queue" => match envelope.content.trim().parse::<u32>() {
                Ok(position) => Some(Self::Queue(position)),
                Err(_) => {
                    debug!(content = %envelope.content, "skipping queue event with non-numeric position");
                    None
                }
            },
            "end" => Some(Self::End),
            other => {
                debug!(kind = other, "dropping unknown event type");
                None
            }
        }
    }

    /// Route this event to the matching observer method.
    ///
    /// [`CompileEvent::End`] is a no-op here: the read loop owns completion
    /// so that it can run through the latch.
    pub fn dispatch(&self, observer: &mut dyn CompileObserver) {
        match self {
            Self::Log(content) => observer.on_log(content),
            Self::Blueprint(content) => observer.on_blueprint(content),
            Self::Json(content) => observer.on_json(content),
            Self::Error(message) => observer.on_error(message),
            Self::Status(content) => observer.on_status(content),
            Self::Queue(position) => observer.on_queue(*position),
            Self::End => {}
        }
    }
}

/// Receives compile events as the stream delivers them.
///
/// Every method defaults to a no-op, so implementors handle only the events
/// they care about; an unhandled variant is silently ignored, never an
/// error. Events arrive in server frame order, and `on_complete` is called
/// exactly once per streaming invocation, after every other callback.
pub trait CompileObserver {
    fn on_log(&mut self, _content: &str) {}
    fn on_blueprint(&mut self, _content: &str) {}
    fn on_json(&mut self, _content: &str) {}
    fn on_error(&mut self, _message: &str) {}
    fn on_status(&mut self, _content: &str) {}
    fn on_queue(&mut self, _position: u32) {}
    fn on_complete(&mut self) {}
}

/// Single-fire latch guarding completion delivery.
///
/// A streaming invocation has three completion trigger sites: the `end`
/// envelope, natural stream closure, and the transport-error handler. All
/// of them go through one latch so `on_complete` fires at most once.
#[derive(Debug, Default)]
pub struct CompletionLatch {
    fired: AtomicBool,
}

impl CompletionLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check-and-set. Returns `true` for exactly the first caller.
    pub fn fire(&self) -> bool {
        !self.fired.swap(true, Ordering::SeqCst)
    }

    pub fn fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        seen: Vec<String>,
    }

    impl CompileObserver for Recorder {
        fn on_log(&mut self, content: &str) {
            self.seen.push(format!("log:{content}"));
        }
        fn on_queue(&mut self, position: u32) {
            self.seen.push(format!("queue:{position}"));
        }
    }

    #[test]
    fn parses_known_event_types() {
        let event = CompileEvent::parse_line(r#"data: {"type":"log","content":"parsing"}"#);
        assert_eq!(event, Some(CompileEvent::Log("parsing".into())));

        let event = CompileEvent::parse_line(r#"data: {"type":"end","content":""}"#);
        assert_eq!(event, Some(CompileEvent::End));

        let event = CompileEvent::parse_line(r#"data: {"type":"queue","content":"3"}"#);
        assert_eq!(event, Some(CompileEvent::Queue(3)));
    }

    #[test]
    fn non_data_lines_are_ignored() {
        assert_eq!(CompileEvent::parse_line(""), None);
        assert_eq!(CompileEvent::parse_line(": keep-alive"), None);
        assert_eq!(CompileEvent::parse_line("event: message"), None);
    }

    #[test]
    fn malformed_json_is_skipped() {
        assert_eq!(CompileEvent::parse_line("data: {not json"), None);
        assert_eq!(CompileEvent::parse_line("data: 42"), None);
    }

    #[test]
    fn unknown_event_type_is_dropped() {
        let line = r#"data: {"type":"telemetry","content":"x"}"#;
        assert_eq!(CompileEvent::parse_line(line), None);
    }

    #[test]
    fn missing_content_defaults_to_empty() {
        let event = CompileEvent::parse_line(r#"data: {"type":"status"}"#);
        assert_eq!(event, Some(CompileEvent::Status(String::new())));
    }

    #[test]
    fn crlf_line_endings_are_accepted() {
        let event = CompileEvent::parse_line("data: {\"type\":\"log\",\"content\":\"hi\"}\r");
        assert_eq!(event, Some(CompileEvent::Log("hi".into())));
    }

    #[test]
    fn non_numeric_queue_position_is_dropped() {
        let line = r#"data: {"type":"queue","content":"soon"}"#;
        assert_eq!(CompileEvent::parse_line(line), None);
    }

    #[test]
    fn dispatch_routes_to_matching_method() {
        let mut recorder = Recorder::default();
        CompileEvent::Log("one".into()).dispatch(&mut recorder);
        CompileEvent::Queue(0).dispatch(&mut recorder);
        // Unhandled variants fall through the default no-ops.
        CompileEvent::Status("Compiling...".into()).dispatch(&mut recorder);
        CompileEvent::End.dispatch(&mut recorder);
        assert_eq!(recorder.seen, vec!["log:one", "queue:0"]);
    }

    #[test]
    fn latch_fires_exactly_once() {
        let latch = CompletionLatch::new();
        assert!(!latch.fired());
        assert!(latch.fire());
        assert!(!latch.fire());
        assert!(!latch.fire());
        assert!(latch.fired());
    }
}
