//! Incremental parser for server-sent-event streams.
//!
//! The push channel is a long-lived HTTP response whose body is a sequence
//! of text frames. Frames arrive in arbitrary chunks, so the parser buffers
//! bytes and emits complete events as they become available.
//!
//! # Frame format
//!
//! | Line | Effect |
//! |------|--------|
//! | `data: <text>` | Appends a line to the event payload |
//! | `event: <name>` | Sets the event type (default `message`) |
//! | `id: <id>` | Sets the stream position for resume |
//! | `retry: <ms>` | Adjusts the reconnection delay |
//! | `: <comment>` | Ignored (servers use these as heartbeats) |
//! | blank line | Dispatches the buffered event |
//!
//! Multiple `data:` lines in one frame are joined with `\n`. Both `\r\n` and
//! `\n` line endings are accepted. A frame that never set a `data:` line
//! dispatches nothing, matching how browsers treat id-only or comment-only
//! frames.
//!
//! The `id` and `retry` values are stream-level state rather than per-event
//! payload: they stay readable on the parser after `feed` so the connection
//! driver can pick them up even when the frame carrying them dispatched no
//! event.
//!
//! # Examples
//!
//! ```
//! use ci_http_client::client::EventParser;
//!
//! let mut parser = EventParser::new();
//!
//! // Chunk boundaries do not have to align with frames.
//! assert!(parser.feed(b"data: {\"a\"").is_empty());
//! let events = parser.feed(b":1}\n\n");
//! assert_eq!(events.len(), 1);
//! assert_eq!(events[0].data, "{\"a\":1}");
//! ```

use std::time::Duration;

use bytes::BytesMut;

/// Default event type when a frame carries no `event:` line.
pub const MESSAGE_EVENT: &str = "message";

/// A complete event parsed from the push channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// Event type; [`MESSAGE_EVENT`] unless the frame named one.
    pub event: String,
    /// Payload text, multi-line `data:` fields joined with `\n`.
    pub data: String,
}

/// Incremental server-sent-event parser.
///
/// Feed it raw body chunks as they arrive; it returns every event completed
/// by that chunk, in stream order, and keeps partial frames buffered for the
/// next call.
#[derive(Debug)]
pub struct EventParser {
    /// Bytes not yet consumed as complete lines.
    buffer: BytesMut,
    /// Event type of the frame currently being accumulated.
    event_type: Option<String>,
    /// Data lines of the frame currently being accumulated.
    data: String,
    /// Last `id:` value seen on the stream.
    last_event_id: Option<String>,
    /// Last `retry:` value seen on the stream.
    retry: Option<Duration>,
}

impl EventParser {
    /// Create a parser with empty buffers.
    pub fn new() -> Self {
        EventParser {
            buffer: BytesMut::with_capacity(4096),
            event_type: None,
            data: String::new(),
            last_event_id: None,
            retry: None,
        }
    }

    /// Feed a chunk of stream bytes, returning the events it completed.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();

        while let Some(line) = self.take_line() {
            if let Some(event) = self.process_line(&line) {
                events.push(event);
            }
        }

        events
    }

    /// Stream position for `Last-Event-ID` resume, if the server set one.
    pub fn last_event_id(&self) -> Option<&str> {
        self.last_event_id.as_deref()
    }

    /// Server-requested reconnection delay, if the stream adjusted it.
    pub fn retry(&self) -> Option<Duration> {
        self.retry
    }

    /// Split the next complete line off the buffer, stripping the
    /// terminator. Partial trailing lines stay buffered.
    fn take_line(&mut self) -> Option<String> {
        let pos = self.buffer.iter().position(|&b| b == b'\n')?;
        let line = self.buffer.split_to(pos + 1);
        let mut line = &line[..pos];
        if line.ends_with(b"\r") {
            line = &line[..line.len() - 1];
        }
        Some(String::from_utf8_lossy(line).into_owned())
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "data" => {
                self.data.push_str(value);
                self.data.push('\n');
            }
            "event" => self.event_type = Some(value.to_owned()),
            // NUL is the one character the id field may not carry.
            "id" if !value.contains('\0') => self.last_event_id = Some(value.to_owned()),
            "retry" => {
                if let Ok(ms) = value.parse::<u64>() {
                    self.retry = Some(Duration::from_millis(ms));
                }
            }
            _ => {}
        }

        None
    }

    /// Finish the buffered frame. Frames without data dispatch nothing, but
    /// still reset the event type.
    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = self
            .event_type
            .take()
            .unwrap_or_else(|| MESSAGE_EVENT.to_owned());

        if self.data.is_empty() {
            return None;
        }

        let mut data = std::mem::take(&mut self.data);
        data.pop(); // terminator of the final data line
        Some(SseEvent { event, data })
    }
}

impl Default for EventParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_frame() {
        let mut parser = EventParser::new();
        let events = parser.feed(b"data: {\"a\":1}\n\n");
        assert_eq!(
            events,
            vec![SseEvent {
                event: "message".to_string(),
                data: "{\"a\":1}".to_string(),
            }]
        );
    }

    #[test]
    fn frames_split_across_chunks() {
        let mut parser = EventParser::new();
        assert!(parser.feed(b"data: hel").is_empty());
        assert!(parser.feed(b"lo\n").is_empty());
        let events = parser.feed(b"\ndata: world\n\n");
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].data, "hello");
        assert_eq!(events[1].data, "world");
    }

    #[test]
    fn multiple_data_lines_join_with_newline() {
        let mut parser = EventParser::new();
        let events = parser.feed(b"data: line one\ndata: line two\n\n");
        assert_eq!(events[0].data, "line one\nline two");
    }

    #[test]
    fn named_events_keep_their_type() {
        let mut parser = EventParser::new();
        let events = parser.feed(b"event: error\ndata: eof\n\n");
        assert_eq!(events[0].event, "error");
        assert_eq!(events[0].data, "eof");

        // Type does not leak into the next frame.
        let events = parser.feed(b"data: x\n\n");
        assert_eq!(events[0].event, "message");
    }

    #[test]
    fn comments_and_dataless_frames_dispatch_nothing() {
        let mut parser = EventParser::new();
        assert!(parser.feed(b": heartbeat\n\n").is_empty());
        assert!(parser.feed(b"event: ping\n\n").is_empty());
        assert!(parser.feed(b"id: 42\n\n").is_empty());
    }

    #[test]
    fn id_and_retry_are_stream_state() {
        let mut parser = EventParser::new();
        parser.feed(b"id: 42\nretry: 10000\n\n");
        assert_eq!(parser.last_event_id(), Some("42"));
        assert_eq!(parser.retry(), Some(Duration::from_millis(10000)));

        // Non-numeric retry values are ignored.
        parser.feed(b"retry: soon\n\n");
        assert_eq!(parser.retry(), Some(Duration::from_millis(10000)));
    }

    #[test]
    fn crlf_line_endings_are_accepted() {
        let mut parser = EventParser::new();
        let events = parser.feed(b"data: one\r\n\r\n");
        assert_eq!(events[0].data, "one");
    }

    #[test]
    fn data_without_space_after_colon() {
        let mut parser = EventParser::new();
        let events = parser.feed(b"data:tight\n\n");
        assert_eq!(events[0].data, "tight");
    }
}
