//! Server-sent event decoding.
//!
//! Only the fields the log stream uses are kept: `event`, `data`, `id` and
//! `retry`. Comment lines are dropped, and so is an event still pending when
//! the body ends.

use std::io;
use std::time::Duration;

use bytes::BytesMut;
use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use reqwest::Response;
use tokio_util::codec::{Decoder, FramedRead};
use tokio_util::io::StreamReader;

use crate::error::{ClientError, Result};

/// One dispatched event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseEvent {
    /// Event type, when the server named one.
    pub event: Option<String>,
    /// Data lines joined with `\n`.
    pub data: String,
    /// Last event id.
    pub id: Option<String>,
    /// Reconnection delay most recently set by the server.
    pub retry: Option<Duration>,
}

impl SseEvent {
    /// Whether a default `message` listener receives this event.
    #[must_use]
    pub fn is_message(&self) -> bool {
        matches!(self.event.as_deref(), None | Some("message"))
    }
}

/// Line-oriented SSE decoder.
#[derive(Debug, Default)]
pub struct SseDecoder {
    event: Option<String>,
    data: Vec<String>,
    id: Option<String>,
    retry: Option<Duration>,
}

impl SseDecoder {
    /// A decoder with no pending fields.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn field(&mut self, line: &str) {
        if line.starts_with(':') {
            return;
        }
        let (name, value) = match line.split_once(':') {
            Some((name, value)) => (name, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match name {
            "data" => self.data.push(value.to_string()),
            "event" => self.event = Some(value.to_string()),
            "id" => self.id = Some(value.to_string()),
            "retry" if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) => {
                if let Ok(ms) = value.parse() {
                    self.retry = Some(Duration::from_millis(ms));
                }
            }
            _ => {}
        }
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        Some(SseEvent {
            event,
            data,
            id: self.id.clone(),
            retry: self.retry,
        })
    }

    fn line(&mut self, raw: &[u8]) -> Option<SseEvent> {
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        if raw.is_empty() {
            return self.dispatch();
        }
        self.field(&String::from_utf8_lossy(raw));
        None
    }
}

impl Decoder for SseDecoder {
    type Item = SseEvent;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> io::Result<Option<SseEvent>> {
        while let Some(pos) = src.iter().position(|b| *b == b'\n') {
            let line = src.split_to(pos + 1);
            if let Some(event) = self.line(&line[..pos]) {
                return Ok(Some(event));
            }
        }
        Ok(None)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> io::Result<Option<SseEvent>> {
        if let Some(event) = self.decode(src)? {
            return Ok(Some(event));
        }
        // A partial line and an undispatched event are lost with the body.
        src.clear();
        self.event = None;
        self.data.clear();
        Ok(None)
    }
}

/// Decode the body of an event-stream response.
#[must_use]
pub fn events(response: Response) -> BoxStream<'static, Result<SseEvent>> {
    let body = response.bytes_stream().map_err(io::Error::other);
    FramedRead::new(StreamReader::new(body), SseDecoder::new())
        .map(|item| item.map_err(|e| ClientError::Stream(e.to_string())))
        .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(input: &str) -> Vec<SseEvent> {
        let mut decoder = SseDecoder::new();
        let mut buf = BytesMut::from(input);
        let mut out = Vec::new();
        while let Some(event) = decoder.decode_eof(&mut buf).expect("decode") {
            out.push(event);
        }
        out
    }

    #[test]
    fn data_lines_become_events() {
        let events = decode_all("data: [BUILD_START]\n\ndata: Step 1/4\n\n");
        let data: Vec<_> = events.iter().map(|e| e.data.as_str()).collect();
        assert_eq!(data, vec!["[BUILD_START]", "Step 1/4"]);
    }

    #[test]
    fn multi_line_data_is_joined() {
        let events = decode_all("data: a\ndata: b\n\n");
        assert_eq!(events[0].data, "a\nb");
    }

    #[test]
    fn crlf_comments_and_fields() {
        let events = decode_all(": keep-alive\r\nevent: log\r\nid: 7\r\ndata:x\r\n\r\n");
        assert_eq!(
            events,
            vec![SseEvent {
                event: Some("log".into()),
                data: "x".into(),
                id: Some("7".into()),
                retry: None,
            }]
        );
    }

    #[test]
    fn partial_frames_wait_for_more_input() {
        let mut decoder = SseDecoder::new();
        let mut buf = BytesMut::from("data: ContainerId-ab");
        assert!(decoder.decode(&mut buf).expect("decode").is_none());
        buf.extend_from_slice(b"c123\n\n");
        let event = decoder.decode(&mut buf).expect("decode").expect("event");
        assert_eq!(event.data, "ContainerId-abc123");
    }

    #[test]
    fn unterminated_event_is_dropped_at_eof() {
        let events = decode_all("data: first\n\ndata: last line");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "first");
        assert!(decode_all("data: complete line\n").is_empty());
    }

    #[test]
    fn retry_sticks_to_later_events() {
        let events = decode_all("retry: 250\ndata: a\n\ndata: b\n\nretry: soon\ndata: c\n\n");
        let retries: Vec<_> = events.iter().map(|e| e.retry).collect();
        assert_eq!(retries, vec![Some(Duration::from_millis(250)); 3]);
    }

    #[test]
    fn only_unnamed_and_message_events_are_messages() {
        let events = decode_all("data: a\n\nevent: message\ndata: b\n\nevent: ping\ndata: c\n\n");
        let messages: Vec<_> = events.iter().map(SseEvent::is_message).collect();
        assert_eq!(messages, vec![true, true, false]);
    }

    #[test]
    fn blank_lines_without_data_dispatch_nothing() {
        assert!(decode_all("\n\n: ping\n\n").is_empty());
    }
}
