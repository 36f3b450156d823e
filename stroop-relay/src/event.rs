use crate::error::RelayError;
use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Events delivered to the chat client: zero or more tokens, then one
/// `Done`. Nothing follows `Done`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    Token { text: String },
    Done,
}

impl StreamEvent {
    pub fn token(text: impl Into<String>) -> Self {
        StreamEvent::Token { text: text.into() }
    }

    /// Encodes the event as one text/event-stream frame.
    pub fn to_sse(&self) -> String {
        match self {
            StreamEvent::Token { text } => {
                format!("event: token\ndata: {}\n\n", json_string(text))
            }
            StreamEvent::Done => "event: done\n\n".to_string(),
        }
    }
}

/// Terminal frame reporting an upstream failure.
pub fn error_frame(error: &RelayError) -> String {
    format!("event: error\ndata: {}\n\n", json_string(&error.to_string()))
}

fn json_string(s: &str) -> String {
    Value::String(s.to_owned()).to_string()
}

/// Maps relay output onto wire frames.
pub fn sse_frames<S>(events: S) -> impl Stream<Item = String>
where
    S: Stream<Item = Result<StreamEvent, RelayError>>,
{
    events.map(|item| match item {
        Ok(event) => event.to_sse(),
        Err(e) => error_frame(&e),
    })
}

/// Incremental client-side decoder for the relay's event stream.
///
/// Bytes may arrive split anywhere; complete frames are returned as soon as
/// their terminating blank line has been seen.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: String,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, chunk: &str) -> Vec<Result<StreamEvent, RelayError>> {
        self.buffer.push_str(chunk);
        let mut decoded = Vec::new();
        while let Some(end) = self.buffer.find("\n\n") {
            let frame: String = self.buffer.drain(..end + 2).collect();
            if frame.trim().is_empty() {
                continue;
            }
            decoded.push(Self::decode_frame(&frame));
        }
        decoded
    }

    /// True when a partial frame is still buffered.
    pub fn has_pending(&self) -> bool {
        !self.buffer.trim().is_empty()
    }

    fn decode_frame(frame: &str) -> Result<StreamEvent, RelayError> {
        let mut event = None;
        let mut data = None;
        for line in frame.lines() {
            if let Some(name) = line.strip_prefix("event:") {
                event = Some(name.trim());
            } else if let Some(payload) = line.strip_prefix("data:") {
                data = Some(payload.trim_start());
            }
        }
        let decode_text = |data: Option<&str>| -> Result<String, RelayError> {
            let raw = data.ok_or_else(|| RelayError::Frame("missing data line".into()))?;
            serde_json::from_str::<String>(raw).map_err(|e| RelayError::Frame(e.to_string()))
        };
        match event {
            Some("token") => Ok(StreamEvent::Token {
                text: decode_text(data)?,
            }),
            Some("done") => Ok(StreamEvent::Done),
            Some("error") => Err(RelayError::Upstream(anyhow::anyhow!(decode_text(data)?))),
            other => Err(RelayError::Frame(format!("unknown event {other:?}"))),
        }
    }
}
