//! Incremental decoding of streamed chat-completion bodies.
//!
//! The body is split into lines, every non-blank line is parsed as one JSON
//! fragment, and the text carried by each fragment is folded into a
//! [`StreamText`]. Each new piece of text is handed to a [`ChunkSink`] as soon
//! as it is decoded, before it is appended.

use crate::error::ChatError;
use futures_util::{Stream, StreamExt};
use log::trace;
use serde::Deserialize;

/// Receives each streamed piece of text as it arrives.
pub trait ChunkSink {
    fn accept(&mut self, chunk: &str);
}

impl<F: FnMut(&str)> ChunkSink for F {
    fn accept(&mut self, chunk: &str) {
        self(chunk)
    }
}

/// Sink that drops everything.
pub struct NullSink;

impl ChunkSink for NullSink {
    fn accept(&mut self, _chunk: &str) {}
}

#[derive(Debug, Deserialize)]
struct Fragment {
    #[serde(default)]
    choices: Vec<FragmentChoice>,
}

#[derive(Debug, Deserialize)]
struct FragmentChoice {
    message: Option<FragmentMessage>,
    delta: Option<FragmentMessage>,
}

#[derive(Debug, Deserialize)]
struct FragmentMessage {
    content: Option<String>,
}

/// A single decoded line of the stream.
#[derive(Debug, PartialEq, Eq)]
pub enum StreamEvent {
    /// Blank line, or a fragment carrying no text.
    Skip,
    /// Text contributed by one fragment.
    Text(String),
    /// End-of-stream marker.
    Done,
}

/// Parses one line of a streamed body.
///
/// An optional `data:` prefix is stripped. Anything else must be a complete
/// JSON object; a malformed line fails the whole stream.
pub fn parse_line(line: &str) -> Result<StreamEvent, serde_json::Error> {
    let line = line.trim();
    let payload = line.strip_prefix("data:").map(str::trim_start).unwrap_or(line);

    if payload.is_empty() {
        return Ok(StreamEvent::Skip);
    }
    if payload == "[DONE]" {
        return Ok(StreamEvent::Done);
    }

    let fragment: Fragment = serde_json::from_str(payload)?;
    let text = fragment.choices.into_iter().next().and_then(|choice| {
        choice
            .message
            .and_then(|m| m.content)
            .or_else(|| choice.delta.and_then(|d| d.content))
    });

    Ok(match text {
        Some(text) => StreamEvent::Text(text),
        None => StreamEvent::Skip,
    })
}

/// Splits arbitrarily chunked bytes into `\n`-terminated lines.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buffer: Vec<u8>,
}

impl LineDecoder {
    /// Appends `bytes` and returns every line completed by them.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);

        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let rest = self.buffer.split_off(pos + 1);
            let mut line = std::mem::replace(&mut self.buffer, rest);
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            lines.push(String::from_utf8_lossy(&line).into_owned());
        }
        lines
    }

    /// Returns the trailing unterminated line, if any.
    pub fn finish(self) -> Option<String> {
        if self.buffer.is_empty() {
            None
        } else {
            Some(String::from_utf8_lossy(&self.buffer).into_owned())
        }
    }
}

/// Ordered accumulation of streamed text.
#[derive(Debug, Default)]
pub struct StreamText {
    parts: Vec<String>,
    done: bool,
}

impl StreamText {
    /// Folds one event in. Returns the newly added text, if the event carried any.
    pub fn apply(&mut self, event: StreamEvent) -> Option<&str> {
        match event {
            StreamEvent::Skip => None,
            StreamEvent::Done => {
                self.done = true;
                None
            }
            StreamEvent::Text(text) => {
                self.parts.push(text);
                self.parts.last().map(String::as_str)
            }
        }
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Joins the received pieces with newlines.
    pub fn into_text(self) -> String {
        self.parts.join("\n")
    }
}

/// Consumes a streamed body to completion, forwarding each piece of text to `sink`.
pub async fn read_stream<S, B, E>(body: S, sink: &mut dyn ChunkSink) -> Result<String, ChatError>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Into<ChatError>,
{
    let mut body = std::pin::pin!(body);
    let mut decoder = LineDecoder::default();
    let mut text = StreamText::default();

    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(Into::<ChatError>::into)?;
        for line in decoder.push(chunk.as_ref()) {
            trace!("stream line: {line}");
            if let Some(piece) = text.apply(parse_line(&line)?) {
                sink.accept(piece);
            }
            if text.is_done() {
                return Ok(text.into_text());
            }
        }
    }

    if let Some(line) = decoder.finish() {
        if let Some(piece) = text.apply(parse_line(&line)?) {
            sink.accept(piece);
        }
    }

    Ok(text.into_text())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    fn body(chunks: Vec<&'static str>) -> impl Stream<Item = Result<&'static str, ChatError>> {
        stream::iter(chunks.into_iter().map(Ok))
    }

    #[test]
    fn parses_message_and_delta_fragments() {
        assert_eq!(
            parse_line(r#"{"choices":[{"message":{"content":"hi"}}]}"#).unwrap(),
            StreamEvent::Text("hi".into())
        );
        assert_eq!(
            parse_line(r#"data: {"choices":[{"delta":{"content":"yo"}}]}"#).unwrap(),
            StreamEvent::Text("yo".into())
        );
        assert_eq!(parse_line("data: [DONE]").unwrap(), StreamEvent::Done);
        assert_eq!(parse_line("   ").unwrap(), StreamEvent::Skip);
        assert_eq!(parse_line(r#"{"id":"x"}"#).unwrap(), StreamEvent::Skip);
        assert_eq!(
            parse_line(r#"{"choices":[{"delta":{"role":"assistant"}}]}"#).unwrap(),
            StreamEvent::Skip
        );
    }

    #[test]
    fn malformed_line_is_an_error() {
        assert!(parse_line("{\"choices\": [").is_err());
        assert!(parse_line("not json").is_err());
    }

    #[test]
    fn decoder_reassembles_split_lines() {
        let mut decoder = LineDecoder::default();
        assert!(decoder.push(b"{\"a\":").is_empty());
        assert_eq!(decoder.push(b"1}\r\n{\"b\"").as_slice(), ["{\"a\":1}"]);
        assert_eq!(decoder.push(b":2}\n").as_slice(), ["{\"b\":2}"]);
        assert_eq!(decoder.finish(), None);

        let mut decoder = LineDecoder::default();
        decoder.push(b"tail");
        assert_eq!(decoder.finish().as_deref(), Some("tail"));
    }

    #[test]
    fn fold_joins_with_newlines() {
        let mut text = StreamText::default();
        assert_eq!(text.apply(StreamEvent::Text("First chunk".into())), Some("First chunk"));
        assert_eq!(text.apply(StreamEvent::Skip), None);
        assert_eq!(text.apply(StreamEvent::Text("Second chunk".into())), Some("Second chunk"));
        assert_eq!(text.into_text(), "First chunk\nSecond chunk");
    }

    #[tokio::test]
    async fn read_stream_forwards_each_chunk_in_order() {
        let mut seen = Vec::new();
        let mut sink = |chunk: &str| seen.push(chunk.to_string());

        let text = read_stream(
            body(vec![
                "{\"choices\":[{\"message\":{\"content\":\"First chunk\"}}]}\n{\"choi",
                "ces\":[{\"message\":{\"content\":\"Second chunk\"}}]}",
            ]),
            &mut sink,
        )
        .await
        .unwrap();

        assert_eq!(text, "First chunk\nSecond chunk");
        assert_eq!(seen, ["First chunk", "Second chunk"]);
    }

    #[tokio::test]
    async fn read_stream_stops_at_done_marker() {
        let text = read_stream(
            body(vec![
                "data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\n\n",
                "data: [DONE]\n\ndata: garbage\n",
            ]),
            &mut NullSink,
        )
        .await
        .unwrap();

        assert_eq!(text, "a");
    }

    #[tokio::test]
    async fn read_stream_fails_on_malformed_line() {
        let err = read_stream(
            body(vec!["{\"choices\":[{\"message\":{\"content\":\"a\"}}]}\n", "oops\n"]),
            &mut NullSink,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ChatError::Parse(_)));
    }

    #[tokio::test]
    async fn empty_stream_yields_empty_text() {
        let text = read_stream(body(vec![]), &mut NullSink).await.unwrap();
        assert_eq!(text, "");
    }
}
