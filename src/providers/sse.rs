//! Server-sent events parsing for streamed model responses
//!
//! Turns a raw byte stream into a stream of `data:` payloads, one per event.
//!
//! Field processing:
//! - events are separated by a blank line (`\n\n` or `\r\n\r\n`)
//! - `data:` lines of one event are joined with `\n`
//! - comments (`:`), `id:`, `event:` and `retry:` carry no payload
//! - events without data are skipped
//!
//! Bytes are buffered until an event is complete, so a UTF-8 sequence split
//! across network reads decodes correctly.

use crate::error::{DescriboError, Result};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::collections::VecDeque;
use std::pin::Pin;

struct SseState<S> {
    inner: Pin<Box<S>>,
    buffer: Vec<u8>,
    pending: VecDeque<String>,
    done: bool,
}

impl<S> SseState<S> {
    fn drain_complete_events(&mut self) {
        while let Some((pos, len)) = find_event_boundary(&self.buffer) {
            let block: Vec<u8> = self.buffer.drain(..pos + len).take(pos).collect();
            if let Some(data) = parse_event(&String::from_utf8_lossy(&block)) {
                self.pending.push_back(data);
            }
        }
    }

    fn flush_remaining(&mut self) {
        if !self.buffer.is_empty() {
            let block = std::mem::take(&mut self.buffer);
            if let Some(data) = parse_event(&String::from_utf8_lossy(&block)) {
                self.pending.push_back(data);
            }
        }
    }
}

/// Parse an SSE byte stream into its `data:` payloads
///
/// A transport error ends the stream with `DescriboError::Stream`.
///
/// # Examples
///
/// ```
/// use bytes::Bytes;
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() {
/// let body = vec![Ok::<_, std::io::Error>(Bytes::from_static(b"data: one\n\ndata: two\n\n"))];
/// let events: Vec<String> = describo::providers::sse::data_events(futures::stream::iter(body))
///     .map(|e| e.unwrap())
///     .collect()
///     .await;
/// assert_eq!(events, vec!["one", "two"]);
/// # }
/// ```
pub fn data_events<S, E>(byte_stream: S) -> impl Stream<Item = Result<String>> + Send
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Send + 'static,
    E: std::fmt::Display + Send,
{
    let state = SseState {
        inner: Box::pin(byte_stream),
        buffer: Vec::new(),
        pending: VecDeque::new(),
        done: false,
    };

    futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(data) = state.pending.pop_front() {
                return Some((Ok(data), state));
            }
            if state.done {
                return None;
            }
            match state.inner.next().await {
                Some(Ok(chunk)) => {
                    state.buffer.extend_from_slice(&chunk);
                    state.drain_complete_events();
                }
                Some(Err(e)) => {
                    state.done = true;
                    state.buffer.clear();
                    tracing::error!("Response stream interrupted: {}", e);
                    let err = DescriboError::Stream(format!("Response stream interrupted: {}", e));
                    return Some((Err(err.into()), state));
                }
                None => {
                    state.done = true;
                    state.flush_remaining();
                }
            }
        }
    })
}

/// Position and length of the first event separator in `buf`
fn find_event_boundary(buf: &[u8]) -> Option<(usize, usize)> {
    let lf = find(buf, b"\n\n").map(|pos| (pos, 2));
    let crlf = find(buf, b"\r\n\r\n").map(|pos| (pos, 4));
    match (lf, crlf) {
        (Some(a), Some(b)) => Some(if b.0 <= a.0 { b } else { a }),
        (a, b) => a.or(b),
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Extract the joined `data:` payload of one event block
fn parse_event(block: &str) -> Option<String> {
    let mut data_lines: Vec<&str> = Vec::new();

    for line in block.lines() {
        if let Some(value) = line.strip_prefix("data:") {
            data_lines.push(value.strip_prefix(' ').unwrap_or(value));
        }
        // `id:`, `event:`, `retry:` and `:` comments carry no payload.
    }

    let data = data_lines.join("\n");
    if data.trim().is_empty() {
        None
    } else {
        Some(data)
    }
}
