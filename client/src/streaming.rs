//! Streaming compile: issue the request, consume the event stream
//! incrementally, deliver events in frame order, and complete exactly once.

use futures::StreamExt;

use crate::client::CompileClient;
use crate::error::ClientError;
use crate::events::{CompileEvent, CompileObserver, CompletionLatch};
use crate::request::CompileRequest;

impl CompileClient {
    /// Compile `request`, streaming events into `observer`.
    ///
    /// Completion is signaled through `observer.on_complete`, never through
    /// the return value, and fires exactly once per call no matter how the
    /// stream ends: `end` envelope, abrupt server-side closure, initial
    /// non-success status, or a transport failure mid-stream. Failures are
    /// reported through `on_error` before completion; nothing here is fatal
    /// to the caller.
    pub async fn compile_streaming(
        &self,
        request: &CompileRequest,
        observer: &mut dyn CompileObserver,
    ) {
        let latch = CompletionLatch::new();
        if let Err(err) = self.stream_events(request, observer, &latch).await {
            observer.on_error(&err.to_string());
        }
        if latch.fire() {
            observer.on_complete();
        }
    }

    async fn stream_events(
        &self,
        request: &CompileRequest,
        observer: &mut dyn CompileObserver,
        latch: &CompletionLatch,
    ) -> crate::Result<()> {
        // The streaming endpoint always pins json_output off; the sync
        // endpoint is the one that honors it.
        let wire_request = CompileRequest {
            json_output: false,
            ..request.clone()
        };

        let response = self
            .http()
            .post(self.config().compile_url())
            .json(&wire_request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = ClientError::from_failure(status, &body);
            observer.on_error(&err.to_string());
            return Ok(());
        }

        let mut body = response.bytes_stream();
        let mut lines = LineBuffer::default();
        while let Some(chunk) = body.next().await {
            for line in lines.extend(&chunk?) {
                match CompileEvent::parse_line(&line) {
                    Some(CompileEvent::End) => {
                        if latch.fire() {
                            observer.on_complete();
                        }
                        return Ok(());
                    }
                    Some(event) => event.dispatch(observer),
                    None => {}
                }
            }
        }

        // Natural closure without an `end` envelope; the caller completes.
        Ok(())
    }
}

/// Accumulates raw body bytes and drains complete lines.
///
/// Splitting happens on byte boundaries so a UTF-8 sequence (or a JSON
/// event) torn across two network chunks reassembles before decoding. An
/// incomplete trailing fragment stays buffered for the next chunk.
#[derive(Debug, Default)]
struct LineBuffer {
    buf: Vec<u8>,
}

impl LineBuffer {
    fn extend(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);
        let mut lines = Vec::new();
        while let Some(newline) = self.buf.iter().position(|&b| b == b'\n') {
            let rest = self.buf.split_off(newline + 1);
            let mut line = std::mem::replace(&mut self.buf, rest);
            line.pop();
            lines.push(String::from_utf8_lossy(&line).into_owned());
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_lines_drain_and_fragment_is_retained() {
        let mut buffer = LineBuffer::default();
        let lines = buffer.extend(b"first\nsecond\npartial");
        assert_eq!(lines, vec!["first", "second"]);
        assert_eq!(buffer.extend(b" tail\n"), vec!["partial tail"]);
    }

    #[test]
    fn line_split_across_many_chunks_reassembles() {
        let mut buffer = LineBuffer::default();
        assert!(buffer.extend(b"data: {\"type\":\"log\",").is_empty());
        assert!(buffer.extend(b"\"content\":\"par").is_empty());
        let lines = buffer.extend(b"sing\"}\n");
        assert_eq!(lines, vec![r#"data: {"type":"log","content":"parsing"}"#]);
    }

    #[test]
    fn multibyte_utf8_split_across_chunks_survives() {
        let text = "data: {\"type\":\"log\",\"content\":\"héllo\"}\n";
        let bytes = text.as_bytes();
        // Split inside the two-byte 'é' sequence.
        let split = text.find('é').unwrap() + 1;
        let mut buffer = LineBuffer::default();
        assert!(buffer.extend(&bytes[..split]).is_empty());
        let lines = buffer.extend(&bytes[split..]);
        assert_eq!(lines, vec![text.trim_end_matches('\n')]);
    }

    #[test]
    fn empty_chunks_produce_nothing() {
        let mut buffer = LineBuffer::default();
        assert!(buffer.extend(b"").is_empty());
        assert_eq!(buffer.extend(b"\n"), vec![""]);
    }
}
