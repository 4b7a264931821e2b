use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::AsyncWrite;

use crate::connection::ResponseSink;

/// In-memory response sink with switchable failure and abort state.
#[derive(Debug, Default)]
pub(crate) struct MockSink {
    pub(crate) written: Vec<u8>,
    pub(crate) flushes: usize,
    pub(crate) aborted: bool,
    pub(crate) fail: bool,
    pub(crate) sent_before: u64,
    /// Total bytes accepted before writes start failing.
    pub(crate) accept_limit: Option<usize>,
}

impl MockSink {
    pub(crate) fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }

    pub(crate) fn accepting(limit: usize) -> Self {
        Self { accept_limit: Some(limit), ..Self::default() }
    }

    pub(crate) fn written_str(&self) -> &str {
        std::str::from_utf8(&self.written).unwrap()
    }
}

impl AsyncWrite for MockSink {
    fn poll_write(mut self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        if self.fail {
            return Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "broken pipe")));
        }
        let len = match self.accept_limit {
            Some(limit) if self.written.len() >= limit => {
                return Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "broken pipe")));
            }
            Some(limit) => buf.len().min(limit - self.written.len()),
            None => buf.len(),
        };
        self.written.extend_from_slice(&buf[..len]);
        Poll::Ready(Ok(len))
    }

    fn poll_flush(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        if self.fail {
            return Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "broken pipe")));
        }
        self.flushes += 1;
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

impl ResponseSink for MockSink {
    fn is_aborted(&self) -> bool {
        self.aborted
    }

    fn sent_body_bytes(&self) -> u64 {
        self.sent_before
    }
}
