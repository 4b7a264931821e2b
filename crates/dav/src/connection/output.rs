use bytes::BytesMut;
use http::StatusCode;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, error};

use crate::config::{DavConfig, DEFAULT_OUTPUT_BUFFER_SIZE};
use crate::connection::Base64Writer;
use crate::ensure;
use crate::protocol::{DavError, ProtocolError};

/// The byte sink of one response, as supplied by the host transport.
///
/// Transports do not reliably report a dropped client as a write error, so the sink also
/// exposes the connection state as plain snapshots that [`Output`] reads after every write.
pub trait ResponseSink: AsyncWrite + Unpin {
    /// Whether the client connection has been aborted.
    fn is_aborted(&self) -> bool;

    /// Number of body bytes the transport has already sent for this response.
    fn sent_body_bytes(&self) -> u64;
}

/// Buffered, abort-aware writer bound to one response.
#[derive(Debug)]
pub struct Output<W> {
    sink: W,
    buffer: BytesMut,
    sent: u64,
    aborted: bool,
    finished: bool,
}

impl<W> Output<W>
where
    W: ResponseSink,
{
    pub fn new(sink: W) -> Self {
        Self::with_capacity(sink, DEFAULT_OUTPUT_BUFFER_SIZE)
    }

    /// Creates an output whose buffer is sized by the location's configuration.
    pub fn with_config(sink: W, config: &DavConfig) -> Self {
        Self::with_capacity(sink, config.output_buffer_size())
    }

    pub fn with_capacity(sink: W, buffer_size: usize) -> Self {
        Self { sink, buffer: BytesMut::with_capacity(buffer_size), sent: 0, aborted: false, finished: false }
    }

    #[inline]
    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    #[inline]
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.sink
    }

    pub fn into_inner(self) -> W {
        self.sink
    }

    /// Bytes this writer has handed to the sink so far.
    pub fn sent_bytes(&self) -> u64 {
        self.sent
    }

    /// Bytes buffered but not yet handed to the sink.
    pub fn pending_bytes(&self) -> usize {
        self.buffer.len()
    }

    /// Whether an aborted connection has been observed.
    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    pub async fn write(&mut self, data: &[u8]) -> Result<(), DavError> {
        self.check_open()?;
        self.buffer.extend_from_slice(data);
        self.pass().await
    }

    pub async fn puts(&mut self, text: &str) -> Result<(), DavError> {
        self.write(text.as_bytes()).await
    }

    /// Writes several strings as one unit.
    pub async fn put_many(&mut self, parts: &[&str]) -> Result<(), DavError> {
        self.check_open()?;
        for part in parts {
            self.buffer.extend_from_slice(part.as_bytes());
        }
        self.pass().await
    }

    pub async fn flush(&mut self) -> Result<(), DavError> {
        self.check_open()?;
        self.pass().await
    }

    /// Returns a stream that base64-encodes everything written to it into this output.
    ///
    /// The stream must be closed with [`Base64Writer::finish`].
    #[must_use = "call `finish` on the stream to write the padded tail"]
    pub fn base64_stream(&mut self) -> Base64Writer<'_, W> {
        Base64Writer::new(self)
    }

    /// Flushes whatever the response still holds and settles the error to report.
    ///
    /// A flush only happens if the response has already started (the transport or this
    /// writer sent bytes) or data is still buffered. A flush failure is reported only when
    /// no `preferred` error was given. Only the first call does any work.
    pub async fn final_flush_or_error(&mut self, preferred: Option<ProtocolError>) -> Option<ProtocolError> {
        if self.finished {
            return preferred;
        }
        self.finished = true;

        if self.aborted {
            debug!(pending = self.buffer.len(), "skipping final flush of aborted response");
            return preferred;
        }

        let do_flush = self.sink.sent_body_bytes() > 0 || self.sent > 0 || !self.buffer.is_empty();
        if !do_flush {
            return preferred;
        }

        match self.flush_buffer().await {
            Ok(()) => preferred,
            Err(e) if preferred.is_some() => {
                debug!(cause = %e, "final flush failed after an earlier error");
                preferred
            }
            Err(e) => {
                error!(cause = %e, "final flush of response failed");
                Some(ProtocolError::new(StatusCode::INTERNAL_SERVER_ERROR, 0, "Error flushing response output."))
            }
        }
    }

    fn check_open(&self) -> Result<(), DavError> {
        ensure!(!self.aborted, DavError::ConnectionAborted);
        Ok(())
    }

    async fn pass(&mut self) -> Result<(), DavError> {
        self.flush_buffer().await?;

        if self.sink.is_aborted() {
            debug!(sent = self.sent, "client connection aborted while writing response");
            self.aborted = true;
            return Err(DavError::ConnectionAborted);
        }
        Ok(())
    }

    async fn flush_buffer(&mut self) -> Result<(), DavError> {
        if !self.buffer.is_empty() {
            // the buffer advances past whatever the sink accepted, even on failure
            let before = self.buffer.len();
            let written = self.sink.write_all_buf(&mut self.buffer).await;
            self.sent += (before - self.buffer.len()) as u64;
            written?;
        }
        Ok(self.sink.flush().await?)
    }
}

/// Formats its arguments like [`format!`] and writes the result with [`Output::puts`].
///
/// ```ignore
/// printf!(output, "<S:target-revision rev=\"{}\"/>\n", revision).await?;
/// ```
#[macro_export]
macro_rules! printf {
    ($output:expr, $($arg:tt)*) => {
        $output.puts(&::std::format!($($arg)*))
    };
}
