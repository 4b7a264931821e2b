//! Reading a whole request body into memory under a size limit.
//!
//! The limit is enforced twice: a declared `Content-Length` above the limit is rejected
//! before the body is polled at all, and the running total is checked after every frame,
//! which is the only protection for chunked bodies that declare nothing.

use std::cmp;
use std::fmt::Display;

use bytes::{Bytes, BytesMut};
use http::header::CONTENT_LENGTH;
use http::{HeaderValue, Request};
use http_body::Body;
use http_body_util::BodyExt;
use tracing::{error, trace};

use crate::config::DavConfig;
use crate::ensure;
use crate::protocol::DavError;

/// Upper bound of the buffer allocated before any body byte has arrived.
const MAX_PREALLOCATION: u64 = 1024 * 1024;

/// Accumulation state of a bounded body read.
#[derive(Debug)]
pub struct BoundedBody {
    accumulated: BytesMut,
    total_read: u64,
    limit: Option<u64>,
    end_reached: bool,
}

impl BoundedBody {
    /// Creates the accumulator for a body of `declared_length` bytes (zero when unknown).
    ///
    /// # Errors
    ///
    /// Returns [`DavError::EntityTooLarge`] if `declared_length` already exceeds `limit`.
    pub fn new(declared_length: u64, limit: Option<u64>) -> Result<Self, DavError> {
        let limit = limit.filter(|limit| *limit > 0);

        if let Some(limit) = limit {
            if declared_length > limit {
                error!(content_length = declared_length, limit, "requested content-length is larger than the configured limit");
                return Err(DavError::entity_too_large(format!(
                    "requested content-length of {declared_length} is larger than the configured limit of {limit}"
                )));
            }
        }

        let capacity = cmp::min(declared_length, MAX_PREALLOCATION) as usize;
        Ok(Self { accumulated: BytesMut::with_capacity(capacity), total_read: 0, limit, end_reached: false })
    }

    /// Appends one chunk, failing as soon as the running total passes the limit.
    ///
    /// # Errors
    ///
    /// Returns [`DavError::EntityTooLarge`] once `total_read` exceeds the limit. The chunk
    /// that crossed the limit is not kept.
    pub fn push(&mut self, chunk: &[u8]) -> Result<(), DavError> {
        self.total_read += chunk.len() as u64;

        if let Some(limit) = self.limit {
            if self.total_read > limit {
                error!(limit, "request body is larger than the configured limit");
                return Err(DavError::entity_too_large(format!("request body is larger than the configured limit of {limit}")));
            }
        }

        self.accumulated.extend_from_slice(chunk);
        Ok(())
    }

    pub fn finish(&mut self) {
        self.end_reached = true;
    }

    pub fn total_read(&self) -> u64 {
        self.total_read
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    pub fn is_end_reached(&self) -> bool {
        self.end_reached
    }

    pub fn capacity(&self) -> usize {
        self.accumulated.capacity()
    }

    /// Freezes the accumulated bytes.
    pub fn into_bytes(self) -> Bytes {
        self.accumulated.freeze()
    }
}

/// Parses a `Content-Length` header value.
///
/// # Errors
///
/// Any value that is not a plain non-negative decimal number is reported as
/// [`DavError::EntityTooLarge`].
pub fn parse_content_length(value: &HeaderValue) -> Result<u64, DavError> {
    let invalid = || {
        error!(content_length = ?value, "invalid Content-Length");
        DavError::entity_too_large("invalid Content-Length")
    };

    let value_str = value.to_str().map_err(|_| invalid())?;
    let length = value_str.parse::<i64>().map_err(|_| invalid())?;
    ensure!(length >= 0, invalid());

    u64::try_from(length).map_err(|_| invalid())
}

/// Reads `body` into memory.
///
/// `content_length` is the raw request header, if any. `limit` of `None` or zero disables
/// the size check.
///
/// # Errors
///
/// - [`DavError::EntityTooLarge`] for an invalid `Content-Length`, a declared length above
///   the limit (before any read), or a body that grows past the limit while reading
/// - [`DavError::BadRequest`] if the body itself fails
pub async fn read_bounded<B>(mut body: B, content_length: Option<&HeaderValue>, limit: Option<u64>) -> Result<Bytes, DavError>
where
    B: Body<Data = Bytes> + Unpin,
    B::Error: Display,
{
    let declared_length = match content_length {
        Some(value) => parse_content_length(value)?,
        None => 0,
    };

    let mut state = BoundedBody::new(declared_length, limit)?;

    while let Some(frame) = body.frame().await {
        let frame = frame.map_err(|e| {
            error!(cause = %e, "failed to read request body");
            DavError::bad_request(e.to_string())
        })?;

        // trailers carry no payload
        let Ok(data) = frame.into_data() else {
            continue;
        };

        trace!(len = data.len(), "read request body chunk");
        state.push(&data)?;
    }

    state.finish();
    Ok(state.into_bytes())
}

/// Reads the body of `request` under the location's configured limit.
///
/// # Errors
///
/// See [`read_bounded`].
pub async fn read_request_body<B>(request: Request<B>, config: &DavConfig) -> Result<Bytes, DavError>
where
    B: Body<Data = Bytes> + Unpin,
    B::Error: Display,
{
    let (parts, body) = request.into_parts();
    read_bounded(body, parts.headers.get(CONTENT_LENGTH), config.limit_xml_body()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use http_body::Frame;
    use http_body_util::{Empty, Full, StreamBody};
    use std::convert::Infallible;
    use std::io;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::task::{Context, Poll};

    /// Yields fixed-size chunks forever and counts how often it was polled for data.
    struct CountingBody {
        chunk: Bytes,
        remaining: usize,
        polls: Arc<AtomicUsize>,
    }

    impl Body for CountingBody {
        type Data = Bytes;
        type Error = Infallible;

        fn poll_frame(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            if self.remaining == 0 {
                return Poll::Ready(None);
            }
            self.remaining -= 1;
            Poll::Ready(Some(Ok(Frame::data(self.chunk.clone()))))
        }
    }

    fn counting_body(chunk_size: usize, chunks: usize) -> (CountingBody, Arc<AtomicUsize>) {
        let polls = Arc::new(AtomicUsize::new(0));
        let body = CountingBody { chunk: Bytes::from(vec![b'x'; chunk_size]), remaining: chunks, polls: polls.clone() };
        (body, polls)
    }

    #[tokio::test]
    async fn reads_whole_body() {
        let header = HeaderValue::from_static("11");
        let bytes = read_bounded(Full::new(Bytes::from_static(b"hello world")), Some(&header), Some(100)).await.unwrap();
        assert_eq!(&bytes[..], b"hello world");
    }

    #[tokio::test]
    async fn reads_chunked_body_without_limit() {
        let chunks = vec![Ok::<_, Infallible>(Frame::data(Bytes::from_static(b"<?xml"))), Ok(Frame::data(Bytes::from_static(b"/>")))];
        let body = StreamBody::new(stream::iter(chunks));

        let bytes = read_bounded(body, None, None).await.unwrap();
        assert_eq!(&bytes[..], b"<?xml/>");
    }

    #[tokio::test]
    async fn empty_body() {
        let bytes = read_bounded(Empty::<Bytes>::new(), None, Some(10)).await.unwrap();
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn invalid_content_length_is_rejected() {
        for value in ["abc", "12abc", "-1", "", " 12", "1.5"] {
            let header = HeaderValue::from_str(value).unwrap();
            let (body, polls) = counting_body(1, 1);
            let result = read_bounded(body, Some(&header), None).await;
            assert!(matches!(result, Err(DavError::EntityTooLarge { .. })), "value {value:?}");
            assert_eq!(polls.load(Ordering::SeqCst), 0);
        }
    }

    #[tokio::test]
    async fn declared_length_over_limit_reads_nothing() {
        let header = HeaderValue::from_static("1000001");
        let (body, polls) = counting_body(10, 10);

        let result = read_bounded(body, Some(&header), Some(1_000_000)).await;

        assert!(matches!(result, Err(DavError::EntityTooLarge { .. })));
        assert_eq!(polls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn undeclared_body_stops_at_the_crossing_chunk() {
        // 10-byte chunks against a 35-byte limit: chunk 4 brings the total to 40
        let (body, polls) = counting_body(10, 100);

        let result = read_bounded(body, None, Some(35)).await;

        assert!(matches!(result, Err(DavError::EntityTooLarge { .. })));
        assert_eq!(polls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn body_exactly_at_limit_is_accepted() {
        let (body, polls) = counting_body(10, 4);

        let bytes = read_bounded(body, None, Some(40)).await.unwrap();

        assert_eq!(bytes.len(), 40);
        assert_eq!(polls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn zero_limit_means_unlimited() {
        let (body, _polls) = counting_body(1024, 64);
        let bytes = read_bounded(body, None, Some(0)).await.unwrap();
        assert_eq!(bytes.len(), 64 * 1024);
    }

    #[tokio::test]
    async fn body_error_is_bad_request() {
        let chunks = vec![Ok(Frame::data(Bytes::from_static(b"partial"))), Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))];
        let body = StreamBody::new(stream::iter(chunks));

        let result = read_bounded(body, None, None).await;
        assert!(matches!(result, Err(DavError::BadRequest { .. })));
    }

    #[tokio::test]
    async fn request_body_uses_header_and_configured_limit() {
        let config = DavConfig::builder().limit_xml_body(8).build().unwrap();

        let request = Request::builder()
            .header(CONTENT_LENGTH, "5")
            .body(Full::new(Bytes::from_static(b"<a/>\n")))
            .unwrap();
        let bytes = read_request_body(request, &config).await.unwrap();
        assert_eq!(&bytes[..], b"<a/>\n");

        let request = Request::builder()
            .header(CONTENT_LENGTH, "9")
            .body(Full::new(Bytes::from_static(b"<a></a>\n")))
            .unwrap();
        let result = read_request_body(request, &config).await;
        assert!(matches!(result, Err(DavError::EntityTooLarge { .. })));
    }

    #[test]
    fn preallocation_is_capped() {
        let state = BoundedBody::new(u64::MAX / 2, None).unwrap();
        assert!(state.capacity() >= 1024 * 1024);
        assert!(state.capacity() < 2 * 1024 * 1024);

        let state = BoundedBody::new(100, Some(1000)).unwrap();
        assert!(state.capacity() >= 100);
        assert_eq!(state.limit(), Some(1000));
    }

    #[test]
    fn push_tracks_total() {
        let mut state = BoundedBody::new(0, Some(5)).unwrap();
        state.push(b"abc").unwrap();
        state.push(b"de").unwrap();
        assert_eq!(state.total_read(), 5);
        assert!(matches!(state.push(b"f"), Err(DavError::EntityTooLarge { .. })));
        assert!(!state.is_end_reached());
        state.finish();
        assert!(state.is_end_reached());
    }
}
