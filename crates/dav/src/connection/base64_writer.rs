use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use bytes::BytesMut;

use crate::connection::{Output, ResponseSink};
use crate::protocol::DavError;

/// Base64-encodes bytes into an [`Output`], without line breaks.
///
/// Input is encoded in whole 3-byte groups as it arrives; up to two trailing bytes wait
/// for more input. [`Base64Writer::finish`] must be called to emit them with padding;
/// dropping the writer discards them.
#[derive(Debug)]
#[must_use = "call `finish` to write the padded tail"]
pub struct Base64Writer<'a, W> {
    output: &'a mut Output<W>,
    pending: BytesMut,
}

impl<'a, W> Base64Writer<'a, W>
where
    W: ResponseSink,
{
    pub(crate) fn new(output: &'a mut Output<W>) -> Self {
        Self { output, pending: BytesMut::with_capacity(3) }
    }

    pub async fn write(&mut self, data: &[u8]) -> Result<(), DavError> {
        self.pending.extend_from_slice(data);

        let whole = self.pending.len() / 3 * 3;
        if whole == 0 {
            return Ok(());
        }

        let group = self.pending.split_to(whole);
        let encoded = BASE64.encode(&group);
        self.output.write(encoded.as_bytes()).await
    }

    /// Writes the padded encoding of any remaining bytes.
    pub async fn finish(mut self) -> Result<(), DavError> {
        if self.pending.is_empty() {
            return Ok(());
        }

        let encoded = BASE64.encode(&self.pending);
        self.pending.clear();
        self.output.write(encoded.as_bytes()).await
    }
}
