//! Writing response bodies to the host transport.
//!
//! [`Output`] binds one response to a [`ResponseSink`]. Every write is handed to the sink
//! immediately and followed by a check of the connection's abort flag; once an abort has
//! been seen, all later writes fail with [`crate::protocol::DavError::ConnectionAborted`]
//! without touching the sink. [`Base64Writer`] layers base64 encoding on top of an
//! [`Output`] for binary payloads inside XML responses.

mod base64_writer;
mod output;

#[cfg(test)]
pub(crate) mod mock;

pub use base64_writer::Base64Writer;
pub use output::Output;
pub use output::ResponseSink;
