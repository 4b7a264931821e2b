//! Encoding and decoding of everything that crosses the wire.
//!
//! # Components
//!
//! - [`uri`]: builds and parses the repository URI namespace ([`build_uri`], [`parse_uri`])
//! - [`body`]: reads a request body into memory under a size limit ([`read_bounded`])
//! - [`error_response`]: renders protocol error chains as XML error documents
//! - [`xml`]: escaping helpers, including the lenient author escaping for native clients
//!
//! All functions here are pure or operate on a single request's data; none of them hold
//! state across requests.

pub mod body;
pub mod error_response;
pub mod uri;
pub mod xml;

pub use body::read_bounded;
pub use body::read_request_body;
pub use body::BoundedBody;
pub use error_response::error_response;
pub use error_response::render_error;
pub use uri::build_uri;
pub use uri::is_parent_path_list;
pub use uri::parse_uri;
pub use uri::test_canonical;
pub use xml::escape_author;
