//! The protocol adapter core of a WebDAV server for a versioned filesystem
//!
//! This crate holds the per-request plumbing that sits between an HTTP host and a
//! versioned storage engine: mapping URIs onto repository locations, turning storage
//! error chains into client-visible error documents, reading request bodies under a size
//! limit, and writing response bodies to a connection that may vanish at any moment.
//!
//! # Features
//!
//! - Parsing and building of the repository URI namespace
//! - Translation of chained storage errors into HTTP status codes and XML error documents
//! - Bounded, asynchronous request body reading on top of `http_body::Body`
//! - Buffered, abort-aware response writing with base64 streaming
//! - Lenient XML escaping of revision authors for native clients
//!
//! # Example
//!
//! ```
//! use http::StatusCode;
//! use micro_dav::codec::{error_response, parse_uri};
//! use micro_dav::config::DavConfig;
//! use micro_dav::protocol::{convert_err, ErrorKind, RepositoryError};
//!
//! let config = DavConfig::builder().root_path("/repos").build().unwrap();
//!
//! let info = parse_uri("/repos/!svn/ver/12/trunk/README", config.root_path(), config.special_uri()).unwrap();
//! assert_eq!(info.revision(), Some(12));
//! assert_eq!(info.repos_path(), "/trunk/README");
//!
//! let err = RepositoryError::new(ErrorKind::NotFound, "File not found: revision 12, path '/trunk/README'");
//! let response = error_response(&convert_err(err, StatusCode::INTERNAL_SERVER_ERROR, None));
//! assert_eq!(response.status(), StatusCode::NOT_FOUND);
//! ```
//!
//! # Architecture
//!
//! - [`codec`]: URI, request body, XML text and error document encoding
//! - [`connection`]: response output bound to the host transport
//! - [`protocol`]: error chains, error translation and URI value types
//! - [`repos`]: the repository handle and the storage lookups it needs
//! - [`config`]: per-location settings
//!
//! # Error Handling
//!
//! - [`protocol::RepositoryError`]: chained error produced by the storage engine
//! - [`protocol::ProtocolError`]: chained error rendered to clients
//! - [`protocol::DavError`]: operational error returned by codec and connection helpers

pub mod codec;
pub mod config;
pub mod connection;
pub mod protocol;
pub mod repos;

mod utils;
pub(crate) use utils::ensure;
