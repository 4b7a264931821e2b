//! Value types shared by every part of the adapter.
//!
//! - **Errors**: [`RepositoryError`] is the chained error produced by the storage layer,
//!   [`ProtocolError`] is the chained error sent to clients, and [`DavError`] is the
//!   operational error returned by the codec and connection helpers.
//! - **Translation**: [`convert_err`], [`sanitize_err`] and [`log_err`] turn storage
//!   errors into protocol errors and report them.
//! - **URIs**: [`ResourceKind`] names the URI shapes, [`UriInfo`] is a parsed request URI.

mod error;
pub use error::DavError;

mod repos_error;
pub use repos_error::Chain;
pub use repos_error::ErrorKind;
pub use repos_error::RepositoryError;
pub use repos_error::REQUEST_FAILED;

mod dav_error;
pub use dav_error::convert_err;
pub use dav_error::log_err;
pub use dav_error::sanitize_err;
pub use dav_error::Iter;
pub use dav_error::ProtocolError;
pub use dav_error::SVN_ERROR_NAMESPACE;
pub use dav_error::SVN_ERROR_TAG;

mod uri;
pub use uri::ResourceKind;
pub use uri::Revnum;
pub use uri::UriInfo;
pub use uri::DEFAULT_VCC_NAME;
