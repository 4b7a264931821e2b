//! The client-visible error chain and its translation from storage errors.
//!
//! Every storage failure that reaches a client goes through [`convert_err`] or
//! [`sanitize_err`]. Both consume the [`RepositoryError`], purge its trace-only links,
//! choose the HTTP status, and emit one [`ProtocolError`] node per remaining link in
//! outer-to-inner order.

use http::StatusCode;
use thiserror::Error;
use tracing::{debug, error, info, trace, warn, Level};

use crate::protocol::{ErrorKind, RepositoryError, REQUEST_FAILED};

/// Namespace of the condition element attached to translated storage errors.
pub const SVN_ERROR_NAMESPACE: &str = "svn:";

/// Tag name of the condition element attached to translated storage errors.
pub const SVN_ERROR_TAG: &str = "error";

/// One node of a protocol error chain.
///
/// `prev` points at the next inner cause. Like [`RepositoryError`], dropping a chain is
/// iterative.
#[derive(Debug, Error)]
#[error("{}  [{}, #{}]", self.description().unwrap_or_default(), self.status.as_u16(), self.error_id)]
pub struct ProtocolError {
    status: StatusCode,
    error_id: i32,
    namespace: Option<&'static str>,
    tag: Option<&'static str>,
    description: Option<String>,
    #[source]
    prev: Option<Box<ProtocolError>>,
}

impl ProtocolError {
    /// Creates an untagged node. An `error_id` of zero stands for "request failed".
    pub fn new<S: ToString>(status: StatusCode, error_id: i32, description: S) -> Self {
        Self {
            status,
            error_id: normalize_error_id(error_id),
            namespace: None,
            tag: None,
            description: Some(description.to_string()),
            prev: None,
        }
    }

    /// Creates a node carrying the generic storage-error condition element.
    pub fn new_tagged<S: ToString>(status: StatusCode, error_id: i32, description: S) -> Self {
        let mut node = Self::new(status, error_id, description);
        node.namespace = Some(SVN_ERROR_NAMESPACE);
        node.tag = Some(SVN_ERROR_TAG);
        node
    }

    /// Pushes a new outermost node in front of `self`.
    #[must_use]
    pub fn push<S: ToString>(self, status: StatusCode, error_id: i32, description: S) -> Self {
        let mut outer = Self::new(status, error_id, description);
        outer.prev = Some(Box::new(self));
        outer
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn error_id(&self) -> i32 {
        self.error_id
    }

    pub fn namespace(&self) -> Option<&'static str> {
        self.namespace
    }

    pub fn tag(&self) -> Option<&'static str> {
        self.tag
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn prev(&self) -> Option<&ProtocolError> {
        self.prev.as_deref()
    }

    /// Iterates the chain from the outermost node to the innermost one.
    pub fn iter(&self) -> Iter<'_> {
        Iter { next: Some(self) }
    }

    /// Number of nodes in the chain.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// A chain always holds at least one node.
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl Drop for ProtocolError {
    fn drop(&mut self) {
        let mut next = self.prev.take();
        while let Some(mut node) = next {
            next = node.prev.take();
        }
    }
}

impl<'a> IntoIterator for &'a ProtocolError {
    type Item = &'a ProtocolError;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the nodes of a [`ProtocolError`] chain.
#[derive(Debug, Clone)]
pub struct Iter<'a> {
    next: Option<&'a ProtocolError>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a ProtocolError;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.prev();
        Some(current)
    }
}

fn normalize_error_id(error_id: i32) -> i32 {
    if error_id == 0 { REQUEST_FAILED } else { error_id }
}

/// Picks the status for an error kind, falling back to the caller's suggestion.
fn status_for(kind: ErrorKind, default_status: StatusCode) -> StatusCode {
    match kind {
        ErrorKind::NotFound | ErrorKind::NoSuchRevision => StatusCode::NOT_FOUND,
        ErrorKind::UnsupportedFeature => StatusCode::NOT_IMPLEMENTED,
        ErrorKind::LockOwnerMismatch | ErrorKind::PathAlreadyLocked => StatusCode::LOCKED,
        ErrorKind::PropBaseValueMismatch => StatusCode::PRECONDITION_FAILED,
        _ => default_status,
    }
}

/// Translates a storage error chain into a protocol error chain.
///
/// The status is taken from the outermost purged link when it has a dedicated mapping,
/// otherwise `status` is used. When `message` is given it becomes an extra outermost node,
/// unless a hook failure is somewhere in the chain: hook output is written by the
/// repository operator and must reach the client untouched.
pub fn convert_err(err: RepositoryError, status: StatusCode, message: Option<&str>) -> ProtocolError {
    let purged = err.purge_tracing();
    let outer_kind = purged.kind();
    let status = status_for(outer_kind, status);
    let has_hook_failure = purged.find_cause(ErrorKind::HookFailure);

    let mut links = purged.into_links();
    let mut chain: Option<ProtocolError> = None;
    while let Some(link) = links.pop() {
        let mut node = ProtocolError::new_tagged(status, link.kind().code(), link.best_message());
        node.prev = chain.take().map(Box::new);
        chain = Some(node);
    }

    // into_links never returns an empty vector
    let derr = chain.unwrap_or_else(|| ProtocolError::new_tagged(status, outer_kind.code(), outer_kind.default_message()));

    match message {
        Some(message) if !has_hook_failure => derr.push(status, outer_kind.code(), message),
        _ => derr,
    }
}

/// Replaces the client-visible text of `err` with `new_msg`, logging the original chain.
///
/// Each purged link is logged on its own line, outer to inner. Chains containing a hook
/// failure are never replaced. Without a replacement the chain is translated as-is, with
/// its outermost message repeated as the summary node.
pub fn sanitize_err(err: RepositoryError, new_msg: Option<&str>, status: StatusCode) -> ProtocolError {
    let purged = err.purge_tracing();

    let safe_err = match new_msg.filter(|msg| !msg.is_empty()) {
        Some(new_msg) if !purged.find_cause(ErrorKind::HookFailure) => {
            for link in purged.chain() {
                error!(code = link.kind().code(), "{}", link.best_message());
            }
            RepositoryError::new(purged.kind(), new_msg)
        }
        _ => purged,
    };

    let summary = safe_err.best_message().to_string();
    convert_err(safe_err, status, Some(&summary))
}

/// Logs every described node of the chain, outer to inner, at `level`.
pub fn log_err(err: &ProtocolError, level: Level) {
    for node in err.iter() {
        let Some(desc) = node.description() else {
            continue;
        };
        let status = node.status().as_u16();
        let error_id = node.error_id();

        if level == Level::ERROR {
            error!("{desc}  [{status}, #{error_id}]");
        } else if level == Level::WARN {
            warn!("{desc}  [{status}, #{error_id}]");
        } else if level == Level::INFO {
            info!("{desc}  [{status}, #{error_id}]");
        } else if level == Level::DEBUG {
            debug!("{desc}  [{status}, #{error_id}]");
        } else {
            trace!("{desc}  [{status}, #{error_id}]");
        }
    }
}
