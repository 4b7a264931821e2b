//! Chained errors raised by the storage layer.
//!
//! A [`RepositoryError`] is a singly-linked list of causes, outermost first. It never
//! crosses the protocol boundary as-is: the translator in [`crate::protocol::convert_err`]
//! consumes it and produces a [`crate::protocol::ProtocolError`] chain.

use std::fmt;
use thiserror::Error;

/// Generic "request failed" error id used when no specific id is known.
pub const REQUEST_FAILED: i32 = 175_002;

/// Storage and adapter failure categories, each with a stable numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A pure diagnostic link recorded while the error travelled up the call stack.
    Traced,
    NotFound,
    NoSuchRevision,
    UnsupportedFeature,
    LockOwnerMismatch,
    PathAlreadyLocked,
    PropBaseValueMismatch,
    /// An operator-authored hook script rejected the operation.
    HookFailure,
    MalformedUri,
    ConnectionAborted,
    RequestFailed,
    Other(i32),
}

impl ErrorKind {
    pub fn code(self) -> i32 {
        match self {
            Self::Traced => 0,
            Self::NotFound => 160_013,
            Self::NoSuchRevision => 160_006,
            Self::UnsupportedFeature => 200_007,
            Self::LockOwnerMismatch => 160_039,
            Self::PathAlreadyLocked => 160_035,
            Self::PropBaseValueMismatch => 160_049,
            Self::HookFailure => 165_001,
            Self::MalformedUri => 190_001,
            Self::ConnectionAborted => 190_004,
            Self::RequestFailed => REQUEST_FAILED,
            Self::Other(code) => code,
        }
    }

    /// Text used for a link that was created without a message of its own.
    pub fn default_message(self) -> &'static str {
        match self {
            Self::Traced => "Traced call",
            Self::NotFound => "Filesystem has no item",
            Self::NoSuchRevision => "Invalid filesystem revision number",
            Self::UnsupportedFeature => "Trying to use an unsupported feature",
            Self::LockOwnerMismatch => "Username does not match lock owner",
            Self::PathAlreadyLocked => "Path is already locked",
            Self::PropBaseValueMismatch => "Value of property in the repository differs from the expected base value",
            Self::HookFailure => "Repository hook failed",
            Self::MalformedUri => "The URI is malformed",
            Self::ConnectionAborted => "The client connection was aborted",
            Self::RequestFailed => "The HTTP request failed",
            Self::Other(_) => "Unknown error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.code())
    }
}

/// One link of a storage error chain.
///
/// Dropping a chain is iterative, so arbitrarily deep chains are safe to discard.
#[derive(Debug, Error)]
#[error("{}", self.best_message())]
pub struct RepositoryError {
    kind: ErrorKind,
    message: Option<String>,
    #[source]
    child: Option<Box<RepositoryError>>,
}

impl RepositoryError {
    pub fn new<S: ToString>(kind: ErrorKind, message: S) -> Self {
        Self { kind, message: Some(message.to_string()), child: None }
    }

    /// Creates a link that relies on the kind's default message.
    pub fn from_kind(kind: ErrorKind) -> Self {
        Self { kind, message: None, child: None }
    }

    /// Creates a new outermost link whose cause is `self`.
    #[must_use]
    pub fn wrap<S: ToString>(self, kind: ErrorKind, message: S) -> Self {
        Self { kind, message: Some(message.to_string()), child: Some(Box::new(self)) }
    }

    /// Wraps `self` in a trace-only link.
    #[must_use]
    pub fn traced(self) -> Self {
        Self { kind: ErrorKind::Traced, message: None, child: Some(Box::new(self)) }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// The link's own message, or the kind's default text when it has none.
    pub fn best_message(&self) -> &str {
        self.message.as_deref().unwrap_or(self.kind.default_message())
    }

    pub fn child(&self) -> Option<&RepositoryError> {
        self.child.as_deref()
    }

    pub fn is_traced(&self) -> bool {
        self.kind == ErrorKind::Traced
    }

    /// Iterates the chain from the outermost link to the innermost cause.
    pub fn chain(&self) -> Chain<'_> {
        Chain { next: Some(self) }
    }

    /// Returns true if any link of the chain has the given kind.
    pub fn find_cause(&self, kind: ErrorKind) -> bool {
        self.chain().any(|link| link.kind == kind)
    }

    /// Removes every trace-only link, keeping the remaining links in order.
    ///
    /// If the chain holds nothing but trace links, its innermost link survives so the
    /// result is never empty.
    #[must_use]
    pub fn purge_tracing(self) -> RepositoryError {
        let mut outer = Vec::new();
        let mut current = self;
        while let Some(child) = current.child.take() {
            outer.push(current);
            current = *child;
        }

        let mut head = current;
        let mut head_is_placeholder = head.is_traced();
        for mut link in outer.into_iter().rev() {
            if link.is_traced() {
                continue;
            }
            if !head_is_placeholder {
                link.child = Some(Box::new(head));
            }
            head = link;
            head_is_placeholder = false;
        }
        head
    }

    /// Detaches the links of the chain, outermost first.
    pub(crate) fn into_links(self) -> Vec<RepositoryError> {
        let mut links = Vec::new();
        let mut current = self;
        while let Some(child) = current.child.take() {
            links.push(current);
            current = *child;
        }
        links.push(current);
        links
    }
}

impl Drop for RepositoryError {
    fn drop(&mut self) {
        let mut next = self.child.take();
        while let Some(mut link) = next {
            next = link.child.take();
        }
    }
}

/// Iterator over the links of a [`RepositoryError`] chain.
#[derive(Debug, Clone)]
pub struct Chain<'a> {
    next: Option<&'a RepositoryError>,
}

impl<'a> Iterator for Chain<'a> {
    type Item = &'a RepositoryError;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.child();
        Some(current)
    }
}
