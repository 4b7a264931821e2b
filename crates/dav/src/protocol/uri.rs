//! Resource kinds and the result of parsing a request URI.

/// A repository revision number.
pub type Revnum = u64;

/// Name of the single version-controlled configuration resource.
pub const DEFAULT_VCC_NAME: &str = "default";

/// The shapes of URI the adapter can build.
///
/// Only [`ResourceKind::Public`], [`ResourceKind::Version`] and [`ResourceKind::RevRoot`]
/// URIs can be parsed back; the others are handed out to clients but arrive through other
/// request paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// `root/special/act/`
    ActCollection,
    /// `root/special/bln/{rev}`
    Baseline,
    /// `root/special/bc/{rev}/{path}`
    BaselineCollection,
    /// `root/{path}`
    Public,
    /// `root/special/ver/{rev}/{path}`
    Version,
    /// `root/special/rvr/{rev}/{path}`
    RevRoot,
    /// `root/special/vcc/default`
    Vcc,
}

/// What a request URI refers to inside the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriInfo {
    repos_path: String,
    revision: Option<Revnum>,
    activity_id: Option<String>,
}

impl UriInfo {
    pub(crate) fn public(repos_path: String) -> Self {
        Self { repos_path, revision: None, activity_id: None }
    }

    pub(crate) fn versioned(revision: Revnum, repos_path: String) -> Self {
        Self { repos_path, revision: Some(revision), activity_id: None }
    }

    pub(crate) fn activity(activity_id: String) -> Self {
        Self { repos_path: String::from("/"), revision: None, activity_id: Some(activity_id) }
    }

    /// Path inside the repository, always starting with `/`.
    pub fn repos_path(&self) -> &str {
        &self.repos_path
    }

    /// Set only for version and revision-root URIs.
    pub fn revision(&self) -> Option<Revnum> {
        self.revision
    }

    /// Raw, undecoded activity id of an activity URI.
    pub fn activity_id(&self) -> Option<&str> {
        self.activity_id.as_deref()
    }
}
