//! The repository handle used while serving one request.
//!
//! The storage engine itself lives elsewhere; this module only describes what the adapter
//! needs from it ([`Storage`]) and keeps the per-handle state the adapter is allowed to
//! cache: the youngest revision, read once on first use.

use tracing::debug;

use crate::codec::uri;
use crate::config::DavConfig;
use crate::protocol::{DavError, RepositoryError, ResourceKind, Revnum, UriInfo};

/// How a path at one revision relates to the same path at another revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRelation {
    /// Both refer to the very same node revision.
    Unchanged,
    /// Same node, different node revisions.
    CommonAncestor,
    Unrelated,
}

/// Lookups the adapter needs from the versioned storage engine.
#[cfg_attr(test, mockall::automock)]
pub trait Storage {
    fn youngest_rev(&self) -> Result<Revnum, RepositoryError>;

    /// The most recent revision at or before `revision` in which `path` was modified or
    /// copied.
    fn last_history_rev(&self, revision: Revnum, path: &str) -> Result<Revnum, RepositoryError>;

    fn node_relation(&self, revision_a: Revnum, revision_b: Revnum, path: &str) -> Result<NodeRelation, RepositoryError>;
}

/// A repository opened for one request.
#[derive(Debug)]
pub struct Repository<S> {
    storage: S,
    root_path: String,
    special_uri: String,
    youngest: Option<Revnum>,
}

impl<S> Repository<S>
where
    S: Storage,
{
    pub fn new(storage: S, config: &DavConfig) -> Self {
        Self {
            storage,
            root_path: config.root_path().to_string(),
            special_uri: config.special_uri().to_string(),
            youngest: None,
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn root_path(&self) -> &str {
        &self.root_path
    }

    pub fn special_uri(&self) -> &str {
        &self.special_uri
    }

    /// The youngest revision, fetched from storage on first use and cached afterwards.
    pub fn youngest_rev(&mut self) -> Result<Revnum, RepositoryError> {
        if let Some(youngest) = self.youngest {
            return Ok(youngest);
        }

        let youngest = self.storage.youngest_rev()?;
        self.youngest = Some(youngest);
        Ok(youngest)
    }

    /// The oldest revision that can stand in for `revision` when referring to `path`.
    ///
    /// That is the last revision that changed `path`, provided the node there is unchanged
    /// in `revision`. Any storage failure falls back to `revision` itself.
    pub fn safe_created_rev(&self, revision: Revnum, path: &str) -> Revnum {
        let history_rev = match self.storage.last_history_rev(revision, path) {
            Ok(history_rev) => history_rev,
            Err(e) => {
                debug!(cause = %e, revision, path, "couldn't find last history rev");
                return revision;
            }
        };

        match self.storage.node_relation(revision, history_rev, path) {
            Ok(NodeRelation::Unchanged) => history_rev,
            Ok(_) => revision,
            Err(e) => {
                debug!(cause = %e, revision, history_rev, path, "couldn't compare node across revisions");
                revision
            }
        }
    }

    pub fn build_uri(&self, kind: ResourceKind, revision: Revnum, path: Option<&str>, add_href: bool) -> String {
        uri::build_uri(kind, &self.root_path, &self.special_uri, revision, path, add_href)
    }

    pub fn parse_uri(&self, uri: &str) -> Result<UriInfo, DavError> {
        uri::parse_uri(uri, &self.root_path, &self.special_uri)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ErrorKind;
    use mockall::predicate::eq;

    fn config() -> DavConfig {
        DavConfig::builder().root_path("/repos").build().unwrap()
    }

    #[test]
    fn youngest_rev_is_cached() {
        let mut storage = MockStorage::new();
        storage.expect_youngest_rev().times(1).returning(|| Ok(42));

        let mut repos = Repository::new(storage, &config());
        assert_eq!(repos.youngest_rev().unwrap(), 42);
        assert_eq!(repos.youngest_rev().unwrap(), 42);
    }

    #[test]
    fn youngest_rev_error_is_not_cached() {
        let mut storage = MockStorage::new();
        let mut calls = 0;
        storage.expect_youngest_rev().times(2).returning(move || {
            calls += 1;
            if calls == 1 { Err(RepositoryError::new(ErrorKind::Other(1), "db locked")) } else { Ok(7) }
        });

        let mut repos = Repository::new(storage, &config());
        assert!(repos.youngest_rev().is_err());
        assert_eq!(repos.youngest_rev().unwrap(), 7);
    }

    #[test]
    fn safe_created_rev_uses_unchanged_history_rev() {
        let mut storage = MockStorage::new();
        storage.expect_last_history_rev().with(eq(20), eq("/trunk/a")).returning(|_, _| Ok(12));
        storage.expect_node_relation().with(eq(20), eq(12), eq("/trunk/a")).returning(|_, _, _| Ok(NodeRelation::Unchanged));

        let repos = Repository::new(storage, &config());
        assert_eq!(repos.safe_created_rev(20, "/trunk/a"), 12);
    }

    #[test]
    fn safe_created_rev_keeps_revision_when_node_changed() {
        let mut storage = MockStorage::new();
        storage.expect_last_history_rev().returning(|_, _| Ok(12));
        storage.expect_node_relation().returning(|_, _, _| Ok(NodeRelation::CommonAncestor));

        let repos = Repository::new(storage, &config());
        assert_eq!(repos.safe_created_rev(20, "/trunk/a"), 20);
    }

    #[test]
    fn safe_created_rev_falls_back_on_errors() {
        let mut storage = MockStorage::new();
        storage.expect_last_history_rev().returning(|_, _| Err(RepositoryError::from_kind(ErrorKind::NotFound)));
        storage.expect_node_relation().never();

        let repos = Repository::new(storage, &config());
        assert_eq!(repos.safe_created_rev(20, "/gone"), 20);

        let mut storage = MockStorage::new();
        storage.expect_last_history_rev().returning(|_, _| Ok(3));
        storage
            .expect_node_relation()
            .returning(|_, _, _| Err(RepositoryError::from_kind(ErrorKind::NoSuchRevision)));

        let repos = Repository::new(storage, &config());
        assert_eq!(repos.safe_created_rev(20, "/trunk"), 20);
    }

    #[test]
    fn uri_helpers_use_handle_paths() {
        let repos = Repository::new(MockStorage::new(), &config());

        let uri = repos.build_uri(ResourceKind::Version, 5, Some("/trunk/a b"), false);
        assert_eq!(uri, "/repos/!svn/ver/5/trunk/a%20b");

        let info = repos.parse_uri(&uri).unwrap();
        assert_eq!(info.revision(), Some(5));
        assert_eq!(info.repos_path(), "/trunk/a b");
    }
}
