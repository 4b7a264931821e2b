//! Building and parsing the adapter's URI namespace.
//!
//! Every repository is mounted under a root path. Below it, ordinary ("public") paths map
//! directly onto repository paths, while a reserved special segment (`!svn` by default)
//! introduces protocol-internal resources:
//!
//! ```text
//! /repos/trunk/README              public path /trunk/README
//! /repos/!svn/ver/17/trunk/README  /trunk/README as of revision 17
//! /repos/!svn/rvr/17/trunk         the revision-17 root, path /trunk
//! /repos/!svn/act/4a2c-...         an activity (transaction) id
//! ```
//!
//! Path components are percent-encoded one segment at a time; the root path and special
//! segment are emitted literally.

use std::borrow::Cow;

use http::{StatusCode, Uri};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::config::DavConfig;
use crate::ensure;
use crate::protocol::{DavError, ProtocolError, ResourceKind, Revnum, UriInfo, DEFAULT_VCC_NAME};

/// Bytes escaped inside a path segment: everything except alphanumerics, the unreserved
/// marks and the sub-delimiters allowed in a segment (`;` stays escaped).
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'$')
    .remove(b'&')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'*')
    .remove(b'+')
    .remove(b',')
    .remove(b'-')
    .remove(b'.')
    .remove(b':')
    .remove(b'=')
    .remove(b'@')
    .remove(b'_')
    .remove(b'~');

/// Builds the URI of a resource.
///
/// `revision` is ignored by kinds that carry no revision and `path` by kinds that carry no
/// path. A `None` path is treated as the repository root. With `add_href` the URI is
/// wrapped in a `<D:href>` element.
pub fn build_uri(
    kind: ResourceKind,
    root_path: &str,
    special_uri: &str,
    revision: Revnum,
    path: Option<&str>,
    add_href: bool,
) -> String {
    // a bare "/" root would otherwise produce "//" below
    let root = if root_path == "/" { "" } else { root_path };
    let path_uri = encode_path(path.unwrap_or("/"));

    let uri = match kind {
        ResourceKind::ActCollection => format!("{root}/{special_uri}/act/"),
        ResourceKind::Baseline => format!("{root}/{special_uri}/bln/{revision}"),
        ResourceKind::BaselineCollection => format!("{root}/{special_uri}/bc/{revision}{path_uri}"),
        ResourceKind::Public => format!("{root}{path_uri}"),
        ResourceKind::Version => format!("{root}/{special_uri}/ver/{revision}{path_uri}"),
        ResourceKind::RevRoot => format!("{root}/{special_uri}/rvr/{revision}{path_uri}"),
        ResourceKind::Vcc => format!("{root}/{special_uri}/vcc/{DEFAULT_VCC_NAME}"),
    };

    if add_href { format!("<D:href>{uri}</D:href>") } else { uri }
}

/// Parses a request URI relative to the repository mounted at `root_path`.
///
/// Query and fragment are ignored; `.`/`..` segments are resolved and repeated slashes
/// collapsed before matching.
///
/// # Errors
///
/// - [`DavError::MalformedUri`] if the URI cannot be parsed, does not live under
///   `root_path`, or a version URI has a non-numeric revision
/// - [`DavError::UnsupportedFeature`] for special URIs other than activities, version
///   resources and revision roots
pub fn parse_uri(uri: &str, root_path: &str, special_uri: &str) -> Result<UriInfo, DavError> {
    let uri = uri.split_once('#').map_or(uri, |(head, _fragment)| head);

    // plain paths are taken as-is; only absolute URIs go through the strict parser
    let parsed;
    let raw_path = if uri.starts_with('/') {
        uri.split_once('?').map_or(uri, |(path, _query)| path)
    } else {
        parsed = uri.parse::<Uri>().map_err(|_| DavError::malformed_uri("The specified URI could not be parsed"))?;
        parsed.path()
    };
    let path = normalize_path(raw_path);

    let root = if root_path == "/" { "" } else { root_path };
    let Some(rest) = strip_segment_prefix(&path, root) else {
        return Err(DavError::malformed_uri("Unusable URI: it does not refer to this repository"));
    };

    // rest is now empty or starts with '/'
    if rest.len() <= 1 {
        return Ok(UriInfo::public(String::from("/")));
    }

    let Some(special_rest) = strip_segment_prefix(&rest[1..], special_uri) else {
        return Ok(UriInfo::public(decode(rest)?.into_owned()));
    };

    // the root of the special area is not a resource
    ensure!(special_rest.len() > 1, DavError::unsupported_feature("Unsupported URI form"));

    let Some((name, remainder)) = special_rest[1..].split_once('/') else {
        return Err(DavError::unsupported_feature("Unsupported URI form"));
    };
    ensure!(!remainder.is_empty(), DavError::unsupported_feature("Unsupported URI form"));

    match name {
        "act" => Ok(UriInfo::activity(remainder.to_string())),
        "ver" | "rvr" => {
            let (revision, path) = match remainder.split_once('/') {
                Some((revision, path)) => (revision, Some(path)),
                None => (remainder, None),
            };
            let revision = revision
                .parse::<Revnum>()
                .map_err(|_| DavError::malformed_uri("The specified URI could not be parsed"))?;
            let repos_path = match path {
                Some(path) => decode(&format!("/{path}"))?.into_owned(),
                None => String::from("/"),
            };
            Ok(UriInfo::versioned(revision, repos_path))
        }
        _ => Err(DavError::unsupported_feature("Unsupported URI form")),
    }
}

/// Returns true if `uri` names the parent directory of all repositories and listing that
/// directory is enabled.
pub fn is_parent_path_list(uri: &str, config: &DavConfig) -> bool {
    if config.fs_parent_path().is_none() || !config.list_parent_path() {
        return false;
    }
    trim_one_slash(config.root_path()) == trim_one_slash(uri)
}

/// Checks that a client-supplied path is in canonical form.
///
/// Empty paths, canonical URLs, canonical absolute paths and canonical relative paths
/// are accepted.
///
/// # Errors
///
/// Returns a 400 [`ProtocolError`] describing the offending path.
pub fn test_canonical(path: &str) -> Result<(), ProtocolError> {
    if path.is_empty() || is_canonical_url(path) || is_canonical_fspath(path) || is_canonical_relpath(path) {
        return Ok(());
    }

    Err(ProtocolError::new_tagged(
        StatusCode::BAD_REQUEST,
        0,
        format!("Path '{path}' is not canonicalized; there is a problem with the client."),
    ))
}

fn encode_path(path: &str) -> String {
    let mut encoded = String::with_capacity(path.len() + 1);
    for segment in path.trim_start_matches('/').split('/') {
        encoded.push('/');
        encoded.extend(utf8_percent_encode(segment, PATH_SEGMENT));
    }
    encoded
}

fn decode(path: &str) -> Result<Cow<'_, str>, DavError> {
    percent_decode_str(path)
        .decode_utf8()
        .map_err(|_| DavError::malformed_uri("The URI path does not decode to valid UTF-8"))
}

/// Resolves `.` and `..` segments and collapses repeated slashes.
///
/// The result always starts with `/` and keeps a trailing slash when the input had one.
fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            segment => segments.push(segment),
        }
    }

    let mut normalized = String::with_capacity(path.len() + 1);
    for segment in &segments {
        normalized.push('/');
        normalized.push_str(segment);
    }

    let trailing = path.ends_with('/') || path.ends_with("/.") || path.ends_with("/..");
    if normalized.is_empty() || trailing {
        normalized.push('/');
    }
    normalized
}

/// Strips `prefix` from `path` if it ends on a segment boundary.
///
/// `/repos` is a prefix of `/repos` and `/repos/x`, but not of `/repository`.
fn strip_segment_prefix<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = path.strip_prefix(prefix)?;
    if rest.is_empty() || rest.starts_with('/') { Some(rest) } else { None }
}

fn trim_one_slash(path: &str) -> &str {
    path.strip_suffix('/').unwrap_or(path)
}

fn is_canonical_relpath(path: &str) -> bool {
    if path.is_empty() {
        return true;
    }
    !path.starts_with('/') && !path.ends_with('/') && path.split('/').all(|segment| !segment.is_empty() && segment != ".")
}

fn is_canonical_fspath(path: &str) -> bool {
    match path.strip_prefix('/') {
        Some(relpath) => is_canonical_relpath(relpath),
        None => false,
    }
}

fn is_canonical_url(path: &str) -> bool {
    let Some((scheme, rest)) = path.split_once("://") else {
        return false;
    };
    if scheme.is_empty() || !scheme.bytes().all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'-' | b'.')) {
        return false;
    }
    if scheme.bytes().any(|b| b.is_ascii_uppercase()) {
        return false;
    }

    let (host, url_path) = match rest.find('/') {
        Some(index) => rest.split_at(index),
        None => (rest, ""),
    };
    if host.bytes().any(|b| b.is_ascii_uppercase()) {
        return false;
    }
    url_path.is_empty() || is_canonical_fspath(url_path)
}
