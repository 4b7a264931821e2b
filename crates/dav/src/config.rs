//! Per-repository settings of the adapter.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Default reserved segment that introduces protocol-internal URIs.
pub const DEFAULT_SPECIAL_URI: &str = "!svn";

/// Default maximum size of a request body that is read into memory.
pub const DEFAULT_LIMIT_XML_BODY: u64 = 1_000_000;

/// Default capacity of the response output buffer.
pub const DEFAULT_OUTPUT_BUFFER_SIZE: usize = 8 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DavConfig {
    root_path: String,
    special_uri: String,
    limit_xml_body: u64,
    fs_parent_path: Option<PathBuf>,
    list_parent_path: bool,
    output_buffer_size: usize,
}

impl DavConfig {
    pub fn builder() -> DavConfigBuilder {
        DavConfigBuilder::new()
    }

    /// The URI path the repository is mounted at, without a trailing slash unless it is `/`.
    pub fn root_path(&self) -> &str {
        &self.root_path
    }

    pub fn special_uri(&self) -> &str {
        &self.special_uri
    }

    /// Request body limit in bytes; `None` means unlimited.
    pub fn limit_xml_body(&self) -> Option<u64> {
        if self.limit_xml_body == 0 { None } else { Some(self.limit_xml_body) }
    }

    pub fn fs_parent_path(&self) -> Option<&Path> {
        self.fs_parent_path.as_deref()
    }

    pub fn list_parent_path(&self) -> bool {
        self.list_parent_path
    }

    pub fn output_buffer_size(&self) -> usize {
        self.output_buffer_size
    }
}

impl Default for DavConfig {
    fn default() -> Self {
        Self {
            root_path: String::from("/"),
            special_uri: String::from(DEFAULT_SPECIAL_URI),
            limit_xml_body: DEFAULT_LIMIT_XML_BODY,
            fs_parent_path: None,
            list_parent_path: false,
            output_buffer_size: DEFAULT_OUTPUT_BUFFER_SIZE,
        }
    }
}

#[derive(Debug, Default)]
pub struct DavConfigBuilder {
    config: DavConfig,
}

impl DavConfigBuilder {
    fn new() -> Self {
        Self { config: DavConfig::default() }
    }

    pub fn root_path<S: Into<String>>(mut self, root_path: S) -> Self {
        self.config.root_path = root_path.into();
        self
    }

    pub fn special_uri<S: Into<String>>(mut self, special_uri: S) -> Self {
        self.config.special_uri = special_uri.into();
        self
    }

    /// Sets the request body limit; zero disables it.
    pub fn limit_xml_body(mut self, limit: u64) -> Self {
        self.config.limit_xml_body = limit;
        self
    }

    pub fn fs_parent_path<P: Into<PathBuf>>(mut self, fs_parent_path: P) -> Self {
        self.config.fs_parent_path = Some(fs_parent_path.into());
        self
    }

    pub fn list_parent_path(mut self, list_parent_path: bool) -> Self {
        self.config.list_parent_path = list_parent_path;
        self
    }

    pub fn output_buffer_size(mut self, output_buffer_size: usize) -> Self {
        self.config.output_buffer_size = output_buffer_size;
        self
    }

    pub fn build(self) -> Result<DavConfig, ConfigError> {
        let mut config = self.config;

        if !config.root_path.starts_with('/') {
            return Err(ConfigError::InvalidRootPath { root_path: config.root_path });
        }
        while config.root_path.len() > 1 && config.root_path.ends_with('/') {
            config.root_path.pop();
        }

        if config.special_uri.is_empty() || config.special_uri.contains('/') {
            return Err(ConfigError::InvalidSpecialUri { special_uri: config.special_uri });
        }

        if config.output_buffer_size == 0 {
            return Err(ConfigError::InvalidBufferSize);
        }

        Ok(config)
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("root path must start with '/', got {root_path:?}")]
    InvalidRootPath { root_path: String },
    #[error("special uri must be a single non-empty segment, got {special_uri:?}")]
    InvalidSpecialUri { special_uri: String },
    #[error("output buffer size must be positive")]
    InvalidBufferSize,
}
