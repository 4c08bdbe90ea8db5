//! Port definitions (traits) for external dependencies
//!
//! These traits define the boundaries between the domain and external systems.
//! Adapters implement these traits to connect to real infrastructure.

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;
use time::OffsetDateTime;

use crate::model::{
    ContentFrontMatter, ParsedContent, PostMap, PostMapEntry, PublishMode, RemoteArticle, RemoteId,
};
use crate::platform::Platform;

/// Error type for content reading
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("front matter block is not terminated by ---")]
    UnterminatedFrontMatter,
    #[error("invalid front matter: {0}")]
    InvalidFrontMatter(String),
    #[error("missing required front matter field: title")]
    MissingTitle,
}

/// Port for reading content files
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Whether a content file exists at the given path
    async fn exists(&self, path: &Path) -> bool;

    /// Read and split a content file into front matter and body
    async fn read(&self, path: &Path) -> Result<ParsedContent, ContentError>;
}

/// Error type for post map persistence
#[derive(Debug, Error)]
pub enum PostMapError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed post map {path}: {message}")]
    Parse { path: String, message: String },
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Port for loading and persisting post maps
#[async_trait]
pub trait PostMapStore: Send + Sync {
    /// Load a post map; a missing file yields an empty map
    async fn load(&self, path: &Path) -> Result<PostMap, PostMapError>;

    /// Overwrite the post map file with the given map
    async fn save(&self, path: &Path, map: &PostMap) -> Result<(), PostMapError>;
}

/// Error type for remote API calls
#[derive(Debug, Clone, Error)]
pub enum RemoteError {
    #[error("{message}")]
    Http { status: u16, message: String },
    #[error("Network error: {0}")]
    Transport(String),
    #[error("Invalid response: {0}")]
    Decode(String),
}

impl RemoteError {
    /// HTTP status code, when the remote answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            RemoteError::Http { status, .. } => Some(*status),
            RemoteError::Transport(_) | RemoteError::Decode(_) => None,
        }
    }

    /// The remote resource is gone (deleted outside crosspost)
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// Severity of a validation rejection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RejectionLevel {
    #[default]
    Warn,
    Error,
}

/// A platform-specific validation failure
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Rejection {
    pub message: Option<String>,
    pub level: RejectionLevel,
    /// Whether the rejection counts towards the process failure flag
    pub set_exit_code: bool,
}

impl Rejection {
    /// An error-level rejection that fails the run
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            level: RejectionLevel::Error,
            set_exit_code: true,
        }
    }

    /// A warn-level rejection that only skips the file
    pub fn warn(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            level: RejectionLevel::Warn,
            set_exit_code: false,
        }
    }
}

/// Result of `PlatformAdapter::validate_front_matter`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation<S> {
    /// Accepted, with data the later steps reuse
    Valid(S),
    Rejected(Rejection),
}

/// Input to front matter validation
#[derive(Debug, Clone, Copy)]
pub struct ValidateContext<'a> {
    pub front_matter: &'a ContentFrontMatter,
    pub relative_path: &'a str,
    pub existing_entry: Option<&'a PostMapEntry>,
    pub mode: PublishMode,
}

/// Input to payload construction
#[derive(Debug)]
pub struct PayloadContext<'a, S> {
    pub front_matter: &'a ContentFrontMatter,
    pub body: &'a str,
    pub mode: PublishMode,
    pub existing_entry: Option<&'a PostMapEntry>,
    pub sanitized: &'a S,
}

/// Input to the remote upsert call
#[derive(Debug)]
pub struct RequestContext<'a, P, S> {
    pub payload: &'a P,
    /// Present: update this remote id. Absent: create.
    pub existing_entry: Option<&'a PostMapEntry>,
    pub mode: PublishMode,
    pub sanitized: &'a S,
}

/// Input to post map reconciliation
#[derive(Debug)]
pub struct SyncContext<'a, R, S> {
    pub front_matter: &'a ContentFrontMatter,
    pub existing_entry: Option<&'a PostMapEntry>,
    pub mode: PublishMode,
    pub response: R,
    pub relative_path: &'a str,
    pub sanitized: &'a S,
}

/// New map entry plus the status line to log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncResult {
    pub entry: PostMapEntry,
    pub message: String,
}

/// Port for platform-specific publishing behavior.
///
/// The workflow engine owns the shared policy; adapters only shape data for their
/// platform. Everything except `perform_request` must be free of I/O.
#[async_trait]
pub trait PlatformAdapter: Send + Sync {
    /// Request body sent to the platform
    type Payload: Send + Sync;
    /// Decoded response of the upsert call
    type Response: Send;
    /// Data produced by validation and reused by later steps
    type Sanitized: Send + Sync;

    fn platform(&self) -> Platform;

    /// Post map filename, relative to the working directory
    fn map_filename(&self) -> &str {
        self.platform().default_map_filename()
    }

    /// Whether the file's platform selector targets this platform
    fn is_platform_enabled(&self, front_matter: &ContentFrontMatter) -> bool {
        front_matter.platform.wants(self.platform())
    }

    fn validate_front_matter(&self, ctx: ValidateContext<'_>) -> Validation<Self::Sanitized>;

    fn prepare_payload(&self, ctx: PayloadContext<'_, Self::Sanitized>) -> Self::Payload;

    /// Create or update the remote article
    async fn perform_request(
        &self,
        ctx: RequestContext<'_, Self::Payload, Self::Sanitized>,
    ) -> Result<Self::Response, RemoteError>;

    fn synchronize_post_map_entry(
        &self,
        ctx: SyncContext<'_, Self::Response, Self::Sanitized>,
    ) -> SyncResult;
}

/// Port for fetching remote articles during verification
#[async_trait]
pub trait RemoteArticleSource: Send + Sync {
    fn platform(&self) -> Platform;

    /// Post map filename, relative to the working directory
    fn map_filename(&self) -> &str {
        self.platform().default_map_filename()
    }

    async fn fetch_article(&self, id: &RemoteId) -> Result<RemoteArticle, RemoteError>;
}

/// Error type for change detection
#[derive(Debug, Error)]
pub enum ChangeSourceError {
    #[error("Failed to run {command}: {message}")]
    Command { command: String, message: String },
}

/// Port for listing locally changed files
#[async_trait]
pub trait ChangeSource: Send + Sync {
    /// Paths (relative to the working directory) with uncommitted changes
    async fn changed_paths(&self) -> Result<Vec<String>, ChangeSourceError>;
}

/// Port for time/clock operations (enables deterministic testing)
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> OffsetDateTime;
}

/// Real clock implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}
