//! Domain models and value objects

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::platform::{Platform, PlatformSelector};

/// Publishing intent for a batch run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PublishMode {
    /// Create or update a private draft
    #[default]
    Draft,
    /// Make an already drafted article public
    Publish,
}

impl PublishMode {
    pub fn should_publish(self) -> bool {
        matches!(self, PublishMode::Publish)
    }

    /// Verb used in log lines ("Failed to draft ...")
    pub fn verb(self) -> &'static str {
        match self {
            PublishMode::Draft => "draft",
            PublishMode::Publish => "publish",
        }
    }

    /// Noun for the remote resource this mode produces
    pub fn noun(self) -> &'static str {
        match self {
            PublishMode::Draft => "draft",
            PublishMode::Publish => "article",
        }
    }
}

impl fmt::Display for PublishMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

/// Front matter of a content file, normalized by the content reader
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentFrontMatter {
    /// Article title (required, trimmed)
    pub title: String,
    /// Tags in declaration order; `None` when absent or empty
    pub tags: Option<Vec<String>>,
    /// Platforms this file targets
    pub platform: PlatformSelector,
    pub canonical_url: Option<String>,
    pub cover_image: Option<String>,
    pub series: Option<String>,
    /// dev.to organization to publish under
    pub organization_id: Option<u64>,
    /// Qiita organization (group url name)
    pub qiita_org: Option<String>,
}

impl ContentFrontMatter {
    pub fn tag_count(&self) -> usize {
        self.tags.as_ref().map_or(0, Vec::len)
    }
}

/// A content file split into front matter and body
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedContent {
    pub front_matter: ContentFrontMatter,
    /// Body with `\n` line endings and surrounding whitespace trimmed
    pub body: String,
}

/// Normalize article text the same way for local files and remote bodies
pub fn normalize_body(raw: &str) -> String {
    raw.replace("\r\n", "\n").trim().to_string()
}

/// Remote article identifier: numeric on dev.to, string on Qiita
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RemoteId {
    Numeric(u64),
    Text(String),
}

impl fmt::Display for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteId::Numeric(id) => write!(f, "{}", id),
            RemoteId::Text(id) => f.write_str(id),
        }
    }
}

impl From<u64> for RemoteId {
    fn from(id: u64) -> Self {
        RemoteId::Numeric(id)
    }
}

impl From<String> for RemoteId {
    fn from(id: String) -> Self {
        RemoteId::Text(id)
    }
}

impl From<&str> for RemoteId {
    fn from(id: &str) -> Self {
        RemoteId::Text(id.to_string())
    }
}

/// Remote identity and state of one local file on one platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostMapEntry {
    pub id: RemoteId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
}

impl PostMapEntry {
    pub fn new(id: impl Into<RemoteId>) -> Self {
        Self {
            id: id.into(),
            url: None,
            updated_at: None,
            published_at: None,
            published: None,
        }
    }

    pub fn is_published(&self) -> bool {
        self.published == Some(true)
    }
}

/// Mapping from working-directory-relative file path to remote entry.
///
/// Keys keep insertion order so the persisted JSON diffs cleanly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostMap {
    entries: IndexMap<String, PostMapEntry>,
}

impl PostMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<&PostMapEntry> {
        self.entries.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// Insert or replace an entry; an existing key keeps its position
    pub fn insert(&mut self, path: impl Into<String>, entry: PostMapEntry) -> Option<PostMapEntry> {
        self.entries.insert(path.into(), entry)
    }

    pub fn remove(&mut self, path: &str) -> Option<PostMapEntry> {
        self.entries.shift_remove(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PostMapEntry)> {
        self.entries.iter().map(|(path, entry)| (path.as_str(), entry))
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl FromIterator<(String, PostMapEntry)> for PostMap {
    fn from_iter<T: IntoIterator<Item = (String, PostMapEntry)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Format a timestamp the way the remote APIs do (RFC 3339)
pub fn format_timestamp(at: OffsetDateTime) -> String {
    at.format(&Rfc3339).unwrap_or_else(|_| at.unix_timestamp().to_string())
}

/// Why a file was skipped without touching the remote platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NotFound,
    ParseError(String),
    MissingTitle,
    PlatformExcluded,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NotFound => f.write_str("file not found"),
            SkipReason::ParseError(message) => f.write_str(message),
            SkipReason::MissingTitle => f.write_str("missing required front matter field: title"),
            SkipReason::PlatformExcluded => f.write_str("platform selector excludes this platform"),
        }
    }
}

/// Why a file was refused before any remote call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// Publish mode without an existing draft entry
    PublishWithoutDraft,
    /// Draft mode against an entry that is already public
    RedraftPublished,
    /// Platform-specific front matter rules failed
    Validation {
        message: String,
        set_exit_code: bool,
    },
}

impl RejectReason {
    pub fn sets_exit_code(&self) -> bool {
        match self {
            RejectReason::PublishWithoutDraft | RejectReason::RedraftPublished => true,
            RejectReason::Validation { set_exit_code, .. } => *set_exit_code,
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::PublishWithoutDraft => {
                f.write_str("Cannot publish without creating a draft first. Run a draft first.")
            }
            RejectReason::RedraftPublished => f.write_str(
                "Cannot create/update draft for already published article. This would overwrite the published version.",
            ),
            RejectReason::Validation { message, .. } => f.write_str(message),
        }
    }
}

/// Terminal state of one file in a workflow run
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    /// Skipped locally; `cleaned` is set when a stale map entry was removed
    Skipped { reason: SkipReason, cleaned: bool },
    /// Refused by shared policy or adapter validation
    Rejected { reason: RejectReason },
    /// Remote upsert succeeded and the map entry was stored
    Reconciled {
        created: bool,
        entry: PostMapEntry,
        message: String,
    },
    /// Remote call failed; `cleaned` is set when a 404 purged the entry
    Failed {
        status: Option<u16>,
        message: String,
        cleaned: bool,
    },
}

impl FileOutcome {
    /// Whether this outcome sets the process failure flag
    pub fn is_failure(&self) -> bool {
        match self {
            FileOutcome::Skipped { .. } | FileOutcome::Reconciled { .. } => false,
            FileOutcome::Rejected { reason } => reason.sets_exit_code(),
            FileOutcome::Failed { .. } => true,
        }
    }
}

/// Outcome of one input file
#[derive(Debug, Clone, PartialEq)]
pub struct FileReport {
    /// Post map key of the file
    pub path: String,
    pub outcome: FileOutcome,
}

/// Result of one batch run against one platform
#[derive(Debug, Clone)]
pub struct WorkflowReport {
    pub platform: Platform,
    pub mode: PublishMode,
    /// One report per input file, in input order
    pub files: Vec<FileReport>,
}

impl WorkflowReport {
    pub fn new(platform: Platform, mode: PublishMode) -> Self {
        Self {
            platform,
            mode,
            files: Vec::new(),
        }
    }

    /// Process failure flag: any file hit a validation, invariant, or remote error
    pub fn failed(&self) -> bool {
        self.files.iter().any(|file| file.outcome.is_failure())
    }

    pub fn outcome(&self, path: &str) -> Option<&FileOutcome> {
        self.files
            .iter()
            .find(|file| file.path == path)
            .map(|file| &file.outcome)
    }

    pub fn reconciled_count(&self) -> usize {
        self.files
            .iter()
            .filter(|file| matches!(file.outcome, FileOutcome::Reconciled { .. }))
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.files
            .iter()
            .filter(|file| matches!(file.outcome, FileOutcome::Skipped { .. }))
            .count()
    }
}

/// A remote article as fetched for verification
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteArticle {
    pub title: String,
    /// Raw remote markdown; normalized before comparison
    pub body: String,
    pub published: bool,
    pub url: Option<String>,
    pub updated_at: Option<String>,
    pub published_at: Option<String>,
}

/// One mismatch between local state and a remote article
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationIssue {
    pub platform: Platform,
    pub file: String,
    pub message: String,
}
