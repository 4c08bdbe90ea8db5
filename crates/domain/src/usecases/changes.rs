//! Change detection - which content files a publish run should pick up

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;

use crate::{
    platform::Platform,
    ports::{ChangeSource, ChangeSourceError, ContentSource, PostMapError, PostMapStore},
    usecases::publish::WorkflowConfig,
};

/// Extract the paths named by `git status --porcelain` output.
///
/// Renames and copies contribute both the old and the new path. Paths git quoted
/// because of special characters are unquoted.
pub fn parse_porcelain(output: &str) -> Vec<String> {
    let mut paths = Vec::new();
    let mut push = |candidate: &str| {
        let path = unquote(candidate.trim());
        if !path.is_empty() && !paths.contains(&path) {
            paths.push(path);
        }
    };

    for line in output.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let status = line.get(..2).unwrap_or_default().trim();
        let Some(file_part) = line.get(3..) else {
            continue;
        };

        if status.starts_with('R') || status.starts_with('C') {
            if let Some((from, to)) = file_part.split_once(" -> ") {
                push(from);
                push(to);
                continue;
            }
        }
        push(file_part);
    }

    paths
}

fn unquote(path: &str) -> String {
    let Some(inner) = path
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    else {
        return path.to_string();
    };

    let mut unquoted = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('t') => unquoted.push('\t'),
                Some('n') => unquoted.push('\n'),
                Some(other) => unquoted.push(other),
                None => unquoted.push('\\'),
            }
        } else {
            unquoted.push(c);
        }
    }
    unquoted
}

/// A content directory and the platform its articles go to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentDirectory {
    /// Path prefix relative to the working directory, ending in `/`
    pub prefix: String,
    pub platform: Platform,
}

impl ContentDirectory {
    pub fn new(prefix: impl Into<String>, platform: Platform) -> Self {
        let prefix: String = prefix.into();
        let mut prefix = prefix.trim().trim_start_matches("./").to_string();
        if !prefix.ends_with('/') {
            prefix.push('/');
        }
        Self { prefix, platform }
    }

    pub fn contains(&self, path: &str) -> bool {
        path.starts_with(&self.prefix)
    }

    /// Shell variable name for this directory's file list: `content/en/` → `EN_FILES`
    pub fn variable_name(&self) -> String {
        let label = self
            .prefix
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default();
        let label: String = label
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect();
        format!("{}_FILES", label)
    }
}

/// Where content lives and which platform each directory targets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentLayout {
    pub directories: Vec<ContentDirectory>,
}

impl Default for ContentLayout {
    fn default() -> Self {
        Self {
            directories: vec![
                ContentDirectory::new("content/en/", Platform::Devto),
                ContentDirectory::new("content/ja/", Platform::Qiita),
            ],
        }
    }
}

impl ContentLayout {
    /// Markdown file inside one of the content directories
    pub fn is_content_markdown(&self, path: &str) -> bool {
        path.ends_with(".md") && self.directory_for(path).is_some()
    }

    pub fn directory_for(&self, path: &str) -> Option<&ContentDirectory> {
        self.directories.iter().find(|dir| dir.contains(path))
    }
}

/// A post map entry whose source file no longer exists
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaleEntry {
    pub path: String,
    pub map_file: String,
}

/// Content files a publish run should process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    /// Sorted, unique content markdown paths (stale entries included)
    pub files: Vec<String>,
    pub stale: Vec<StaleEntry>,
}

impl ChangeSet {
    /// Build a change set from changed paths and stale map entries
    pub fn new(
        changed: impl IntoIterator<Item = String>,
        stale: Vec<StaleEntry>,
        layout: &ContentLayout,
    ) -> Self {
        let files: BTreeSet<String> = changed
            .into_iter()
            .chain(stale.iter().map(|entry| entry.path.clone()))
            .filter(|path| layout.is_content_markdown(path))
            .collect();

        Self {
            files: files.into_iter().collect(),
            stale,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Group files by content directory, keeping the layout's directory order
    pub fn split<'a>(&self, layout: &'a ContentLayout) -> Vec<(&'a ContentDirectory, Vec<String>)> {
        layout
            .directories
            .iter()
            .map(|dir| {
                let files = self
                    .files
                    .iter()
                    .filter(|path| layout.directory_for(path) == Some(dir))
                    .cloned()
                    .collect();
                (dir, files)
            })
            .collect()
    }

    /// Files whose content directory targets the given platform
    pub fn for_platform(&self, layout: &ContentLayout, platform: Platform) -> Vec<String> {
        self.files
            .iter()
            .filter(|path| layout.directory_for(path).map(|dir| dir.platform) == Some(platform))
            .cloned()
            .collect()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ChangeError {
    #[error(transparent)]
    Source(#[from] ChangeSourceError),
    #[error("Failed to load post map: {0}")]
    LoadPostMap(#[source] PostMapError),
}

/// Combines working tree changes with stale post map entries
pub struct ChangeDetector<G, C, M>
where
    G: ChangeSource + ?Sized,
    C: ContentSource + ?Sized,
    M: PostMapStore + ?Sized,
{
    changes: Arc<G>,
    content: Arc<C>,
    post_maps: Arc<M>,
    layout: ContentLayout,
    config: WorkflowConfig,
}

impl<G, C, M> ChangeDetector<G, C, M>
where
    G: ChangeSource + ?Sized,
    C: ContentSource + ?Sized,
    M: PostMapStore + ?Sized,
{
    pub fn new(
        changes: Arc<G>,
        content: Arc<C>,
        post_maps: Arc<M>,
        layout: ContentLayout,
        config: WorkflowConfig,
    ) -> Self {
        Self {
            changes,
            content,
            post_maps,
            layout,
            config,
        }
    }

    pub fn layout(&self) -> &ContentLayout {
        &self.layout
    }

    /// Detect changed content, scanning the given post map files for stale entries
    pub async fn detect(&self, map_files: &[String]) -> Result<ChangeSet, ChangeError> {
        let changed = self.changes.changed_paths().await?;
        tracing::debug!(count = changed.len(), "Changed paths reported by working tree");

        let stale = self.find_missing_post_map_entries(map_files).await?;
        for entry in &stale {
            tracing::info!(
                path = %entry.path,
                map_file = %entry.map_file,
                "Mapped file no longer exists and will be cleaned up"
            );
        }

        let change_set = ChangeSet::new(changed, stale, &self.layout);
        tracing::info!(
            files = change_set.files.len(),
            stale = change_set.stale.len(),
            "Change detection complete"
        );
        Ok(change_set)
    }

    /// Content markdown keys of the given maps whose files are gone
    pub async fn find_missing_post_map_entries(
        &self,
        map_files: &[String],
    ) -> Result<Vec<StaleEntry>, ChangeError> {
        let mut stale = Vec::new();
        for map_file in map_files {
            let map = self
                .post_maps
                .load(&self.config.map_path(map_file))
                .await
                .map_err(ChangeError::LoadPostMap)?;

            for path in map.paths() {
                if !self.layout.is_content_markdown(path) {
                    continue;
                }
                if !self.content.exists(&self.config.working_dir.join(path)).await {
                    stale.push(StaleEntry {
                        path: path.to_string(),
                        map_file: map_file.clone(),
                    });
                }
            }
        }
        Ok(stale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ParsedContent, PostMap, PostMapEntry};
    use crate::ports::ContentError;
    use async_trait::async_trait;
    use std::collections::{HashMap, HashSet};
    use std::path::{Path, PathBuf};

    #[test]
    fn test_parse_porcelain_handles_renames_and_untracked() {
        let output = " M content/en/a.md\n?? content/ja/new.md\nR  content/en/old.md -> content/en/renamed.md\n\nD  content/ja/gone.md\n";

        assert_eq!(
            parse_porcelain(output),
            vec![
                "content/en/a.md",
                "content/ja/new.md",
                "content/en/old.md",
                "content/en/renamed.md",
                "content/ja/gone.md",
            ]
        );
    }

    #[test]
    fn test_parse_porcelain_unquotes_paths() {
        let output = "?? \"content/en/with space \\\"q\\\".md\"\n";
        assert_eq!(
            parse_porcelain(output),
            vec!["content/en/with space \"q\".md"]
        );
    }

    #[test]
    fn test_layout_recognizes_content_markdown() {
        let layout = ContentLayout::default();
        assert!(layout.is_content_markdown("content/en/a.md"));
        assert!(layout.is_content_markdown("content/ja/sub/b.md"));
        assert!(!layout.is_content_markdown("content/en/image.png"));
        assert!(!layout.is_content_markdown("README.md"));
        assert!(!layout.is_content_markdown("content/fr/c.md"));
    }

    #[test]
    fn test_variable_name() {
        assert_eq!(
            ContentDirectory::new("content/en", Platform::Devto).variable_name(),
            "EN_FILES"
        );
        assert_eq!(
            ContentDirectory::new("./posts/zh-tw/", Platform::Qiita).variable_name(),
            "ZH_TW_FILES"
        );
    }

    #[test]
    fn test_change_set_split_is_sorted_per_directory() {
        let layout = ContentLayout::default();
        let change_set = ChangeSet::new(
            vec![
                "content/ja/z.md".to_string(),
                "content/en/b.md".to_string(),
                "scripts/build.ts".to_string(),
                "content/en/a.md".to_string(),
                "content/en/a.md".to_string(),
            ],
            vec![],
            &layout,
        );

        let split = change_set.split(&layout);
        assert_eq!(split.len(), 2);
        assert_eq!(split[0].0.prefix, "content/en/");
        assert_eq!(split[0].1, vec!["content/en/a.md", "content/en/b.md"]);
        assert_eq!(split[1].1, vec!["content/ja/z.md"]);
        assert_eq!(
            change_set.for_platform(&layout, Platform::Qiita),
            vec!["content/ja/z.md"]
        );
    }

    struct FakeChanges(String);

    #[async_trait]
    impl ChangeSource for FakeChanges {
        async fn changed_paths(&self) -> Result<Vec<String>, ChangeSourceError> {
            Ok(parse_porcelain(&self.0))
        }
    }

    struct FakeContent(HashSet<PathBuf>);

    #[async_trait]
    impl ContentSource for FakeContent {
        async fn exists(&self, path: &Path) -> bool {
            self.0.contains(path)
        }

        async fn read(&self, _path: &Path) -> Result<ParsedContent, ContentError> {
            Err(ContentError::MissingTitle)
        }
    }

    struct FakeStore(HashMap<PathBuf, PostMap>);

    #[async_trait]
    impl PostMapStore for FakeStore {
        async fn load(&self, path: &Path) -> Result<PostMap, PostMapError> {
            Ok(self.0.get(path).cloned().unwrap_or_default())
        }

        async fn save(&self, _path: &Path, _map: &PostMap) -> Result<(), PostMapError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_detect_adds_stale_map_entries() {
        let devto_map: PostMap = [
            ("content/en/kept.md".to_string(), PostMapEntry::new(1)),
            ("content/en/deleted.md".to_string(), PostMapEntry::new(2)),
            ("notes/outside.md".to_string(), PostMapEntry::new(3)),
        ]
        .into_iter()
        .collect();
        let store = FakeStore(HashMap::from([(
            PathBuf::from("/w/.posts-map.devto.json"),
            devto_map,
        )]));
        let content = FakeContent(HashSet::from([
            PathBuf::from("/w/content/en/kept.md"),
            PathBuf::from("/w/content/ja/new.md"),
        ]));
        let detector = ChangeDetector::new(
            Arc::new(FakeChanges("?? content/ja/new.md\n".to_string())),
            Arc::new(content),
            Arc::new(store),
            ContentLayout::default(),
            WorkflowConfig {
                working_dir: PathBuf::from("/w"),
            },
        );

        let change_set = detector
            .detect(&[
                ".posts-map.devto.json".to_string(),
                ".posts-map.qiita.json".to_string(),
            ])
            .await
            .unwrap();

        assert_eq!(
            change_set.files,
            vec!["content/en/deleted.md", "content/ja/new.md"]
        );
        assert_eq!(
            change_set.stale,
            vec![StaleEntry {
                path: "content/en/deleted.md".to_string(),
                map_file: ".posts-map.devto.json".to_string(),
            }]
        );
    }
}
