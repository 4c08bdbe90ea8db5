//! Remote verification - checks mapped remote articles against local content

use std::sync::Arc;

use crate::{
    model::{normalize_body, ParsedContent, PostMapEntry, RemoteArticle, VerificationIssue},
    platform::Platform,
    ports::{ContentSource, PostMapError, PostMapStore, RemoteArticleSource},
    usecases::publish::WorkflowConfig,
};

#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("Failed to load post map: {0}")]
    LoadPostMap(#[source] PostMapError),
}

/// Read-only consistency check of one platform's post map
pub struct RemoteVerifier<C, M>
where
    C: ContentSource + ?Sized,
    M: PostMapStore + ?Sized,
{
    content: Arc<C>,
    post_maps: Arc<M>,
    config: WorkflowConfig,
}

impl<C, M> RemoteVerifier<C, M>
where
    C: ContentSource + ?Sized,
    M: PostMapStore + ?Sized,
{
    pub fn new(content: Arc<C>, post_maps: Arc<M>, config: WorkflowConfig) -> Self {
        Self {
            content,
            post_maps,
            config,
        }
    }

    /// Verify every entry of the source's post map, in map order.
    ///
    /// Per-entry problems become issues; only an unreadable map is an error.
    pub async fn verify<S>(&self, source: &S) -> Result<Vec<VerificationIssue>, VerifyError>
    where
        S: RemoteArticleSource + ?Sized,
    {
        let platform = source.platform();
        let map_path = self.config.map_path(source.map_filename());
        let post_map = self
            .post_maps
            .load(&map_path)
            .await
            .map_err(VerifyError::LoadPostMap)?;

        tracing::info!(
            platform = %platform,
            post_map = %map_path.display(),
            entries = post_map.len(),
            "Verifying remote articles"
        );

        let mut issues = Vec::new();
        for (relative_path, entry) in post_map.iter() {
            let found = self.verify_entry(source, relative_path, entry).await;
            if found.is_empty() {
                tracing::debug!(path = %relative_path, platform = %platform, "In sync");
            }
            for issue in &found {
                tracing::warn!(path = %issue.file, platform = %platform, "{}", issue.message);
            }
            issues.extend(found);
        }

        Ok(issues)
    }

    async fn verify_entry<S>(
        &self,
        source: &S,
        relative_path: &str,
        entry: &PostMapEntry,
    ) -> Vec<VerificationIssue>
    where
        S: RemoteArticleSource + ?Sized,
    {
        let platform = source.platform();
        let issue = |message: String| {
            vec![VerificationIssue {
                platform,
                file: relative_path.to_string(),
                message,
            }]
        };

        let absolute_path = self.config.working_dir.join(relative_path);
        if !self.content.exists(&absolute_path).await {
            return issue(format!(
                "Local file {} referenced in map is missing.",
                relative_path
            ));
        }

        let local = match self.content.read(&absolute_path).await {
            Ok(local) => local,
            Err(error) => return issue(format!("Failed to read {}: {}", relative_path, error)),
        };

        let remote = match source.fetch_article(&entry.id).await {
            Ok(remote) => remote,
            Err(error) => {
                let status = error
                    .status()
                    .map(|status| format!(" ({})", status))
                    .unwrap_or_default();
                return issue(format!(
                    "Failed to fetch {} article {}{}: {}",
                    platform, entry.id, status, error
                ));
            }
        };

        compare(platform, relative_path, &local, entry, &remote)
    }
}

/// Compare local content and the stored entry with the fetched remote article
pub fn compare(
    platform: Platform,
    relative_path: &str,
    local: &ParsedContent,
    entry: &PostMapEntry,
    remote: &RemoteArticle,
) -> Vec<VerificationIssue> {
    let mut messages = Vec::new();

    if normalize_body(&remote.body) != local.body {
        messages.push(format!(
            "Local markdown content does not match remote {} article. Run the publish script to sync it.",
            platform
        ));
    }

    if remote.title.trim() != local.front_matter.title.trim() {
        messages.push(format!(
            "Local title does not match remote {} article title.",
            platform
        ));
    }

    if entry.published.is_some_and(|stored| stored != remote.published) {
        messages.push(format!(
            "Stored published flag for {} entry is out of sync with remote state.",
            platform
        ));
    }

    if differs(&entry.published_at, &remote.published_at) {
        messages.push(format!(
            "Stored {} publishedAt differs from remote published timestamp.",
            platform
        ));
    }

    if differs(&entry.url, &remote.url) {
        messages.push(format!("Stored {} URL differs from remote URL.", platform));
    }

    if differs(&entry.updated_at, &remote.updated_at) {
        messages.push(format!(
            "Stored {} updatedAt differs from remote updated_at timestamp.",
            platform
        ));
    }

    messages
        .into_iter()
        .map(|message| VerificationIssue {
            platform,
            file: relative_path.to_string(),
            message,
        })
        .collect()
}

/// Both sides present, non-empty and different
fn differs(stored: &Option<String>, remote: &Option<String>) -> bool {
    match (stored.as_deref(), remote.as_deref()) {
        (Some(stored), Some(remote)) if !stored.is_empty() && !remote.is_empty() => {
            stored != remote
        }
        _ => false,
    }
}
