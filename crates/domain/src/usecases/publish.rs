//! Publishing workflow - drives one batch of content files against one platform

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::{
    model::{FileOutcome, FileReport, PostMap, PublishMode, RejectReason, SkipReason, WorkflowReport},
    normalize_path, path_key, relative_path,
    ports::{
        ContentError, ContentSource, PayloadContext, PlatformAdapter, PostMapError, PostMapStore,
        RejectionLevel, RequestContext, SyncContext, SyncResult, ValidateContext, Validation,
    },
};

/// Configuration shared by the workflow and the verifier
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    /// Directory that post map keys and map filenames are relative to
    pub working_dir: PathBuf,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            working_dir: PathBuf::from("."),
        }
    }
}

impl WorkflowConfig {
    /// Resolve a file argument to its absolute path and post map key
    pub fn resolve(&self, file_arg: &Path) -> (PathBuf, String) {
        let base = normalize_path(&self.working_dir);
        let absolute = normalize_path(&self.working_dir.join(file_arg));
        let key = match relative_path(&absolute, &base) {
            Some(relative) => path_key(&relative),
            None => path_key(&absolute),
        };
        (absolute, key)
    }

    /// Absolute location of a post map file
    pub fn map_path(&self, map_filename: &str) -> PathBuf {
        self.working_dir.join(map_filename)
    }
}

/// Fatal workflow errors; per-file problems never surface here
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("Failed to load post map: {0}")]
    LoadPostMap(#[source] PostMapError),
    #[error("Failed to save post map: {0}")]
    SavePostMap(#[source] PostMapError),
}

/// Publishing workflow engine
pub struct PublishWorkflow<C, M>
where
    C: ContentSource + ?Sized,
    M: PostMapStore + ?Sized,
{
    content: Arc<C>,
    post_maps: Arc<M>,
    config: WorkflowConfig,
}

impl<C, M> PublishWorkflow<C, M>
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

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Run one batch: files are processed strictly in order and the post map is
    /// written back exactly once, whatever happened to the individual files.
    pub async fn run<A>(
        &self,
        file_args: &[PathBuf],
        mode: PublishMode,
        adapter: &A,
    ) -> Result<WorkflowReport, WorkflowError>
    where
        A: PlatformAdapter + ?Sized,
    {
        let platform = adapter.platform();
        let mut report = WorkflowReport::new(platform, mode);

        if file_args.is_empty() {
            tracing::info!(platform = %platform, "No content files provided, nothing to do");
            return Ok(report);
        }

        let map_path = self.config.map_path(adapter.map_filename());
        tracing::info!(
            platform = %platform,
            mode = %mode,
            post_map = %map_path.display(),
            files = file_args.len(),
            "Starting publishing workflow"
        );

        let mut post_map = self
            .post_maps
            .load(&map_path)
            .await
            .map_err(WorkflowError::LoadPostMap)?;

        for file_arg in file_args {
            let (absolute_path, relative_path) = self.config.resolve(file_arg);
            let outcome = self
                .process_file(
                    file_arg,
                    &absolute_path,
                    &relative_path,
                    mode,
                    adapter,
                    &mut post_map,
                )
                .await;
            report.files.push(FileReport {
                path: relative_path,
                outcome,
            });
        }

        self.post_maps
            .save(&map_path, &post_map)
            .await
            .map_err(WorkflowError::SavePostMap)?;

        tracing::info!(
            platform = %platform,
            mode = %mode,
            reconciled = report.reconciled_count(),
            skipped = report.skipped_count(),
            failed = report.failed(),
            "Publishing workflow complete"
        );

        Ok(report)
    }

    /// Process a single file; every error ends here as an outcome
    async fn process_file<A>(
        &self,
        file_arg: &Path,
        absolute_path: &Path,
        relative_path: &str,
        mode: PublishMode,
        adapter: &A,
        post_map: &mut PostMap,
    ) -> FileOutcome
    where
        A: PlatformAdapter + ?Sized,
    {
        let platform = adapter.platform();

        if !self.content.exists(absolute_path).await {
            let cleaned = post_map.remove(relative_path).is_some();
            if cleaned {
                tracing::info!(
                    path = %relative_path,
                    platform = %platform,
                    "Cleanup: removed stale mapping (file not found)"
                );
            }
            tracing::warn!(file = %file_arg.display(), "Skipped: file not found");
            return FileOutcome::Skipped {
                reason: SkipReason::NotFound,
                cleaned,
            };
        }

        let parsed = match self.content.read(absolute_path).await {
            Ok(parsed) => parsed,
            Err(ContentError::MissingTitle) => return skip_missing_title(relative_path),
            Err(error) => {
                tracing::warn!(path = %relative_path, error = %error, "Skipped: unreadable content file");
                return FileOutcome::Skipped {
                    reason: SkipReason::ParseError(error.to_string()),
                    cleaned: false,
                };
            }
        };
        let front_matter = &parsed.front_matter;

        if front_matter.title.trim().is_empty() {
            return skip_missing_title(relative_path);
        }

        if !adapter.is_platform_enabled(front_matter) {
            let cleaned = post_map.remove(relative_path).is_some();
            if cleaned {
                tracing::info!(
                    path = %relative_path,
                    platform = %platform,
                    "Cleanup: removed stale mapping (platform excluded)"
                );
            }
            tracing::info!(
                path = %relative_path,
                platform = %platform,
                "Skipped: platform selector excludes this platform"
            );
            return FileOutcome::Skipped {
                reason: SkipReason::PlatformExcluded,
                cleaned,
            };
        }

        let existing_entry = post_map.get(relative_path).cloned();

        let gate = match (mode, existing_entry.as_ref()) {
            (PublishMode::Publish, None) => Some(RejectReason::PublishWithoutDraft),
            (PublishMode::Draft, Some(entry)) if entry.is_published() => {
                Some(RejectReason::RedraftPublished)
            }
            _ => None,
        };
        if let Some(reason) = gate {
            tracing::error!(path = %relative_path, platform = %platform, "Error: {}", reason);
            return FileOutcome::Rejected { reason };
        }

        let validation = adapter.validate_front_matter(ValidateContext {
            front_matter,
            relative_path,
            existing_entry: existing_entry.as_ref(),
            mode,
        });
        let sanitized = match validation {
            Validation::Valid(sanitized) => sanitized,
            Validation::Rejected(rejection) => {
                let message = rejection
                    .message
                    .unwrap_or_else(|| format!("Validation failed for {}.", relative_path));
                match rejection.level {
                    RejectionLevel::Error => {
                        tracing::error!(path = %relative_path, platform = %platform, "{}", message)
                    }
                    RejectionLevel::Warn => {
                        tracing::warn!(path = %relative_path, platform = %platform, "{}", message)
                    }
                }
                return FileOutcome::Rejected {
                    reason: RejectReason::Validation {
                        message,
                        set_exit_code: rejection.set_exit_code,
                    },
                };
            }
        };

        let payload = adapter.prepare_payload(PayloadContext {
            front_matter,
            body: &parsed.body,
            mode,
            existing_entry: existing_entry.as_ref(),
            sanitized: &sanitized,
        });

        let result = adapter
            .perform_request(RequestContext {
                payload: &payload,
                existing_entry: existing_entry.as_ref(),
                mode,
                sanitized: &sanitized,
            })
            .await;

        match result {
            Ok(response) => {
                let SyncResult { entry, message } =
                    adapter.synchronize_post_map_entry(SyncContext {
                        front_matter,
                        existing_entry: existing_entry.as_ref(),
                        mode,
                        response,
                        relative_path,
                        sanitized: &sanitized,
                    });
                post_map.insert(relative_path, entry.clone());
                tracing::info!(path = %relative_path, id = %entry.id, "{}", message);
                FileOutcome::Reconciled {
                    created: existing_entry.is_none(),
                    entry,
                    message,
                }
            }
            Err(error) => {
                let cleaned = error.is_not_found() && existing_entry.is_some();
                if cleaned {
                    post_map.remove(relative_path);
                    tracing::warn!(
                        path = %relative_path,
                        platform = %platform,
                        "Remote {} {} is missing (404). Removed the mapping so it will be recreated on the next run.",
                        platform,
                        mode.noun()
                    );
                }
                let status_info = error
                    .status()
                    .map(|status| format!(" [HTTP {}]", status))
                    .unwrap_or_default();
                tracing::error!(
                    path = %relative_path,
                    platform = %platform,
                    status = ?error.status(),
                    "Failed to {} {}{}: {}",
                    mode.verb(),
                    relative_path,
                    status_info,
                    error
                );
                FileOutcome::Failed {
                    status: error.status(),
                    message: error.to_string(),
                    cleaned,
                }
            }
        }
    }
}

fn skip_missing_title(relative_path: &str) -> FileOutcome {
    tracing::warn!(
        path = %relative_path,
        "Skipped: missing required front matter field: title"
    );
    FileOutcome::Skipped {
        reason: SkipReason::MissingTitle,
        cleaned: false,
    }
}
