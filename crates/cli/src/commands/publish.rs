//! Publish command - run the publishing workflow for one platform

use anyhow::{Result, bail};
use crosspost_adapters::{
    changes::GitStatusSource, content::FsContentSource, post_map::JsonPostMapStore,
};
use crosspost_domain::{
    FileOutcome, Platform, PublishMode, WorkflowReport,
    usecases::{ChangeDetector, PublishWorkflow, WorkflowConfig},
};
use std::path::PathBuf;
use std::sync::Arc;

use crate::args::PublishArgs;
use crate::commands::{Context, all_map_files, build_devto, build_qiita};
use crate::config::AppConfig;

pub async fn execute(args: PublishArgs, ctx: Context) -> Result<()> {
    let config = ctx.load_config()?;
    let platform: Platform = args.platform.into();
    let mode: PublishMode = args.mode.into();

    let files = if args.files.is_empty() && args.changed {
        changed_files(&config, &ctx, platform).await?
    } else {
        if args.changed {
            tracing::warn!("--changed is ignored when files are given");
        }
        args.files
    };

    tracing::info!(
        platform = %platform,
        mode = %mode,
        files = files.len(),
        working_dir = %ctx.working_dir.display(),
        "Starting crosspost publish"
    );

    let workflow = PublishWorkflow::new(
        Arc::new(FsContentSource::new()),
        Arc::new(JsonPostMapStore::new()),
        WorkflowConfig {
            working_dir: ctx.working_dir.clone(),
        },
    );

    let report = match platform {
        Platform::Devto => {
            let adapter = build_devto(&config)?;
            workflow.run(&files, mode, &adapter).await?
        }
        Platform::Qiita => {
            let adapter = build_qiita(&config)?;
            workflow.run(&files, mode, &adapter).await?
        }
    };

    print_summary(&report);

    if report.failed() {
        let failures = report
            .files
            .iter()
            .filter(|file| file.outcome.is_failure())
            .count();
        bail!(
            "{} of {} file(s) failed to {} on {}",
            failures,
            report.files.len(),
            mode.verb(),
            platform
        );
    }

    Ok(())
}

async fn changed_files(
    config: &AppConfig,
    ctx: &Context,
    platform: Platform,
) -> Result<Vec<PathBuf>> {
    let layout = config.content_layout();
    let detector = ChangeDetector::new(
        Arc::new(GitStatusSource::new(ctx.working_dir.clone())),
        Arc::new(FsContentSource::new()),
        Arc::new(JsonPostMapStore::new()),
        layout.clone(),
        WorkflowConfig {
            working_dir: ctx.working_dir.clone(),
        },
    );

    let change_set = detector.detect(&all_map_files(config)).await?;
    let files = change_set.for_platform(&layout, platform);
    tracing::info!(platform = %platform, files = files.len(), "Using changed content files");

    Ok(files.into_iter().map(PathBuf::from).collect())
}

fn print_summary(report: &WorkflowReport) {
    for file in &report.files {
        let status = match &file.outcome {
            FileOutcome::Reconciled { message, .. } => format!("ok       {}", message),
            FileOutcome::Skipped { reason, cleaned } => {
                if *cleaned {
                    format!("skipped  {} (mapping removed)", reason)
                } else {
                    format!("skipped  {}", reason)
                }
            }
            FileOutcome::Rejected { reason } => format!("rejected {}", reason),
            FileOutcome::Failed {
                status, message, ..
            } => match status {
                Some(status) => format!("failed   [HTTP {}] {}", status, message),
                None => format!("failed   {}", message),
            },
        };
        println!("{}: {}", file.path, status);
    }
}
