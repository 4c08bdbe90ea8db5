//! Verify command - compare remote articles with local markdown and post maps

use anyhow::Result;
use crosspost_adapters::{content::FsContentSource, post_map::JsonPostMapStore};
use crosspost_domain::{
    Platform, VerificationIssue,
    usecases::{RemoteVerifier, WorkflowConfig},
};
use std::sync::Arc;

use crate::args::VerifyArgs;
use crate::commands::{Context, build_devto, build_qiita};

pub async fn execute(args: VerifyArgs, ctx: Context) -> Result<()> {
    let config = ctx.load_config()?;

    let mut platforms: Vec<Platform> = args.platform.into_iter().map(Platform::from).collect();
    if platforms.is_empty() {
        platforms = Platform::ALL.to_vec();
    }
    platforms.sort();
    platforms.dedup();

    // Credentials are checked up front so a missing one fails before any request
    let devto = platforms
        .contains(&Platform::Devto)
        .then(|| build_devto(&config))
        .transpose()?;
    let qiita = platforms
        .contains(&Platform::Qiita)
        .then(|| build_qiita(&config))
        .transpose()?;

    let verifier = RemoteVerifier::new(
        Arc::new(FsContentSource::new()),
        Arc::new(JsonPostMapStore::new()),
        WorkflowConfig {
            working_dir: ctx.working_dir.clone(),
        },
    );

    let mut issues: Vec<VerificationIssue> = Vec::new();
    if let Some(adapter) = &devto {
        issues.extend(verifier.verify(adapter).await?);
    }
    if let Some(adapter) = &qiita {
        issues.extend(verifier.verify(adapter).await?);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&issues)?);
    } else if issues.is_empty() {
        println!("All remote articles are in sync with local markdown and post maps.");
    } else {
        eprintln!("Detected remote publishing inconsistencies:");
        for issue in &issues {
            eprintln!("- {}: {}", issue.file, issue.message);
        }
    }

    if !issues.is_empty() {
        std::process::exit(1);
    }

    Ok(())
}
