//! Changes command - list changed content files per content directory

use anyhow::Result;
use crosspost_adapters::{
    changes::GitStatusSource, content::FsContentSource, post_map::JsonPostMapStore,
};
use crosspost_domain::{
    Platform,
    usecases::{ChangeDetector, ChangeSet, ContentLayout, StaleEntry, WorkflowConfig},
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::args::ChangesArgs;
use crate::commands::{Context, all_map_files};

#[derive(Debug, Serialize)]
struct ChangesReport<'a> {
    directories: Vec<DirectoryChanges<'a>>,
    stale: &'a [StaleEntry],
}

#[derive(Debug, Serialize)]
struct DirectoryChanges<'a> {
    path: &'a str,
    platform: Platform,
    variable: String,
    files: Vec<String>,
}

pub async fn execute(args: ChangesArgs, ctx: Context) -> Result<()> {
    let config = ctx.load_config()?;
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

    let change_set = detector.detect(&all_map_files(&config)).await?;
    let report = build_report(&change_set, &layout);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}

fn build_report<'a>(change_set: &'a ChangeSet, layout: &'a ContentLayout) -> ChangesReport<'a> {
    ChangesReport {
        directories: change_set
            .split(layout)
            .into_iter()
            .map(|(dir, files)| DirectoryChanges {
                path: &dir.prefix,
                platform: dir.platform,
                variable: dir.variable_name(),
                files,
            })
            .collect(),
        stale: &change_set.stale,
    }
}

fn print_report(report: &ChangesReport<'_>) {
    if !report.stale.is_empty() {
        println!(
            "Detected published mapping entries without source files. They will be cleaned up:"
        );
        let mut by_path: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for entry in report.stale {
            by_path
                .entry(entry.path.as_str())
                .or_default()
                .push(entry.map_file.as_str());
        }
        for (path, map_files) in by_path {
            println!("  {} -> {}", path, map_files.join(", "));
        }
    }

    if report.directories.iter().all(|dir| dir.files.is_empty()) {
        println!("No changed markdown files found.");
        return;
    }

    for dir in &report.directories {
        if dir.files.is_empty() {
            continue;
        }
        println!("Changed files in {} ({}):", dir.path, dir.platform);
        for file in &dir.files {
            println!("  {}", file);
        }
    }

    // Space-separated lists for use in Makefiles
    for dir in &report.directories {
        println!("{}={}", dir.variable, dir.files.join(" "));
    }
}
