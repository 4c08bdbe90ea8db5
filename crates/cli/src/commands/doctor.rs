//! Doctor command - validate configuration and show status

use anyhow::Result;
use crosspost_adapters::post_map::JsonPostMapStore;
use crosspost_domain::{Platform, PostMapStore};
use serde::Serialize;
use std::path::Path;

use crate::args::DoctorArgs;
use crate::commands::Context;
use crate::config::AppConfig;

#[derive(Debug, Serialize)]
struct DoctorReport {
    config: CheckResult,
    content: CheckResult,
    devto: CheckResult,
    qiita: CheckResult,
    post_maps: CheckResult,
    git: CheckResult,
    overall: String,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    status: String,
    message: String,
    details: Option<serde_json::Value>,
}

impl CheckResult {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn warn(message: impl Into<String>) -> Self {
        Self {
            status: "warn".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    fn is_ok(&self) -> bool {
        self.status == "ok"
    }

    fn is_error(&self) -> bool {
        self.status == "error"
    }
}

pub async fn execute(args: DoctorArgs, ctx: Context) -> Result<()> {
    let mut report = DoctorReport {
        config: CheckResult::error("Not checked"),
        content: CheckResult::error("Not checked"),
        devto: CheckResult::error("Not checked"),
        qiita: CheckResult::error("Not checked"),
        post_maps: CheckResult::error("Not checked"),
        git: CheckResult::error("Not checked"),
        overall: "error".to_string(),
    };

    // Check config
    let config = match ctx.load_config() {
        Ok(c) => {
            report.config = CheckResult::ok("Configuration loaded successfully");
            Some(c)
        }
        Err(e) => {
            report.config = CheckResult::error(format!("Failed to load config: {:#}", e));
            None
        }
    };

    if let Some(ref config) = config {
        report.content = check_content(config, &ctx.working_dir);
        report.devto = check_credential(config, Platform::Devto);
        report.qiita = check_credential(config, Platform::Qiita);
        report.post_maps = check_post_maps(config, &ctx.working_dir).await;
        report.git = check_git();
    }

    let checks = [
        &report.config,
        &report.content,
        &report.devto,
        &report.qiita,
        &report.post_maps,
        &report.git,
    ];

    let has_error = checks.iter().any(|c| c.is_error());
    let all_ok = checks.iter().all(|c| c.is_ok());

    report.overall = if has_error {
        "error".to_string()
    } else if all_ok {
        "ok".to_string()
    } else {
        "warn".to_string()
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if report.overall == "error" {
        std::process::exit(1);
    }

    Ok(())
}

fn check_content(config: &AppConfig, working_dir: &Path) -> CheckResult {
    let layout = config.content_layout();
    if layout.directories.is_empty() {
        return CheckResult::error("No content directories configured");
    }

    let mut missing = Vec::new();
    let mut details = Vec::new();
    for dir in &layout.directories {
        let path = working_dir.join(&dir.prefix);
        let markdown_files = count_markdown(&path);
        if !path.is_dir() {
            missing.push(dir.prefix.clone());
        }
        details.push(serde_json::json!({
            "path": dir.prefix,
            "platform": dir.platform,
            "markdown_files": markdown_files,
        }));
    }

    let result = if missing.is_empty() {
        CheckResult::ok(format!(
            "{} content director{} found",
            layout.directories.len(),
            if layout.directories.len() == 1 { "y" } else { "ies" }
        ))
    } else {
        CheckResult::warn(format!(
            "Content directories not found: {}",
            missing.join(", ")
        ))
    };
    result.with_details(serde_json::Value::Array(details))
}

fn count_markdown(dir: &Path) -> usize {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return 0;
    };
    entries
        .flatten()
        .map(|entry| entry.path())
        .map(|path| {
            if path.is_dir() {
                count_markdown(&path)
            } else if path.extension().is_some_and(|ext| ext == "md") {
                1
            } else {
                0
            }
        })
        .sum()
}

fn check_credential(config: &AppConfig, platform: Platform) -> CheckResult {
    let env_var = config.credential_env(platform);
    if env_var.trim().is_empty() {
        return CheckResult::error(format!("No API key env var configured for {}", platform));
    }

    let base_url = match platform {
        Platform::Devto => &config.devto.base_url,
        Platform::Qiita => &config.qiita.base_url,
    };

    // Only report presence, never the value
    match std::env::var(env_var) {
        Ok(val) if !val.trim().is_empty() => CheckResult::ok(format!(
            "API key: {} (set), base_url: {}",
            env_var, base_url
        )),
        _ => CheckResult::warn(format!(
            "API key: {} (not set), base_url: {}",
            env_var, base_url
        )),
    }
}

async fn check_post_maps(config: &AppConfig, working_dir: &Path) -> CheckResult {
    let store = JsonPostMapStore::new();
    let mut details = Vec::new();
    let mut errors = Vec::new();

    for platform in Platform::ALL {
        let map_file = config.map_file(platform);
        match store.load(&working_dir.join(map_file)).await {
            Ok(map) => details.push(serde_json::json!({
                "platform": platform,
                "map_file": map_file,
                "entries": map.len(),
                "published": map.iter().filter(|(_, entry)| entry.is_published()).count(),
            })),
            Err(e) => errors.push(e.to_string()),
        }
    }

    if !errors.is_empty() {
        return CheckResult::error(errors.join("; "));
    }

    CheckResult::ok("Post maps readable").with_details(serde_json::Value::Array(details))
}

fn check_git() -> CheckResult {
    if command_exists("git") {
        CheckResult::ok("git found on PATH")
    } else {
        CheckResult::warn("git not found on PATH; `changes` and `publish --changed` need it")
    }
}

fn command_exists(command: &str) -> bool {
    let Some(paths) = std::env::var_os("PATH") else {
        return false;
    };

    std::env::split_paths(&paths).any(|dir| dir.join(command).is_file())
}

fn print_report(report: &DoctorReport) {
    println!("crosspost Doctor Report");
    println!("=======================");
    println!();

    print_check("Config", &report.config);
    print_check("Content", &report.content);
    print_check("dev.to", &report.devto);
    print_check("Qiita", &report.qiita);
    print_check("Post maps", &report.post_maps);
    print_check("git", &report.git);

    println!();
    let symbol = match report.overall.as_str() {
        "ok" => "✓",
        "warn" => "⚠",
        _ => "✗",
    };
    println!("{} Overall: {}", symbol, report.overall.to_uppercase());

    if report.overall == "ok" {
        println!();
        println!("Ready to publish! Try: crosspost changes");
    }
}

fn print_check(name: &str, result: &CheckResult) {
    let symbol = match result.status.as_str() {
        "ok" => "✓",
        "warn" => "⚠",
        _ => "✗",
    };
    println!("{} {}: {}", symbol, name, result.message);
}
