//! Config command - configuration management

use anyhow::{Context, Result};
use crosspost_domain::Platform;
use std::fs;
use std::path::PathBuf;

use crate::args::{ConfigArgs, ConfigCommands};
use crate::config::AppConfig;

pub async fn execute(args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Init { path, force } => init_config(path, force).await,
    }
}

async fn init_config(path: PathBuf, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            path.display()
        );
    }

    let content = AppConfig::example_toml();
    let written: AppConfig = config::Config::builder()
        .add_source(config::File::from_str(&content, config::FileFormat::Toml))
        .build()
        .and_then(|c| c.try_deserialize())
        .context("Generated configuration is invalid")?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    }

    fs::write(&path, content)
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;

    println!("Created config file: {}", path.display());
    println!();
    println!("Next steps:");
    for (i, step) in next_steps(&written).iter().enumerate() {
        println!("  {}. {}", i + 1, step);
    }

    Ok(())
}

fn next_steps(config: &AppConfig) -> Vec<String> {
    let credentials: Vec<&str> = Platform::ALL
        .iter()
        .map(|platform| config.credential_env(*platform))
        .collect();

    let mut steps = vec![
        format!("Export {}", credentials.join(" and ")),
        "Run 'crosspost doctor' to validate your setup".to_string(),
    ];

    if let Some(dir) = config.content.directories.first() {
        steps.push(format!(
            "Run 'crosspost publish --platform {} {}<post>.md' to create a draft",
            dir.platform.key(),
            dir.path
        ));
    }

    steps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ContentDirectoryConfig;

    #[test]
    fn test_next_steps_follow_configured_names() {
        let mut config = AppConfig::default();
        config.devto.api_key_env = "MY_DEVTO".to_string();
        config.qiita.token_env = "MY_QIITA".to_string();
        config.content.directories = vec![ContentDirectoryConfig {
            path: "posts/ja/".to_string(),
            platform: Platform::Qiita,
        }];

        let steps = next_steps(&config);

        assert_eq!(steps[0], "Export MY_DEVTO and MY_QIITA");
        assert_eq!(
            steps[2],
            "Run 'crosspost publish --platform qiita posts/ja/<post>.md' to create a draft"
        );
    }

    #[test]
    fn test_next_steps_without_content_directories() {
        let mut config = AppConfig::default();
        config.content.directories.clear();

        let steps = next_steps(&config);

        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0], "Export DEVTO_API_KEY and QIITA_TOKEN");
    }
}
