//! Subcommand implementations

pub mod changes;
pub mod config;
pub mod doctor;
pub mod publish;
pub mod verify;

use anyhow::{Context as _, Result, bail};
use crosspost_adapters::{DevtoAdapter, QiitaAdapter};
use crosspost_domain::Platform;
use secrecy::SecretString;
use std::path::PathBuf;

use crate::config::AppConfig;

/// Global options shared by every subcommand
#[derive(Debug, Clone)]
pub struct Context {
    pub config_path: Option<PathBuf>,
    /// Absolute working directory
    pub working_dir: PathBuf,
}

impl Context {
    pub fn load_config(&self) -> Result<AppConfig> {
        AppConfig::load(self.config_path.as_deref(), &self.working_dir)
    }
}

pub(crate) fn load_api_key(env_var: &str, platform: Platform) -> Result<SecretString> {
    if env_var.trim().is_empty() {
        bail!("No API key env var configured for {}", platform);
    }

    let key = std::env::var(env_var)
        .with_context(|| format!("Missing API key env var {} for {}", env_var, platform))?;

    if key.trim().is_empty() {
        bail!("API key env var {} is empty for {}", env_var, platform);
    }

    Ok(SecretString::new(key.into()))
}

pub(crate) fn build_devto(config: &AppConfig) -> Result<DevtoAdapter> {
    let api_key = load_api_key(&config.devto.api_key_env, Platform::Devto)?;
    let adapter =
        DevtoAdapter::with_base_url(api_key, &config.devto.base_url, &config.http_settings())
            .context("Failed to initialize dev.to client")?;
    Ok(adapter.with_map_file(&config.devto.map_file))
}

pub(crate) fn build_qiita(config: &AppConfig) -> Result<QiitaAdapter> {
    let token = load_api_key(&config.qiita.token_env, Platform::Qiita)?;
    let adapter =
        QiitaAdapter::with_base_url(token, &config.qiita.base_url, &config.http_settings())
            .context("Failed to initialize Qiita client")?;
    Ok(adapter.with_map_file(&config.qiita.map_file))
}

/// Post map filenames of every platform
pub(crate) fn all_map_files(config: &AppConfig) -> Vec<String> {
    Platform::ALL
        .iter()
        .map(|platform| config.map_file(*platform).to_string())
        .collect()
}
