//! Configuration loading and management

use anyhow::{Context, Result};
use crosspost_adapters::HttpSettings;
use crosspost_adapters::http::DEFAULT_USER_AGENT;
use crosspost_domain::Platform;
use crosspost_domain::usecases::{ContentDirectory, ContentLayout};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "crosspost.toml";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub content: ContentConfig,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub devto: DevtoConfig,

    #[serde(default)]
    pub qiita: QiitaConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentConfig {
    #[serde(default = "default_content_directories")]
    pub directories: Vec<ContentDirectoryConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentDirectoryConfig {
    pub path: String,
    pub platform: Platform,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Unset means no client timeout
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    #[serde(default)]
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevtoConfig {
    #[serde(default = "default_devto_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_devto_base_url")]
    pub base_url: String,

    #[serde(default = "default_devto_map_file")]
    pub map_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QiitaConfig {
    #[serde(default = "default_qiita_token_env")]
    pub token_env: String,

    #[serde(default = "default_qiita_base_url")]
    pub base_url: String,

    #[serde(default = "default_qiita_map_file")]
    pub map_file: String,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_content_directories() -> Vec<ContentDirectoryConfig> {
    ContentLayout::default()
        .directories
        .into_iter()
        .map(|dir| ContentDirectoryConfig {
            path: dir.prefix,
            platform: dir.platform,
        })
        .collect()
}

fn default_devto_api_key_env() -> String {
    "DEVTO_API_KEY".to_string()
}

fn default_devto_base_url() -> String {
    crosspost_adapters::devto::DEFAULT_BASE_URL.to_string()
}

fn default_devto_map_file() -> String {
    Platform::Devto.default_map_filename().to_string()
}

fn default_qiita_token_env() -> String {
    "QIITA_TOKEN".to_string()
}

fn default_qiita_base_url() -> String {
    crosspost_adapters::qiita::DEFAULT_BASE_URL.to_string()
}

fn default_qiita_map_file() -> String {
    Platform::Qiita.default_map_filename().to_string()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            directories: default_content_directories(),
        }
    }
}

impl Default for DevtoConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_devto_api_key_env(),
            base_url: default_devto_base_url(),
            map_file: default_devto_map_file(),
        }
    }
}

impl Default for QiitaConfig {
    fn default() -> Self {
        Self {
            token_env: default_qiita_token_env(),
            base_url: default_qiita_base_url(),
            map_file: default_qiita_map_file(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment.
    ///
    /// Without an explicit path, `crosspost.toml` in the working directory is used
    /// when it exists.
    pub fn load(config_path: Option<&Path>, working_dir: &Path) -> Result<Self> {
        let mut builder = config::Config::builder();

        let default_path = working_dir.join(DEFAULT_CONFIG_FILE);
        let path = config_path.unwrap_or(&default_path);

        if path.exists() {
            builder = builder.add_source(config::File::from(path));
        } else if config_path.is_some() {
            // User specified a path that doesn't exist
            anyhow::bail!("Config file not found: {}", path.display());
        }

        // Add environment variable overrides
        builder = builder.add_source(
            config::Environment::with_prefix("CROSSPOST")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    pub fn content_layout(&self) -> ContentLayout {
        ContentLayout {
            directories: self
                .content
                .directories
                .iter()
                .map(|dir| ContentDirectory::new(dir.path.clone(), dir.platform))
                .collect(),
        }
    }

    pub fn http_settings(&self) -> HttpSettings {
        HttpSettings {
            timeout: self.http.timeout_secs.map(Duration::from_secs),
            user_agent: self
                .http
                .user_agent
                .clone()
                .filter(|ua| !ua.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
        }
    }

    /// Post map filename of a platform, relative to the working directory
    pub fn map_file(&self, platform: Platform) -> &str {
        match platform {
            Platform::Devto => &self.devto.map_file,
            Platform::Qiita => &self.qiita.map_file,
        }
    }

    /// Name of the environment variable holding a platform's credential
    pub fn credential_env(&self, platform: Platform) -> &str {
        match platform {
            Platform::Devto => &self.devto.api_key_env,
            Platform::Qiita => &self.qiita.token_env,
        }
    }

    /// Generate example configuration as TOML string
    pub fn example_toml() -> String {
        r#"# crosspost configuration

[general]
log_level = "info"

# Each content directory is published to one platform.
[[content.directories]]
path = "content/en/"
platform = "devto"

[[content.directories]]
path = "content/ja/"
platform = "qiita"

[http]
# No timeout unless set
# timeout_secs = 30
# user_agent = "crosspost"

[devto]
api_key_env = "DEVTO_API_KEY"
base_url = "https://dev.to/api"
map_file = ".posts-map.devto.json"

[qiita]
token_env = "QIITA_TOKEN"
base_url = "https://qiita.com/api/v2"
map_file = ".posts-map.qiita.json"
"#
        .to_string()
    }
}

/// Resolve the working directory to an absolute path
pub fn resolve_working_dir(working_dir: Option<PathBuf>) -> Result<PathBuf> {
    let current = std::env::current_dir().context("Failed to read current directory")?;
    Ok(match working_dir {
        Some(dir) if dir.is_absolute() => dir,
        Some(dir) => current.join(dir),
        None => current,
    })
}
