//! JSON file post map store

use async_trait::async_trait;
use crosspost_domain::{PostMap, PostMapError, PostMapStore};
use std::path::Path;
use tokio::fs;

/// Stores each post map as a pretty-printed JSON object on disk
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPostMapStore;

impl JsonPostMapStore {
    pub fn new() -> Self {
        Self
    }
}

fn io_error(path: &Path, source: std::io::Error) -> PostMapError {
    PostMapError::Io {
        path: path.display().to_string(),
        source,
    }
}

#[async_trait]
impl PostMapStore for JsonPostMapStore {
    async fn load(&self, path: &Path) -> Result<PostMap, PostMapError> {
        let raw = match fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Post map not found, starting empty");
                return Ok(PostMap::new());
            }
            Err(e) => return Err(io_error(path, e)),
        };

        serde_json::from_str(&raw).map_err(|e| PostMapError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    async fn save(&self, path: &Path, map: &PostMap) -> Result<(), PostMapError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| io_error(parent, e))?;
            }
        }

        let mut json = serde_json::to_string_pretty(map)
            .map_err(|e| PostMapError::Serialization(e.to_string()))?;
        json.push('\n');

        fs::write(path, json).await.map_err(|e| io_error(path, e))?;
        tracing::debug!(path = %path.display(), entries = map.len(), "Post map saved");
        Ok(())
    }
}
