//! Target platforms and the front matter `platform` selector

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A remote article service crosspost can publish to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Devto,
    Qiita,
}

impl Platform {
    pub const ALL: [Platform; 2] = [Platform::Devto, Platform::Qiita];

    /// Lowercase identifier used in front matter selectors, CLI flags and config
    pub fn key(self) -> &'static str {
        match self {
            Platform::Devto => "devto",
            Platform::Qiita => "qiita",
        }
    }

    /// Human-readable platform name used in log messages
    pub fn display_name(self) -> &'static str {
        match self {
            Platform::Devto => "dev.to",
            Platform::Qiita => "Qiita",
        }
    }

    /// Post map filename used when the configuration does not override it
    pub fn default_map_filename(self) -> &'static str {
        match self {
            Platform::Devto => ".posts-map.devto.json",
            Platform::Qiita => ".posts-map.qiita.json",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Invalid platform '{0}': expected one of devto, qiita")]
pub struct PlatformParseError(pub String);

impl FromStr for Platform {
    type Err = PlatformParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "devto" | "dev.to" => Ok(Platform::Devto),
            "qiita" => Ok(Platform::Qiita),
            _ => Err(PlatformParseError(s.to_string())),
        }
    }
}

/// Which platforms a content file targets.
///
/// An absent selector, an empty one, or `auto` targets every platform.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PlatformSelector {
    #[default]
    Any,
    /// Lowercased platform keys
    Only(Vec<String>),
}

impl PlatformSelector {
    /// Parse a comma-separated selector string such as `"devto, qiita"`.
    ///
    /// Only a whole value of `auto` means every platform; inside a list it is
    /// just an unknown name.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("auto") {
            return PlatformSelector::Any;
        }
        Self::from_list(value.split(','))
    }

    /// Build a selector from a YAML list of platform names
    pub fn from_list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keys: Vec<String> = items
            .into_iter()
            .map(|item| item.as_ref().trim().to_lowercase())
            .filter(|item| !item.is_empty())
            .collect();

        if keys.is_empty() {
            PlatformSelector::Any
        } else {
            PlatformSelector::Only(keys)
        }
    }

    pub fn wants(&self, platform: Platform) -> bool {
        match self {
            PlatformSelector::Any => true,
            PlatformSelector::Only(keys) => keys.iter().any(|key| key == platform.key()),
        }
    }
}
