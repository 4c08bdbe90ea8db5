//! Filesystem content reader for markdown files with YAML front matter

use async_trait::async_trait;
use crosspost_domain::{
    normalize_body, ContentError, ContentFrontMatter, ContentSource, ParsedContent,
    PlatformSelector,
};
use regex::Regex;
use serde_yaml::{Mapping, Value};
use std::path::Path;

/// Reads content files from the local filesystem
pub struct FsContentSource {
    front_matter_pattern: Regex,
}

impl Default for FsContentSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FsContentSource {
    pub fn new() -> Self {
        let front_matter_pattern =
            Regex::new(r"(?ms)\A---[ \t]*\n(.*?)^---[ \t]*$\n?").expect("Valid regex");
        Self {
            front_matter_pattern,
        }
    }

    /// Split raw file text into front matter and body
    pub fn parse(&self, raw: &str) -> Result<ParsedContent, ContentError> {
        let text = raw.replace("\r\n", "\n");
        let text = text.strip_prefix('\u{feff}').unwrap_or(&text);

        let (yaml, body) = match self.front_matter_pattern.captures(text) {
            Some(captures) => {
                let whole = captures.get(0).map_or(0..0, |m| m.range());
                let yaml = captures.get(1).map_or("", |m| m.as_str());
                (Some(yaml), &text[whole.end..])
            }
            None if opens_front_matter(text) => {
                return Err(ContentError::UnterminatedFrontMatter);
            }
            None => (None, text),
        };

        let mapping = match yaml {
            Some(yaml) => parse_mapping(yaml)?,
            None => Mapping::new(),
        };

        let title = mapping
            .get("title")
            .and_then(Value::as_str)
            .map(str::trim)
            .unwrap_or_default();
        if title.is_empty() {
            return Err(ContentError::MissingTitle);
        }

        let front_matter = ContentFrontMatter {
            title: title.to_string(),
            tags: mapping.get("tags").and_then(string_list),
            platform: mapping
                .get("platform")
                .map(platform_selector)
                .unwrap_or_default(),
            canonical_url: optional_string(&mapping, "canonical_url"),
            cover_image: optional_string(&mapping, "cover_image"),
            series: optional_string(&mapping, "series"),
            organization_id: mapping.get("organization_id").and_then(as_u64),
            qiita_org: optional_string(&mapping, "qiita_org"),
        };

        Ok(ParsedContent {
            front_matter,
            body: normalize_body(body),
        })
    }
}

#[async_trait]
impl ContentSource for FsContentSource {
    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::metadata(path)
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false)
    }

    async fn read(&self, path: &Path) -> Result<ParsedContent, ContentError> {
        let raw = tokio::fs::read_to_string(path).await?;
        self.parse(&raw)
    }
}

fn opens_front_matter(text: &str) -> bool {
    text.lines()
        .next()
        .is_some_and(|line| line.trim_end() == "---")
}

fn parse_mapping(yaml: &str) -> Result<Mapping, ContentError> {
    let value: Value = serde_yaml::from_str(yaml)
        .map_err(|e| ContentError::InvalidFrontMatter(e.to_string()))?;
    match value {
        Value::Mapping(mapping) => Ok(mapping),
        Value::Null => Ok(Mapping::new()),
        _ => Err(ContentError::InvalidFrontMatter(
            "front matter must be a mapping".to_string(),
        )),
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Tags as a YAML list or a comma-separated string; empty results are absent
fn string_list(value: &Value) -> Option<Vec<String>> {
    let items: Vec<String> = match value {
        Value::Sequence(items) => items.iter().filter_map(scalar_to_string).collect(),
        Value::Null => return None,
        other => scalar_to_string(other)?
            .split(',')
            .map(str::to_string)
            .collect(),
    };

    let items: Vec<String> = items
        .iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect();

    (!items.is_empty()).then_some(items)
}

fn platform_selector(value: &Value) -> PlatformSelector {
    match value {
        Value::Sequence(items) => {
            PlatformSelector::from_list(items.iter().filter_map(scalar_to_string))
        }
        other => scalar_to_string(other)
            .map(|s| PlatformSelector::parse(&s))
            .unwrap_or_default(),
    }
}

fn optional_string(mapping: &Mapping, key: &str) -> Option<String> {
    mapping
        .get(key)
        .and_then(scalar_to_string)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crosspost_domain::Platform;
    use tempfile::TempDir;

    fn parse(raw: &str) -> Result<ParsedContent, ContentError> {
        FsContentSource::new().parse(raw)
    }

    #[test]
    fn test_parse_full_front_matter() {
        let raw = r#"---
title: "  Hello Rust  "
tags: [rust, cli]
platform: devto
canonical_url: https://example.com/hello
series: Getting started
organization_id: 42
---

# Hello

Body text.
"#;
        let parsed = parse(raw).unwrap();

        assert_eq!(parsed.front_matter.title, "Hello Rust");
        assert_eq!(
            parsed.front_matter.tags,
            Some(vec!["rust".to_string(), "cli".to_string()])
        );
        assert!(parsed.front_matter.platform.wants(Platform::Devto));
        assert!(!parsed.front_matter.platform.wants(Platform::Qiita));
        assert_eq!(
            parsed.front_matter.canonical_url.as_deref(),
            Some("https://example.com/hello")
        );
        assert_eq!(parsed.front_matter.series.as_deref(), Some("Getting started"));
        assert_eq!(parsed.front_matter.organization_id, Some(42));
        assert_eq!(parsed.body, "# Hello\n\nBody text.");
    }

    #[test]
    fn test_comma_separated_tags_and_platform_list() {
        let raw = "---\ntitle: T\ntags: 'rust, , async '\nplatform: [Qiita]\nqiita_org: ' my-org '\n---\nbody";
        let parsed = parse(raw).unwrap();

        assert_eq!(
            parsed.front_matter.tags,
            Some(vec!["rust".to_string(), "async".to_string()])
        );
        assert!(parsed.front_matter.platform.wants(Platform::Qiita));
        assert!(!parsed.front_matter.platform.wants(Platform::Devto));
        assert_eq!(parsed.front_matter.qiita_org.as_deref(), Some("my-org"));
    }

    #[test]
    fn test_empty_tags_are_absent() {
        let parsed = parse("---\ntitle: T\ntags: []\n---\nbody").unwrap();
        assert_eq!(parsed.front_matter.tags, None);
        assert_eq!(parsed.front_matter.platform, PlatformSelector::Any);
    }

    #[test]
    fn test_crlf_is_normalized() {
        let parsed = parse("---\r\ntitle: T\r\n---\r\nline one\r\nline two\r\n").unwrap();
        assert_eq!(parsed.front_matter.title, "T");
        assert_eq!(parsed.body, "line one\nline two");
    }

    #[test]
    fn test_missing_title() {
        assert!(matches!(
            parse("---\ntags: [a]\n---\nbody"),
            Err(ContentError::MissingTitle)
        ));
        assert!(matches!(
            parse("---\ntitle: '   '\n---\nbody"),
            Err(ContentError::MissingTitle)
        ));
        assert!(matches!(
            parse("# No front matter here"),
            Err(ContentError::MissingTitle)
        ));
    }

    #[test]
    fn test_unterminated_front_matter() {
        assert!(matches!(
            parse("---\ntitle: T\nbody without closing"),
            Err(ContentError::UnterminatedFrontMatter)
        ));
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(matches!(
            parse("---\ntitle: [unclosed\n---\nbody"),
            Err(ContentError::InvalidFrontMatter(_))
        ));
    }

    #[tokio::test]
    async fn test_read_from_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("post.md");
        std::fs::write(&path, "---\ntitle: On disk\n---\nHi").unwrap();

        let source = FsContentSource::new();
        assert!(source.exists(&path).await);
        assert!(!source.exists(dir.path()).await);
        assert!(!source.exists(&dir.path().join("missing.md")).await);

        let parsed = source.read(&path).await.unwrap();
        assert_eq!(parsed.front_matter.title, "On disk");
        assert_eq!(parsed.body, "Hi");
    }
}
