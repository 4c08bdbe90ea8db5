//! dev.to (Forem) API adapter

use async_trait::async_trait;
use crosspost_domain::{
    format_timestamp, Clock, PayloadContext, Platform, PlatformAdapter, PostMapEntry,
    RemoteArticle, RemoteArticleSource, RemoteError, RemoteId, RequestContext, SyncContext,
    SyncResult, SystemClock, ValidateContext, Validation,
};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::http::{decode, ensure_success, transport_error, trim_base_url, HttpSettings};

pub const DEFAULT_BASE_URL: &str = "https://dev.to/api";

/// Publishes articles through the dev.to REST API
pub struct DevtoAdapter {
    client: Client,
    api_key: SecretString,
    base_url: String,
    map_file: String,
    clock: Arc<dyn Clock>,
}

impl DevtoAdapter {
    pub fn new(api_key: SecretString, settings: &HttpSettings) -> Result<Self, RemoteError> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL, settings)
    }

    pub fn with_base_url(
        api_key: SecretString,
        base_url: impl Into<String>,
        settings: &HttpSettings,
    ) -> Result<Self, RemoteError> {
        Ok(Self {
            client: settings.build_client()?,
            api_key,
            base_url: trim_base_url(base_url),
            map_file: Platform::Devto.default_map_filename().to_string(),
            clock: Arc::new(SystemClock),
        })
    }

    /// Use a post map file other than `.posts-map.devto.json`
    pub fn with_map_file(mut self, map_file: impl Into<String>) -> Self {
        self.map_file = map_file.into();
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn article_url(&self, id: &RemoteId) -> String {
        format!("{}/articles/{}", self.base_url, id)
    }
}

/// Request body for create and update
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DevtoPayload {
    pub article: DevtoArticleFields,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DevtoArticleFields {
    pub title: String,
    pub published: bool,
    pub body_markdown: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonical_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<u64>,
}

/// Article returned by create and update
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DevtoArticleResponse {
    pub id: u64,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub edited_at: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub published: Option<bool>,
}

/// Article returned by `GET /articles/{id}`
#[derive(Debug, Deserialize)]
struct DevtoFetchedArticle {
    title: String,
    #[serde(default)]
    body_markdown: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    published: Option<bool>,
    #[serde(default)]
    updated_at: Option<String>,
    #[serde(default)]
    published_at: Option<String>,
    #[serde(default)]
    published_timestamp: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[async_trait]
impl PlatformAdapter for DevtoAdapter {
    type Payload = DevtoPayload;
    type Response = DevtoArticleResponse;
    type Sanitized = ();

    fn platform(&self) -> Platform {
        Platform::Devto
    }

    fn map_filename(&self) -> &str {
        &self.map_file
    }

    fn validate_front_matter(&self, _ctx: ValidateContext<'_>) -> Validation<()> {
        Validation::Valid(())
    }

    fn prepare_payload(&self, ctx: PayloadContext<'_, ()>) -> DevtoPayload {
        let fm = ctx.front_matter;
        DevtoPayload {
            article: DevtoArticleFields {
                title: fm.title.clone(),
                published: ctx.mode.should_publish(),
                body_markdown: ctx.body.to_string(),
                tags: fm.tags.clone(),
                canonical_url: fm.canonical_url.clone(),
                cover_image: fm.cover_image.clone(),
                series: fm.series.clone(),
                organization_id: fm.organization_id,
            },
        }
    }

    async fn perform_request(
        &self,
        ctx: RequestContext<'_, DevtoPayload, ()>,
    ) -> Result<DevtoArticleResponse, RemoteError> {
        let request = match ctx.existing_entry {
            Some(entry) => self.client.put(self.article_url(&entry.id)),
            None => self.client.post(format!("{}/articles", self.base_url)),
        };

        tracing::debug!(
            existing_id = ?ctx.existing_entry.map(|e| e.id.to_string()),
            published = ctx.payload.article.published,
            "Sending dev.to article"
        );

        let response = request
            .header("api-key", self.api_key.expose_secret())
            .json(ctx.payload)
            .send()
            .await
            .map_err(transport_error)?;

        let response = ensure_success(Platform::Devto, response).await?;
        decode(response).await
    }

    fn synchronize_post_map_entry(
        &self,
        ctx: SyncContext<'_, DevtoArticleResponse, ()>,
    ) -> SyncResult {
        let response = ctx.response;
        let updated_at = response
            .edited_at
            .clone()
            .or_else(|| response.updated_at.clone())
            .or_else(|| response.published_at.clone())
            .unwrap_or_else(|| format_timestamp(self.clock.now()));

        let message = format!(
            "{} dev.to {}: {}",
            if ctx.existing_entry.is_some() {
                "Updated"
            } else {
                "Created"
            },
            ctx.mode.noun(),
            ctx.front_matter.title
        );

        SyncResult {
            entry: PostMapEntry {
                id: RemoteId::Numeric(response.id),
                url: response.url,
                updated_at: Some(updated_at),
                published_at: response.published_at,
                published: Some(ctx.mode.should_publish()),
            },
            message,
        }
    }
}

#[async_trait]
impl RemoteArticleSource for DevtoAdapter {
    fn platform(&self) -> Platform {
        Platform::Devto
    }

    fn map_filename(&self) -> &str {
        &self.map_file
    }

    async fn fetch_article(&self, id: &RemoteId) -> Result<RemoteArticle, RemoteError> {
        let response = self
            .client
            .get(self.article_url(id))
            .header("api-key", self.api_key.expose_secret())
            .send()
            .await
            .map_err(transport_error)?;

        let response = ensure_success(Platform::Devto, response).await?;
        let article: DevtoFetchedArticle = decode(response).await?;

        let published_at =
            non_empty(article.published_at).or_else(|| non_empty(article.published_timestamp));
        let published = article.published.unwrap_or(published_at.is_some());

        Ok(RemoteArticle {
            title: article.title,
            body: article.body_markdown.unwrap_or_default(),
            published,
            url: article.url,
            updated_at: article.updated_at,
            published_at,
        })
    }
}
