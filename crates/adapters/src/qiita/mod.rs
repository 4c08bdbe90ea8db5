//! Qiita API v2 adapter

use async_trait::async_trait;
use crosspost_domain::{
    format_timestamp, Clock, PayloadContext, Platform, PlatformAdapter, PostMapEntry, Rejection,
    RemoteArticle, RemoteArticleSource, RemoteError, RemoteId, RequestContext, SyncContext,
    SyncResult, SystemClock, ValidateContext, Validation,
};
use reqwest::{Client, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::http::{decode, ensure_success, transport_error, trim_base_url, HttpSettings};

pub const DEFAULT_BASE_URL: &str = "https://qiita.com/api/v2";

/// Qiita accepts between one and five tags per item
pub const MIN_TAGS: usize = 1;
pub const MAX_TAGS: usize = 5;

/// Publishes items through the Qiita API
pub struct QiitaAdapter {
    client: Client,
    token: SecretString,
    base_url: String,
    map_file: String,
    clock: Arc<dyn Clock>,
}

impl QiitaAdapter {
    pub fn new(token: SecretString, settings: &HttpSettings) -> Result<Self, RemoteError> {
        Self::with_base_url(token, DEFAULT_BASE_URL, settings)
    }

    pub fn with_base_url(
        token: SecretString,
        base_url: impl Into<String>,
        settings: &HttpSettings,
    ) -> Result<Self, RemoteError> {
        Ok(Self {
            client: settings.build_client()?,
            token,
            base_url: trim_base_url(base_url),
            map_file: Platform::Qiita.default_map_filename().to_string(),
            clock: Arc::new(SystemClock),
        })
    }

    pub fn with_map_file(mut self, map_file: impl Into<String>) -> Self {
        self.map_file = map_file.into();
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn item_url(&self, id: &RemoteId) -> String {
        format!("{}/items/{}", self.base_url, id)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(
            "Authorization",
            format!("Bearer {}", self.token.expose_secret()),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QiitaTag {
    pub name: String,
    pub versions: Vec<String>,
}

/// Request body for create and update
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QiitaPayload {
    pub title: String,
    pub body: String,
    pub tags: Vec<QiitaTag>,
    pub private: bool,
    pub coediting: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_url_name: Option<String>,
    pub tweet: bool,
}

/// Item returned by create and update
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QiitaItemResponse {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub private: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct QiitaFetchedItem {
    title: String,
    #[serde(default)]
    body: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    private: bool,
    #[serde(default)]
    updated_at: Option<String>,
}

#[async_trait]
impl PlatformAdapter for QiitaAdapter {
    type Payload = QiitaPayload;
    type Response = QiitaItemResponse;
    /// Validated tag list
    type Sanitized = Vec<String>;

    fn platform(&self) -> Platform {
        Platform::Qiita
    }

    fn map_filename(&self) -> &str {
        &self.map_file
    }

    fn validate_front_matter(&self, ctx: ValidateContext<'_>) -> Validation<Vec<String>> {
        let tags = ctx.front_matter.tags.clone().unwrap_or_default();
        if !(MIN_TAGS..=MAX_TAGS).contains(&tags.len()) {
            return Validation::Rejected(Rejection::error(format!(
                "Error: {} - Qiita requires between {} and {} tags; found {}. Update the front matter and try again.",
                ctx.relative_path,
                MIN_TAGS,
                MAX_TAGS,
                tags.len()
            )));
        }
        Validation::Valid(tags)
    }

    fn prepare_payload(&self, ctx: PayloadContext<'_, Vec<String>>) -> QiitaPayload {
        let group_url_name = ctx
            .front_matter
            .qiita_org
            .as_deref()
            .map(str::trim)
            .filter(|org| !org.is_empty())
            .map(str::to_string);

        QiitaPayload {
            title: ctx.front_matter.title.clone(),
            body: ctx.body.to_string(),
            tags: ctx
                .sanitized
                .iter()
                .map(|name| QiitaTag {
                    name: name.clone(),
                    versions: Vec::new(),
                })
                .collect(),
            private: !ctx.mode.should_publish(),
            coediting: false,
            group_url_name,
            tweet: false,
        }
    }

    async fn perform_request(
        &self,
        ctx: RequestContext<'_, QiitaPayload, Vec<String>>,
    ) -> Result<QiitaItemResponse, RemoteError> {
        let request = match ctx.existing_entry {
            Some(entry) => self.client.patch(self.item_url(&entry.id)),
            None => self.client.post(format!("{}/items", self.base_url)),
        };

        tracing::debug!(
            existing_id = ?ctx.existing_entry.map(|e| e.id.to_string()),
            private = ctx.payload.private,
            tags = ctx.payload.tags.len(),
            "Sending Qiita item"
        );

        let response = self
            .authorized(request)
            .json(ctx.payload)
            .send()
            .await
            .map_err(transport_error)?;

        let response = ensure_success(Platform::Qiita, response).await?;
        decode(response).await
    }

    fn synchronize_post_map_entry(
        &self,
        ctx: SyncContext<'_, QiitaItemResponse, Vec<String>>,
    ) -> SyncResult {
        let response = ctx.response;
        let message = format!(
            "{} Qiita {}: {}",
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
                id: RemoteId::Text(response.id),
                url: response.url,
                updated_at: Some(
                    response
                        .updated_at
                        .unwrap_or_else(|| format_timestamp(self.clock.now())),
                ),
                published_at: None,
                published: Some(ctx.mode.should_publish()),
            },
            message,
        }
    }
}

#[async_trait]
impl RemoteArticleSource for QiitaAdapter {
    fn platform(&self) -> Platform {
        Platform::Qiita
    }

    fn map_filename(&self) -> &str {
        &self.map_file
    }

    async fn fetch_article(&self, id: &RemoteId) -> Result<RemoteArticle, RemoteError> {
        let response = self
            .authorized(self.client.get(self.item_url(id)))
            .send()
            .await
            .map_err(transport_error)?;

        let response = ensure_success(Platform::Qiita, response).await?;
        let item: QiitaFetchedItem = decode(response).await?;

        Ok(RemoteArticle {
            title: item.title,
            body: item.body,
            published: !item.private,
            url: item.url,
            updated_at: item.updated_at,
            published_at: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crosspost_domain::{ContentFrontMatter, PublishMode};
    use time::macros::datetime;
    use time::OffsetDateTime;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct FixedClock;

    impl Clock for FixedClock {
        fn now(&self) -> OffsetDateTime {
            datetime!(2024-06-01 12:00:00 UTC)
        }
    }

    fn adapter(base_url: &str) -> QiitaAdapter {
        QiitaAdapter::with_base_url(
            SecretString::new("test-token".into()),
            base_url,
            &HttpSettings::default(),
        )
        .unwrap()
        .with_clock(Arc::new(FixedClock))
    }

    fn with_tags(count: usize) -> ContentFrontMatter {
        ContentFrontMatter {
            title: "Qiita post".to_string(),
            tags: (count > 0).then(|| (0..count).map(|i| format!("tag{}", i)).collect()),
            ..Default::default()
        }
    }

    fn validate(adapter: &QiitaAdapter, fm: &ContentFrontMatter) -> Validation<Vec<String>> {
        adapter.validate_front_matter(ValidateContext {
            front_matter: fm,
            relative_path: "content/ja/post.md",
            existing_entry: None,
            mode: PublishMode::Draft,
        })
    }

    #[test]
    fn test_tag_bounds() {
        let adapter = adapter("http://localhost");

        assert!(matches!(validate(&adapter, &with_tags(1)), Validation::Valid(tags) if tags.len() == 1));
        assert!(matches!(validate(&adapter, &with_tags(5)), Validation::Valid(tags) if tags.len() == 5));

        match validate(&adapter, &with_tags(6)) {
            Validation::Rejected(rejection) => {
                assert_eq!(
                    rejection.message.as_deref(),
                    Some("Error: content/ja/post.md - Qiita requires between 1 and 5 tags; found 6. Update the front matter and try again.")
                );
                assert!(rejection.set_exit_code);
            }
            other => panic!("expected rejection, got {:?}", other),
        }

        assert!(matches!(
            validate(&adapter, &with_tags(0)),
            Validation::Rejected(_)
        ));
    }

    #[test]
    fn test_payload_shape() {
        let adapter = adapter("http://localhost");
        let fm = ContentFrontMatter {
            qiita_org: Some("  my-team ".to_string()),
            ..with_tags(2)
        };
        let tags = vec!["rust".to_string(), "tokio".to_string()];
        let payload = adapter.prepare_payload(PayloadContext {
            front_matter: &fm,
            body: "本文",
            mode: PublishMode::Draft,
            existing_entry: None,
            sanitized: &tags,
        });

        assert_eq!(
            serde_json::to_value(payload).unwrap(),
            serde_json::json!({
                "title": "Qiita post",
                "body": "本文",
                "tags": [
                    {"name": "rust", "versions": []},
                    {"name": "tokio", "versions": []}
                ],
                "private": true,
                "coediting": false,
                "group_url_name": "my-team",
                "tweet": false
            })
        );
    }

    #[tokio::test]
    async fn test_create_then_update() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/items"))
            .and(header("Authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "id": "c0ffee",
                "url": "https://qiita.com/me/items/c0ffee",
                "private": true
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("PATCH"))
            .and(path("/items/c0ffee"))
            .and(body_json(serde_json::json!({
                "title": "Qiita post",
                "body": "body",
                "tags": [{"name": "rust", "versions": []}],
                "private": false,
                "coediting": false,
                "tweet": false
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "c0ffee",
                "url": "https://qiita.com/me/items/c0ffee",
                "updated_at": "2024-05-05T10:00:00+09:00",
                "private": false
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let adapter = adapter(&mock_server.uri());
        let fm = with_tags(1);
        let tags = vec!["rust".to_string()];

        let draft = adapter.prepare_payload(PayloadContext {
            front_matter: &fm,
            body: "body",
            mode: PublishMode::Draft,
            existing_entry: None,
            sanitized: &tags,
        });
        let created = adapter
            .perform_request(RequestContext {
                payload: &draft,
                existing_entry: None,
                mode: PublishMode::Draft,
                sanitized: &tags,
            })
            .await
            .unwrap();
        let created = adapter.synchronize_post_map_entry(SyncContext {
            front_matter: &fm,
            existing_entry: None,
            mode: PublishMode::Draft,
            response: created,
            relative_path: "content/ja/post.md",
            sanitized: &tags,
        });

        assert_eq!(created.message, "Created Qiita draft: Qiita post");
        assert_eq!(created.entry.id, RemoteId::Text("c0ffee".to_string()));
        assert_eq!(
            created.entry.updated_at.as_deref(),
            Some("2024-06-01T12:00:00Z")
        );

        let publish = adapter.prepare_payload(PayloadContext {
            front_matter: &fm,
            body: "body",
            mode: PublishMode::Publish,
            existing_entry: Some(&created.entry),
            sanitized: &tags,
        });
        let updated = adapter
            .perform_request(RequestContext {
                payload: &publish,
                existing_entry: Some(&created.entry),
                mode: PublishMode::Publish,
                sanitized: &tags,
            })
            .await
            .unwrap();
        let updated = adapter.synchronize_post_map_entry(SyncContext {
            front_matter: &fm,
            existing_entry: Some(&created.entry),
            mode: PublishMode::Publish,
            response: updated,
            relative_path: "content/ja/post.md",
            sanitized: &tags,
        });

        assert_eq!(updated.message, "Updated Qiita article: Qiita post");
        assert!(updated.entry.is_published());
        assert_eq!(
            updated.entry.updated_at.as_deref(),
            Some("2024-05-05T10:00:00+09:00")
        );
    }

    #[tokio::test]
    async fn test_fetch_article_maps_private_flag() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/items/abc"))
            .and(header("Authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "abc",
                "title": "Remote",
                "body": "text",
                "private": true
            })))
            .mount(&mock_server)
            .await;

        let adapter = adapter(&mock_server.uri());
        let article = adapter
            .fetch_article(&RemoteId::Text("abc".to_string()))
            .await
            .unwrap();

        assert_eq!(article.title, "Remote");
        assert!(!article.published);
        assert_eq!(article.published_at, None);
    }

    #[tokio::test]
    async fn test_server_error_is_not_a_404() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/items/abc"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&mock_server)
            .await;

        let adapter = adapter(&mock_server.uri());
        let error = adapter
            .fetch_article(&RemoteId::Text("abc".to_string()))
            .await
            .unwrap_err();

        assert_eq!(error.status(), Some(500));
        assert!(!error.is_not_found());
        assert_eq!(
            error.to_string(),
            "Qiita API request failed (500 Internal Server Error): boom"
        );
    }
}
