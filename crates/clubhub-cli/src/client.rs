//! Async HTTP client wrapping the clubhub JSON API.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use clubhub_core::{
  comment::{Comment, CommentPage, CommentSort},
  content::{ContentItem, ContentKind, ContentRef},
  engagement::{
    DownloadOutcome, EngagementSnapshot, LikeOutcome, SaveOutcome, SavedContent, SavedItem,
    ShareOutcome, ViewOutcome,
  },
};
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use uuid::Uuid;

/// Connection settings for the clubhub API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  /// Bearer token; anonymous requests when `None`.
  pub token:    Option<String>,
}

/// Async HTTP client for the clubhub JSON REST API.
///
/// Built once with its credentials; every request carries them. Cheap to
/// clone, the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

#[derive(Deserialize)]
struct ErrorBody {
  error: String,
}

#[derive(Deserialize)]
struct Wrapped<T> {
  content: T,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CommentBody<'a> {
  content:   &'a str,
  #[serde(skip_serializing_if = "Option::is_none")]
  parent_id: Option<Uuid>,
}

/// Turn a response into `T`, or into an error carrying the server's message.
async fn expect_json<T: DeserializeOwned>(resp: Response, what: &str) -> Result<T> {
  let status = resp.status();
  if !status.is_success() {
    let message = match resp.json::<ErrorBody>().await {
      Ok(body) => body.error,
      Err(_) => status.canonical_reason().unwrap_or("request failed").to_owned(),
    };
    return Err(anyhow!("{what} → {}: {message}", status.as_u16()));
  }
  resp.json().await.with_context(|| format!("deserialising {what}"))
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}/api{}", self.config.base_url.trim_end_matches('/'), path)
  }

  fn auth(&self, req: RequestBuilder) -> RequestBuilder {
    match &self.config.token {
      Some(token) => req.bearer_auth(token),
      None => req,
    }
  }

  async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
    let resp = self
      .auth(self.client.get(self.url(path)))
      .send()
      .await
      .with_context(|| format!("GET {path} failed"))?;
    expect_json(resp, &format!("GET {path}")).await
  }

  async fn post<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
    let resp = self
      .auth(self.client.post(self.url(path)))
      .send()
      .await
      .with_context(|| format!("POST {path} failed"))?;
    expect_json(resp, &format!("POST {path}")).await
  }

  // ── Engagement ────────────────────────────────────────────────────────────

  /// `GET /api/engagement/{type}/{id}`
  pub async fn snapshot(&self, item: ContentRef) -> Result<EngagementSnapshot> {
    self.get(&engagement_path(item, "")).await
  }

  /// `POST /api/engagement/{type}/{id}/like`
  pub async fn toggle_like(&self, item: ContentRef) -> Result<LikeOutcome> {
    self.post(&engagement_path(item, "/like")).await
  }

  /// `POST /api/engagement/{type}/{id}/save`
  pub async fn toggle_save(&self, item: ContentRef) -> Result<SaveOutcome> {
    self.post(&engagement_path(item, "/save")).await
  }

  /// `POST /api/engagement/{type}/{id}/share`
  pub async fn record_share(&self, item: ContentRef) -> Result<ShareOutcome> {
    self.post(&engagement_path(item, "/share")).await
  }

  /// `POST /api/resources/{id}/view`
  pub async fn record_view(&self, resource_id: Uuid) -> Result<ViewOutcome> {
    self.post(&format!("/resources/{resource_id}/view")).await
  }

  /// `POST /api/resources/{id}/download`
  pub async fn record_download(&self, resource_id: Uuid) -> Result<DownloadOutcome> {
    self.post(&format!("/resources/{resource_id}/download")).await
  }

  /// `GET /api/engagement/user/saved?limit=n`
  pub async fn saved(&self, limit: u32) -> Result<SavedContent> {
    let wrapped: Wrapped<SavedContent> =
      self.get(&format!("/engagement/user/saved?limit={limit}")).await?;
    Ok(wrapped.content)
  }

  /// `GET /api/engagement/user/saved/{type}?limit=n`
  pub async fn saved_of_kind(&self, kind: ContentKind, limit: u32) -> Result<Vec<SavedItem>> {
    let wrapped: Wrapped<Vec<SavedItem>> =
      self.get(&format!("/engagement/user/saved/{kind}?limit={limit}")).await?;
    Ok(wrapped.content)
  }

  // ── Content ───────────────────────────────────────────────────────────────

  /// `GET /api/content/{type}/{id}`
  pub async fn content(&self, item: ContentRef) -> Result<ContentItem> {
    self.get(&format!("/content/{}/{}", item.content_type, item.content_id)).await
  }

  // ── Comments ──────────────────────────────────────────────────────────────

  /// `GET /api/comments/{type}/{id}?sort&page&limit[&parentId]`
  pub async fn comments(
    &self,
    item: ContentRef,
    sort: CommentSort,
    page: u32,
    limit: u32,
    parent_id: Option<Uuid>,
  ) -> Result<CommentPage> {
    let sort = match sort {
      CommentSort::Newest => "newest",
      CommentSort::Likes => "likes",
    };
    let mut path = format!(
      "/comments/{}/{}?sort={sort}&page={page}&limit={limit}",
      item.content_type, item.content_id
    );
    if let Some(pid) = parent_id {
      path.push_str(&format!("&parentId={pid}"));
    }
    self.get(&path).await
  }

  /// `POST /api/comments/{type}/{id}`
  pub async fn add_comment(
    &self,
    item: ContentRef,
    content: &str,
    parent_id: Option<Uuid>,
  ) -> Result<Comment> {
    let path = format!("/comments/{}/{}", item.content_type, item.content_id);
    let resp = self
      .auth(self.client.post(self.url(&path)))
      .json(&CommentBody { content, parent_id })
      .send()
      .await
      .with_context(|| format!("POST {path} failed"))?;
    expect_json(resp, &format!("POST {path}")).await
  }

  /// `PUT /api/comments/{id}`
  pub async fn edit_comment(&self, id: Uuid, content: &str) -> Result<Comment> {
    let path = format!("/comments/{id}");
    let resp = self
      .auth(self.client.put(self.url(&path)))
      .json(&CommentBody { content, parent_id: None })
      .send()
      .await
      .with_context(|| format!("PUT {path} failed"))?;
    expect_json(resp, &format!("PUT {path}")).await
  }

  /// `DELETE /api/comments/{id}`
  pub async fn delete_comment(&self, id: Uuid) -> Result<()> {
    let path = format!("/comments/{id}");
    let resp = self
      .auth(self.client.delete(self.url(&path)))
      .send()
      .await
      .with_context(|| format!("DELETE {path} failed"))?;
    if !resp.status().is_success() {
      return Err(anyhow!("DELETE {path} → {}", resp.status()));
    }
    Ok(())
  }
}

fn engagement_path(item: ContentRef, suffix: &str) -> String {
  format!("/engagement/{}/{}{suffix}", item.content_type, item.content_id)
}
