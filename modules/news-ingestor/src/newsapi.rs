//! Minimal client for NewsAPI's `/v2/everything` search.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NewsApiError {
    #[error("NewsAPI request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// NewsAPI reports failures as `{"status": "error", "code", "message"}`.
    #[error("NewsAPI rejected the request ({http_status} {code}): {message}")]
    Rejected {
        http_status: u16,
        code: String,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ArticleSource {
    pub id: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub source: Option<ArticleSource>,
    pub author: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub published_at: Option<String>,
    /// Truncated by NewsAPI on free plans.
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EverythingResponse {
    status: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Clone)]
pub struct EverythingQuery<'a> {
    pub q: &'a str,
    pub language: &'a str,
    pub sort_by: &'a str,
    pub from: DateTime<Utc>,
    pub page_size: u32,
}

pub struct NewsApiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl NewsApiClient {
    pub fn new(client: reqwest::Client, api_key: String) -> Self {
        Self {
            client,
            base_url: "https://newsapi.org".to_string(),
            api_key,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// One page of matching articles published since `query.from`.
    pub async fn everything(&self, query: &EverythingQuery<'_>) -> Result<Vec<Article>, NewsApiError> {
        let from = query.from.to_rfc3339_opts(SecondsFormat::Secs, true);
        let page_size = query.page_size.to_string();

        // Key goes in a header so it never shows up in logged URLs.
        let resp = self
            .client
            .get(format!("{}/v2/everything", self.base_url))
            .header("X-Api-Key", &self.api_key)
            .query(&[
                ("q", query.q),
                ("language", query.language),
                ("sortBy", query.sort_by),
                ("from", from.as_str()),
                ("pageSize", page_size.as_str()),
            ])
            .send()
            .await?;

        let http_status = resp.status();
        let body: EverythingResponse = resp.json().await?;

        if !http_status.is_success() || body.status != "ok" {
            return Err(NewsApiError::Rejected {
                http_status: http_status.as_u16(),
                code: body.code.unwrap_or_else(|| "unknown".to_string()),
                message: body.message.unwrap_or_default(),
            });
        }

        tracing::debug!(count = body.articles.len(), "NewsAPI returned articles");
        Ok(body.articles)
    }
}
