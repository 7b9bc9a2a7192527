use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::config::NewsConfig;
use crate::newsapi::{Article, EverythingQuery, NewsApiClient};

/// Source of candidate articles for one poll.
#[async_trait]
pub trait ArticleFeed: Send + Sync {
    async fn fetch_since(&self, since: DateTime<Utc>) -> Result<Vec<Article>>;
}

/// `ArticleFeed` backed by NewsAPI search with the configured query.
pub struct NewsApiFeed {
    client: NewsApiClient,
    config: Arc<NewsConfig>,
}

impl NewsApiFeed {
    pub fn new(client: NewsApiClient, config: Arc<NewsConfig>) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl ArticleFeed for NewsApiFeed {
    async fn fetch_since(&self, since: DateTime<Utc>) -> Result<Vec<Article>> {
        let query = EverythingQuery {
            q: &self.config.search_query,
            language: &self.config.language,
            sort_by: &self.config.sort_by,
            from: since,
            page_size: self.config.max_articles_per_run,
        };
        Ok(self.client.everything(&query).await?)
    }
}

/// `None` when no API key is configured.
pub fn from_config(config: &Arc<NewsConfig>) -> Result<Option<Arc<dyn ArticleFeed>>> {
    let Some(api_key) = config.api_key.clone() else {
        tracing::warn!("NEWS_API_KEY is not set; news runs will fail until it is configured");
        return Ok(None);
    };

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()?;
    let client = NewsApiClient::new(http, api_key).with_base_url(config.api_base_url.clone());

    Ok(Some(Arc::new(NewsApiFeed::new(client, config.clone()))))
}
