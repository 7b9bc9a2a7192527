//! HTTP-level tests for the news poller, with a canned article feed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::bail;
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

use incident_common::{Backends, MemoryPublisher, MemoryStore};
use news_ingestor::newsapi::Article;
use news_ingestor::{build_router, ArticleFeed, AppState, NewsConfig};

struct CannedFeed {
    articles: Vec<Article>,
    failing: AtomicBool,
}

#[async_trait]
impl ArticleFeed for CannedFeed {
    async fn fetch_since(&self, _since: DateTime<Utc>) -> anyhow::Result<Vec<Article>> {
        if self.failing.load(Ordering::SeqCst) {
            bail!("NewsAPI rejected the request (429 rateLimited)");
        }
        Ok(self.articles.clone())
    }
}

struct Harness {
    app: Router,
    publisher: Arc<MemoryPublisher>,
    feed: Arc<CannedFeed>,
    news: Arc<NewsConfig>,
}

fn harness_with(articles: Vec<Value>, api_key: bool) -> Harness {
    let publisher = Arc::new(MemoryPublisher::new());
    let feed = Arc::new(CannedFeed {
        articles: articles
            .into_iter()
            .map(|a| serde_json::from_value(a).unwrap())
            .collect(),
        failing: AtomicBool::new(false),
    });
    let news = Arc::new(NewsConfig::with_key("test-key"));
    let state = AppState {
        backends: Backends {
            store: Arc::new(MemoryStore::new()),
            publisher: publisher.clone(),
        },
        feed: api_key.then(|| feed.clone() as Arc<dyn ArticleFeed>),
        news: news.clone(),
    };
    Harness {
        app: build_router(state),
        publisher,
        feed,
        news,
    }
}

fn two_articles() -> Vec<Value> {
    vec![
        json!({
            "source": {"id": null, "name": "DT Next"},
            "author": "Reporter",
            "title": "Tree falls on Mount Road",
            "description": "Traffic diverted",
            "url": "https://news.example/tree",
            "publishedAt": "2026-10-18T08:00:00Z",
            "content": "..."
        }),
        json!({
            "source": {"id": null, "name": "The Hindu"},
            "title": "Pothole complaints rise",
            "url": "https://news.example/pothole",
            "publishedAt": "2026-10-18T08:10:00Z"
        }),
    ]
}

async fn trigger(app: Router) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().method("POST").uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn publishes_each_article_to_raw_news_topic() {
    let h = harness_with(two_articles(), true);
    let (status, body) = trigger(h.app).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("Successfully published 2 articles"));
    assert_eq!(body["published"], json!(2));

    let messages = h.publisher.messages(&h.news.raw_news_topic).await;
    assert_eq!(messages.len(), 2);
    let first = messages[0].json();
    assert_eq!(first["title"], json!("Tree falls on Mount Road"));
    assert_eq!(first["source_name"], json!("DT Next"));
    assert_eq!(first["query_keywords"], json!(h.news.search_query));
    assert!(first["ingestedAt"].is_string());
}

#[tokio::test]
async fn articles_without_title_or_url_are_skipped() {
    let mut articles = two_articles();
    articles.push(json!({"title": "No link"}));
    articles.push(json!({"url": "https://news.example/untitled", "title": null}));
    let h = harness_with(articles, true);

    let (status, body) = trigger(h.app).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["published"], json!(2));
    assert_eq!(body["skipped"], json!(2));
    assert_eq!(h.publisher.total().await, 2);
}

#[tokio::test]
async fn empty_feed_reports_no_new_articles() {
    let h = harness_with(vec![], true);
    let (status, body) = trigger(h.app).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("No new articles"));
    assert_eq!(h.publisher.total().await, 0);
}

#[tokio::test]
async fn missing_api_key_fails_without_publishing() {
    let h = harness_with(two_articles(), false);
    let (status, body) = trigger(h.app).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("NEWS_API_KEY"));
    assert_eq!(h.publisher.total().await, 0);
}

#[tokio::test]
async fn feed_failure_returns_500() {
    let h = harness_with(two_articles(), true);
    h.feed.failing.store(true, Ordering::SeqCst);
    let (status, body) = trigger(h.app).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("Failed to fetch news"));
    assert_eq!(h.publisher.total().await, 0);
}

#[tokio::test]
async fn publish_failure_returns_500() {
    let h = harness_with(two_articles(), true);
    h.publisher.set_failing(true);
    let (status, _) = trigger(h.app).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(h.publisher.total().await, 0);
}
