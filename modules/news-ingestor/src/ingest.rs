use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::{Duration, SecondsFormat, Utc};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use incident_common::PipelineError;

use crate::post::news_post;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct NewsRunResponse {
    pub status: String,
    pub published: usize,
    pub skipped: usize,
}

pub async fn api_ingest_news(State(state): State<AppState>) -> Response {
    match ingest_news(&state).await {
        Ok(resp) => (StatusCode::OK, Json(resp)).into_response(),
        Err(e) => {
            e.log("news");
            e.into_json_response()
        }
    }
}

/// One poll: fetch articles from the last interval and publish each usable one.
///
/// Articles without a title or URL are skipped. A publish failure aborts the
/// run with 500; articles already published stay published.
pub async fn ingest_news(state: &AppState) -> Result<NewsRunResponse, PipelineError> {
    let feed = state
        .feed
        .as_ref()
        .ok_or_else(|| PipelineError::Dependency("NEWS_API_KEY is not configured".to_string()))?;

    let since = Utc::now() - Duration::minutes(state.news.fetch_interval_minutes);
    info!(
        query = %state.news.search_query,
        since = %since.to_rfc3339_opts(SecondsFormat::Secs, true),
        "Fetching news"
    );

    let articles = feed
        .fetch_since(since)
        .await
        .map_err(|e| PipelineError::dependency("Failed to fetch news", format!("{e:#}")))?;

    if articles.is_empty() {
        info!(query = %state.news.search_query, "No new articles");
        return Ok(NewsRunResponse {
            status: "No new articles".to_string(),
            published: 0,
            skipped: 0,
        });
    }

    let topic = &state.news.raw_news_topic;
    let ingested_at = Utc::now();
    let mut published = 0;
    let mut skipped = 0;

    for article in &articles {
        let Some(post) = news_post(article, &state.news.search_query, ingested_at) else {
            warn!(url = ?article.url, title = ?article.title, "Skipping article without title or url");
            skipped += 1;
            continue;
        };

        let data = serde_json::to_vec(&post)
            .map_err(|e| PipelineError::dependency("Failed to encode news post", e))?;

        let message_id = state
            .backends
            .publisher
            .publish(topic, data)
            .await
            .map_err(|e| {
                error!(published, topic = %topic, "News run aborted mid-batch");
                PipelineError::dependency("Failed to publish news post", format!("{e:#}"))
            })?;

        debug!(message_id = %message_id, url = ?article.url, "Article published");
        published += 1;
    }

    info!(published, skipped, topic = %topic, "News run complete");
    Ok(NewsRunResponse {
        status: format!("Successfully published {published} articles"),
        published,
        skipped,
    })
}
