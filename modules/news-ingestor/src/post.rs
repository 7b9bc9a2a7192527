use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Value};

use crate::newsapi::Article;

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// The queue payload for one article, or `None` when it lacks a title or URL.
///
/// Keys match what downstream news consumers already read, `source_name` and
/// `query_keywords` included.
pub fn news_post(article: &Article, query: &str, ingested_at: DateTime<Utc>) -> Option<Value> {
    let title = non_blank(&article.title)?;
    let url = non_blank(&article.url)?;

    Some(json!({
        "title": title,
        "description": article.description,
        "url": url,
        "publishedAt": article.published_at,
        "source_name": article.source.as_ref().and_then(|s| s.name.as_deref()),
        "author": article.author,
        "content": article.content,
        "query_keywords": query,
        "ingestedAt": ingested_at.to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
}
