use anyhow::{bail, Context, Result};

pub const DEFAULT_SEARCH_QUERY: &str =
    "Chennai (traffic OR accident OR crime OR pothole OR flood OR pollution OR infrastructure)";

/// NewsAPI caps `pageSize` at 100.
const MAX_PAGE_SIZE: u32 = 100;

/// News-poller settings. Store and queue settings come from the shared `Config`.
#[derive(Debug, Clone)]
pub struct NewsConfig {
    /// Runs fail with 500 until this is set.
    pub api_key: Option<String>,
    pub api_base_url: String,
    pub raw_news_topic: String,
    pub search_query: String,
    pub language: String,
    pub sort_by: String,
    pub fetch_interval_minutes: i64,
    pub max_articles_per_run: u32,
}

impl NewsConfig {
    pub fn from_env() -> Result<Self> {
        let config = Self::from_lookup(|key| std::env::var(key).ok())?;
        config.log_summary();
        Ok(config)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let get_or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let fetch_interval_minutes: i64 = match get("FETCH_INTERVAL_MINUTES") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("FETCH_INTERVAL_MINUTES must be a number, got {raw:?}"))?,
            None => 60,
        };
        if fetch_interval_minutes <= 0 {
            bail!("FETCH_INTERVAL_MINUTES must be positive, got {fetch_interval_minutes}");
        }

        let max_articles_per_run: u32 = match get("MAX_ARTICLES_PER_RUN") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("MAX_ARTICLES_PER_RUN must be a number, got {raw:?}"))?,
            None => 50,
        };
        if !(1..=MAX_PAGE_SIZE).contains(&max_articles_per_run) {
            bail!("MAX_ARTICLES_PER_RUN must be between 1 and {MAX_PAGE_SIZE}, got {max_articles_per_run}");
        }

        Ok(Self {
            api_key: get("NEWS_API_KEY"),
            api_base_url: get_or("NEWS_API_BASE_URL", "https://newsapi.org"),
            raw_news_topic: get_or("RAW_NEWS_TOPIC_NAME", "raw-news-posts"),
            search_query: get_or("DEFAULT_SEARCH_QUERY", DEFAULT_SEARCH_QUERY),
            language: get_or("DEFAULT_LANGUAGE", "en"),
            sort_by: get_or("DEFAULT_SORT_BY", "relevancy"),
            fetch_interval_minutes,
            max_articles_per_run,
        })
    }

    fn log_summary(&self) {
        tracing::info!("News config loaded:");
        tracing::info!(
            "  NEWS_API_KEY: {}",
            if self.api_key.is_some() { "<set>" } else { "<not set>" }
        );
        tracing::info!("  RAW_NEWS_TOPIC_NAME: {}", self.raw_news_topic);
        tracing::info!("  DEFAULT_SEARCH_QUERY: {}", self.search_query);
        tracing::info!("  FETCH_INTERVAL_MINUTES: {}", self.fetch_interval_minutes);
        tracing::info!("  MAX_ARTICLES_PER_RUN: {}", self.max_articles_per_run);
    }

    /// Defaults with a placeholder key, for tests and local runs.
    pub fn with_key(api_key: &str) -> Self {
        Self {
            api_key: Some(api_key.to_string()),
            api_base_url: "https://newsapi.org".to_string(),
            raw_news_topic: "raw-news-posts".to_string(),
            search_query: DEFAULT_SEARCH_QUERY.to_string(),
            language: "en".to_string(),
            sort_by: "relevancy".to_string(),
            fetch_interval_minutes: 60,
            max_articles_per_run: 50,
        }
    }
}
