use anyhow::{bail, Context, Result};

/// Which implementation sits behind the store and queue ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Firestore + Pub/Sub over REST.
    Gcp,
    /// Process-local store and queue, for running a service without cloud access.
    Memory,
}

/// Service configuration loaded from environment variables.
/// Shared by all three services; each reads only the names it needs.
#[derive(Debug, Clone)]
pub struct Config {
    // Web server
    pub host: String,
    pub port: u16,

    // Backends
    pub backend: BackendKind,
    pub project_id: Option<String>,
    pub firestore_emulator_host: Option<String>,
    pub pubsub_emulator_host: Option<String>,
    pub access_token: Option<String>,

    // Topics
    pub raw_reports_topic: String,
    pub processed_events_topic: String,

    // Collections
    pub raw_reports_collection: String,
    pub events_collection: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self::from_lookup(|key| std::env::var(key).ok())?;
        config.log_summary();
        Ok(config)
    }

    /// Build a config from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let get_or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let port = match get("PORT") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("PORT must be a number, got {raw:?}"))?,
            None => 8080,
        };

        let backend = match get_or("PIPELINE_BACKEND", "gcp").to_lowercase().as_str() {
            "gcp" => BackendKind::Gcp,
            "memory" => BackendKind::Memory,
            other => bail!("PIPELINE_BACKEND must be 'gcp' or 'memory', got {other:?}"),
        };

        let project_id = get("GCP_PROJECT_ID");
        if backend == BackendKind::Gcp && project_id.is_none() {
            bail!("GCP_PROJECT_ID environment variable is required for the gcp backend");
        }

        Ok(Self {
            host: get_or("HOST", "0.0.0.0"),
            port,
            backend,
            project_id,
            firestore_emulator_host: get("FIRESTORE_EMULATOR_HOST"),
            pubsub_emulator_host: get("PUBSUB_EMULATOR_HOST"),
            access_token: get("GOOGLE_OAUTH_ACCESS_TOKEN"),
            raw_reports_topic: get_or("RAW_REPORTS_TOPIC_NAME", "raw-reports"),
            processed_events_topic: get_or("PROCESSED_EVENTS_TOPIC_NAME", "processed-events"),
            raw_reports_collection: get_or("RAW_REPORTS_COLLECTION", "UserReports"),
            events_collection: get_or("EVENTS_COLLECTION", "ProcessedEvents"),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn log_summary(&self) {
        fn opt(val: &Option<String>) -> &str {
            val.as_deref().unwrap_or("<not set>")
        }

        tracing::info!("Config loaded:");
        tracing::info!("  backend: {:?}", self.backend);
        tracing::info!("  GCP_PROJECT_ID: {}", opt(&self.project_id));
        tracing::info!("  RAW_REPORTS_TOPIC_NAME: {}", self.raw_reports_topic);
        tracing::info!("  PROCESSED_EVENTS_TOPIC_NAME: {}", self.processed_events_topic);
        tracing::info!("  RAW_REPORTS_COLLECTION: {}", self.raw_reports_collection);
        tracing::info!("  EVENTS_COLLECTION: {}", self.events_collection);
        tracing::info!("  FIRESTORE_EMULATOR_HOST: {}", opt(&self.firestore_emulator_host));
        tracing::info!("  PUBSUB_EMULATOR_HOST: {}", opt(&self.pubsub_emulator_host));
        tracing::info!(
            "  GOOGLE_OAUTH_ACCESS_TOKEN: {}",
            if self.access_token.is_some() { "<set>" } else { "<not set>" }
        );
    }

    /// In-memory config for tests and local runs.
    pub fn for_memory() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            backend: BackendKind::Memory,
            project_id: None,
            firestore_emulator_host: None,
            pubsub_emulator_host: None,
            access_token: None,
            raw_reports_topic: "raw-reports".to_string(),
            processed_events_topic: "processed-events".to_string(),
            raw_reports_collection: "UserReports".to_string(),
            events_collection: "ProcessedEvents".to_string(),
        }
    }
}
