use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::error::{check_status, GcpError, Result, Service};

const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// Tokens are refreshed this long before the metadata server says they expire.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Where outbound requests get their bearer token from.
pub enum TokenSource {
    /// Emulators accept unauthenticated requests.
    Anonymous,
    /// A fixed token, e.g. from `gcloud auth print-access-token`.
    Static(String),
    /// The platform metadata server, cached until shortly before expiry.
    Metadata(MetadataTokenSource),
}

impl TokenSource {
    pub fn metadata(http: reqwest::Client) -> Self {
        TokenSource::Metadata(MetadataTokenSource::new(http, METADATA_TOKEN_URL.to_string()))
    }

    /// Returns `None` when requests should go out without an Authorization header.
    pub async fn token(&self) -> Result<Option<String>> {
        match self {
            TokenSource::Anonymous => Ok(None),
            TokenSource::Static(token) => Ok(Some(token.clone())),
            TokenSource::Metadata(source) => source.token().await.map(Some),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MetadataTokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_MARGIN_SECS) < self.expires_at
    }
}

pub struct MetadataTokenSource {
    http: reqwest::Client,
    url: String,
    cached: Mutex<Option<CachedToken>>,
}

impl MetadataTokenSource {
    pub fn new(http: reqwest::Client, url: String) -> Self {
        Self {
            http,
            url,
            cached: Mutex::new(None),
        }
    }

    pub async fn token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;
        let now = Utc::now();
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(now)) {
            return Ok(token.token.clone());
        }

        let resp = self
            .http
            .get(&self.url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| GcpError::Auth(format!("metadata server unreachable: {e}")))?;

        let resp = check_status(Service::Metadata, resp).await?;

        let body: MetadataTokenResponse = resp.json().await?;
        tracing::debug!(expires_in = body.expires_in, "Fetched access token from metadata server");

        let fresh = CachedToken {
            token: body.access_token,
            expires_at: now + Duration::seconds(body.expires_in),
        };
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(token)
    }
}
