use std::collections::BTreeMap;
use std::sync::Arc;

use crate::auth::TokenSource;
use crate::error::{check_status, Result, Service};
use crate::types::{
    CommitRequest, CommitResponse, Document, FieldTransform, Precondition, ServerValue, Value,
    Write,
};

const FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com";
const DEFAULT_DATABASE: &str = "(default)";

pub struct FirestoreClient {
    client: reqwest::Client,
    base_url: String,
    project_id: String,
    database: String,
    tokens: Arc<TokenSource>,
}

impl FirestoreClient {
    pub fn new(client: reqwest::Client, project_id: String, tokens: Arc<TokenSource>) -> Self {
        Self {
            client,
            base_url: FIRESTORE_BASE_URL.to_string(),
            project_id,
            database: DEFAULT_DATABASE.to_string(),
            tokens,
        }
    }

    /// Point the client at an emulator or proxy, e.g. `http://localhost:8081`.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn document_name(&self, collection: &str, document_id: &str) -> String {
        format!(
            "projects/{}/databases/{}/documents/{}/{}",
            self.project_id, self.database, collection, document_id
        )
    }

    fn commit_url(&self) -> String {
        format!(
            "{}/v1/projects/{}/databases/{}/documents:commit",
            self.base_url, self.project_id, self.database
        )
    }

    /// Create a new document in a single commit. Fails if the id is already taken.
    ///
    /// Every name in `server_timestamps` is set to the commit time by the server.
    pub async fn create_document(
        &self,
        collection: &str,
        document_id: &str,
        fields: BTreeMap<String, Value>,
        server_timestamps: &[String],
    ) -> Result<CommitResponse> {
        let write = Write {
            update: Document {
                name: self.document_name(collection, document_id),
                fields,
            },
            update_transforms: server_timestamps
                .iter()
                .map(|field| FieldTransform {
                    field_path: quote_field_path(field),
                    set_to_server_value: ServerValue::RequestTime,
                })
                .collect(),
            current_document: Some(Precondition { exists: false }),
        };
        let body = CommitRequest {
            writes: vec![write],
        };

        let mut req = self.client.post(self.commit_url()).json(&body);
        if let Some(token) = self.tokens.token().await? {
            req = req.bearer_auth(token);
        }
        let resp = check_status(Service::Firestore, req.send().await?).await?;

        let commit: CommitResponse = resp.json().await?;
        tracing::debug!(collection, document_id, commit_time = ?commit.commit_time, "Document committed");
        Ok(commit)
    }
}

/// Field paths must be backtick-quoted unless they are simple identifiers.
pub fn quote_field_path(name: &str) -> String {
    let mut chars = name.chars();
    let simple = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if simple {
        name.to_string()
    } else {
        let escaped = name.replace('\\', "\\\\").replace('`', "\\`");
        format!("`{escaped}`")
    }
}
