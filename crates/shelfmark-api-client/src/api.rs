//! Record operations for the Zotero API client.
//!
//! Item creation is shared by the record layer and the attachment register
//! step; the write-response envelope is parsed here for both.

use crate::{error_text, ApiClient};
use serde::Deserialize;
use serde_json::Value;
use shelfmark_core::{Collection, ItemDraft, ItemType, RecordError};
use std::collections::BTreeMap;

const COLLECTIONS_PAGE_SIZE: usize = 100;

/// Envelope returned by `POST /items`.
#[derive(Debug, Default, Deserialize)]
pub struct WriteResponse {
    #[serde(default)]
    pub successful: BTreeMap<String, WrittenItem>,
    #[serde(default)]
    pub success: BTreeMap<String, String>,
    #[serde(default)]
    pub failed: BTreeMap<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct WrittenItem {
    pub key: String,
}

impl WriteResponse {
    /// Key of the single item written, or the remote failure text verbatim.
    pub fn single_key(self) -> Result<String, String> {
        if !self.failed.is_empty() {
            return Err(serde_json::to_string(&self.failed)
                .unwrap_or_else(|_| format!("{:?}", self.failed)));
        }
        self.successful
            .get("0")
            .or_else(|| self.successful.values().next())
            .map(|item| item.key.clone())
            .or_else(|| {
                self.success
                    .get("0")
                    .or_else(|| self.success.values().next())
                    .cloned()
            })
            .ok_or_else(|| "Response contained no created item".to_string())
    }
}

/// Why a single-item write did not produce a key.
#[derive(Debug)]
pub(crate) enum WriteFailure {
    Transport(String),
    Rejected(String),
}

#[derive(Debug, Deserialize)]
struct CollectionEnvelope {
    key: String,
    data: CollectionData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CollectionData {
    name: String,
    /// `false` for top-level collections, otherwise the parent key.
    #[serde(default)]
    parent_collection: Value,
}

impl From<CollectionEnvelope> for Collection {
    fn from(envelope: CollectionEnvelope) -> Self {
        Collection {
            key: envelope.key,
            name: envelope.data.name,
            parent: envelope
                .data
                .parent_collection
                .as_str()
                .map(|s| s.to_string()),
        }
    }
}

impl ApiClient {
    /// POST a one-element item array and return the created key.
    pub(crate) async fn write_single_item(&self, template: &Value) -> Result<String, WriteFailure> {
        let url = self.build_url("/items");
        let request = self
            .apply_auth(self.client().post(&url))
            .json(&[template]);

        let response = request
            .send()
            .await
            .map_err(|e| WriteFailure::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = error_text(response).await;
            return Err(WriteFailure::Rejected(format!(
                "API request failed with status {}: {}",
                status, text
            )));
        }

        let body: WriteResponse = response
            .json()
            .await
            .map_err(|e| WriteFailure::Rejected(format!("Unexpected response body: {}", e)))?;

        body.single_key().map_err(WriteFailure::Rejected)
    }

    /// Create a bibliographic record and return its key.
    pub async fn create_metadata_record(
        &self,
        item_type: ItemType,
        draft: &ItemDraft,
    ) -> Result<String, RecordError> {
        let template = draft.to_template(item_type)?;

        let key = self
            .write_single_item(&template)
            .await
            .map_err(|failure| match failure {
                WriteFailure::Transport(e) => RecordError::Transport(e),
                WriteFailure::Rejected(e) => RecordError::RemoteRejected(e),
            })?;

        tracing::info!(item_key = %key, item_type = %item_type, "Created Zotero item");
        Ok(key)
    }

    /// List every collection in the library.
    pub async fn list_collections(&self) -> Result<Vec<Collection>, RecordError> {
        let url = self.build_url("/collections");
        let mut collections = Vec::new();
        let mut start = 0usize;

        loop {
            let request = self.apply_auth(self.client().get(&url)).query(&[
                ("limit", COLLECTIONS_PAGE_SIZE.to_string()),
                ("start", start.to_string()),
            ]);

            let response = request
                .send()
                .await
                .map_err(|e| RecordError::Transport(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                let text = error_text(response).await;
                return Err(RecordError::RemoteRejected(format!(
                    "API request failed with status {}: {}",
                    status, text
                )));
            }

            let page: Vec<CollectionEnvelope> = response
                .json()
                .await
                .map_err(|e| RecordError::RemoteRejected(format!("Unexpected response body: {}", e)))?;

            let page_len = page.len();
            collections.extend(page.into_iter().map(Collection::from));

            if page_len < COLLECTIONS_PAGE_SIZE {
                break;
            }
            start += page_len;
        }

        tracing::debug!(count = collections.len(), "Listed Zotero collections");
        Ok(collections)
    }
}
