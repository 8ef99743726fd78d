use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DashResult, DashboardError};
use crate::model::EventDocument;

mod http;

pub use http::HttpIndexApi;

/// Reachability of the backend as seen by `/health`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Health {
    Reachable,
    Degraded,
    Unreachable,
}

/// Inbox counters from `/status`; absent counters read as 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboxStatus {
    #[serde(default)]
    pub processed: u64,
    #[serde(default)]
    pub invalid: u64,
    #[serde(default)]
    pub queued: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReceipt {
    pub name: Option<String>,
    pub path: Option<String>,
}

/// An AOI file ready for multipart upload.
#[derive(Debug, Clone)]
pub struct AoiUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Backend contract. `HttpIndexApi` talks to the real server.
#[async_trait]
pub trait IndexApi: Send + Sync {
    async fn health(&self) -> Health;
    async fn status(&self) -> DashResult<InboxStatus>;
    async fn get_iasi(&self, name: &str) -> DashResult<Value>;
    async fn upload_iasi(&self, doc: &EventDocument) -> DashResult<PublishReceipt>;
    async fn upload_aoi(&self, upload: AoiUpload, name: &str) -> DashResult<PublishReceipt>;
    async fn list_indices(&self) -> DashResult<Vec<String>>;
}

/// Common `{ok, error?, ...}` envelope returned by every endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub indices: Option<Vec<String>>,
    #[serde(default)]
    pub status: Option<Value>,
}

impl Envelope {
    /// `ok:false` becomes `Api` with the server's message or the HTTP reason.
    pub fn into_ok(self, fallback_reason: &str) -> DashResult<Self> {
        if self.ok {
            Ok(self)
        } else {
            Err(DashboardError::Api(
                self.error.unwrap_or_else(|| fallback_reason.to_string()),
            ))
        }
    }
}
