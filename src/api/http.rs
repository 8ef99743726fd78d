use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use url::Url;

use super::{AoiUpload, Envelope, Health, IndexApi, InboxStatus, PublishReceipt};
use crate::error::{DashResult, DashboardError};
use crate::logging::{log, obj, v_str, Domain, Level};
use crate::model::EventDocument;
use crate::state::Config;

pub struct HttpIndexApi {
    client: Client,
    base: Url,
    token: Option<String>,
}

impl HttpIndexApi {
    pub fn new(cfg: &Config) -> DashResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.http_timeout_secs))
            .build()
            .map_err(|e| DashboardError::Network(format!("cannot build http client: {}", e)))?;
        Self::with_client(client, &cfg.server_base, cfg.api_token.clone())
    }

    pub fn with_client(client: Client, base: &str, token: Option<String>) -> DashResult<Self> {
        Ok(Self {
            client,
            base: Url::parse(base)?,
            token: token.filter(|t| !t.trim().is_empty()),
        })
    }

    /// Shared client, reused for static http fallbacks.
    pub fn client(&self) -> Client {
        self.client.clone()
    }

    /// Base URL plus path segments; each segment is percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> DashResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| DashboardError::Network(format!("base url cannot be a base: {}", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authed(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token.trim()),
            None => req,
        }
    }

    async fn envelope(&self, route: &str, resp: Response) -> DashResult<Envelope> {
        let status = resp.status();
        let text = resp.text().await?;
        log(
            Level::Debug,
            Domain::Server,
            "response",
            obj(&[("route", v_str(route)), ("status", serde_json::json!(status.as_u16()))]),
        );
        match serde_json::from_str::<Envelope>(&text) {
            Ok(env) => env.into_ok(status.canonical_reason().unwrap_or("request failed")),
            Err(err) if status.is_success() => Err(DashboardError::Parse(err.to_string())),
            Err(_) => Err(DashboardError::Network(format!("HTTP {} on {}", status.as_u16(), route))),
        }
    }
}

#[async_trait]
impl IndexApi for HttpIndexApi {
    async fn health(&self) -> Health {
        let Ok(url) = self.endpoint(&["health"]) else {
            return Health::Unreachable;
        };
        match self.client.get(url).send().await {
            Ok(resp) if resp.status().is_success() => Health::Reachable,
            Ok(_) => Health::Degraded,
            Err(_) => Health::Unreachable,
        }
    }

    async fn status(&self) -> DashResult<InboxStatus> {
        let url = self.endpoint(&["status"])?;
        let resp = self.authed(self.client.get(url)).send().await?;
        let env = self.envelope("/status", resp).await?;
        Ok(match env.status {
            Some(v @ Value::Object(_)) => serde_json::from_value(v).unwrap_or_default(),
            _ => InboxStatus::default(),
        })
    }

    async fn get_iasi(&self, name: &str) -> DashResult<Value> {
        let url = self.endpoint(&["get_iasi", name])?;
        let resp = self.authed(self.client.get(url)).send().await?;
        let env = self.envelope("/get_iasi", resp).await?;
        match env.data {
            Some(Value::Null) | None => Err(DashboardError::schema("get_iasi response", &["data"])),
            Some(data) => Ok(data),
        }
    }

    async fn upload_iasi(&self, doc: &EventDocument) -> DashResult<PublishReceipt> {
        let url = self.endpoint(&["upload_iasi"])?;
        let resp = self.authed(self.client.post(url).json(doc)).send().await?;
        let env = self.envelope("/upload_iasi", resp).await?;
        Ok(PublishReceipt { name: env.name, path: env.path })
    }

    async fn upload_aoi(&self, upload: AoiUpload, name: &str) -> DashResult<PublishReceipt> {
        let url = self.endpoint(&["upload_aoi"])?;
        let part = Part::bytes(upload.bytes).file_name(upload.file_name);
        let form = Form::new().part("aoi", part).text("name", name.to_string());
        let resp = self.authed(self.client.post(url).multipart(form)).send().await?;
        let env = self.envelope("/upload_aoi", resp).await?;
        Ok(PublishReceipt { name: env.name, path: env.path })
    }

    async fn list_indices(&self) -> DashResult<Vec<String>> {
        let url = self.endpoint(&["list_indices"])?;
        let resp = self.authed(self.client.get(url)).send().await?;
        let env = self.envelope("/list_indices", resp).await?;
        Ok(env.indices.unwrap_or_default())
    }
}
