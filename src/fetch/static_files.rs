use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use url::Url;

use crate::aoi::GeometrySource;
use crate::error::{DashResult, DashboardError};

/// Where static copies live: a local directory or a web root.
#[derive(Debug, Clone, PartialEq)]
pub enum StaticBase {
    Dir(PathBuf),
    Http(Url),
}

impl StaticBase {
    pub fn parse(raw: &str) -> Self {
        if raw.starts_with("http://") || raw.starts_with("https://") {
            let with_slash = if raw.ends_with('/') { raw.to_string() } else { format!("{}/", raw) };
            if let Ok(url) = Url::parse(&with_slash) {
                return StaticBase::Http(url);
            }
        }
        StaticBase::Dir(PathBuf::from(raw))
    }
}

/// Reads JSON documents relative to the static base.
pub struct StaticFiles {
    base: StaticBase,
    client: Client,
}

impl StaticFiles {
    pub fn new(base: StaticBase, client: Client) -> Self {
        Self { base, client }
    }

    pub fn local(dir: impl Into<PathBuf>) -> Self {
        Self::new(StaticBase::Dir(dir.into()), Client::new())
    }

    pub fn base(&self) -> &StaticBase {
        &self.base
    }

    /// `outputs/indices/{name}/iasi.json`, refusing names that escape the tree.
    pub fn document_path(name: &str) -> DashResult<String> {
        let trimmed = name.trim();
        if trimmed.is_empty() || trimmed.contains('/') || trimmed.contains('\\') || trimmed == ".." || trimmed == "." {
            return Err(DashboardError::Io {
                path: name.to_string(),
                reason: "invalid event name".to_string(),
            });
        }
        Ok(format!("outputs/indices/{}/iasi.json", trimmed))
    }

    /// `path` may be an absolute URL, an absolute file path, or relative to the base.
    pub async fn read_json(&self, path: &str) -> DashResult<Value> {
        if path.starts_with("http://") || path.starts_with("https://") {
            return self.fetch_url(Url::parse(path)?).await;
        }
        let rel = path.trim_start_matches("./");
        match &self.base {
            _ if Path::new(rel).is_absolute() => read_file(Path::new(rel)),
            StaticBase::Dir(dir) => read_file(&dir.join(rel)),
            StaticBase::Http(root) => self.fetch_url(root.join(rel)?).await,
        }
    }

    async fn fetch_url(&self, url: Url) -> DashResult<Value> {
        let resp = self.client.get(url.clone()).send().await?;
        if !resp.status().is_success() {
            return Err(DashboardError::Network(format!("HTTP {} on {}", resp.status().as_u16(), url)));
        }
        Ok(resp.json::<Value>().await?)
    }
}

fn read_file(path: &Path) -> DashResult<Value> {
    let text = std::fs::read_to_string(path).map_err(|e| DashboardError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    Ok(serde_json::from_str(&text)?)
}

#[async_trait]
impl GeometrySource for StaticFiles {
    async fn fetch_geometry(&self, path: &str) -> DashResult<Value> {
        self.read_json(path).await
    }
}
