//! Document loading as an ordered chain: Remote, then Static, then Synthetic.
//!
//! Each strategy either yields a document or a failure; a failure moves the
//! chain to the next strategy. The synthetic step cannot fail, so `Fetcher::load`
//! always returns a document.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::api::IndexApi;
use crate::demo;
use crate::error::{DashResult, DashboardError};
use crate::logging::{log_fallback, log_load, ProfileScope, v_str};
use crate::model::EventDocument;
use crate::ui::{HostUi, Notice};

pub mod static_files;

pub use static_files::{StaticBase, StaticFiles};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Remote,
    Static,
    Synthetic,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Remote => "remote",
            SourceKind::Static => "static",
            SourceKind::Synthetic => "synthetic",
        }
    }
}

#[async_trait]
pub trait LoadStrategy: Send + Sync {
    fn kind(&self) -> SourceKind;
    async fn load(&self, name: &str) -> DashResult<EventDocument>;
}

/// `GET /get_iasi/{name}`; needs `ok` and a `data` payload.
pub struct RemoteStrategy {
    api: Arc<dyn IndexApi>,
}

impl RemoteStrategy {
    pub fn new(api: Arc<dyn IndexApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl LoadStrategy for RemoteStrategy {
    fn kind(&self) -> SourceKind {
        SourceKind::Remote
    }

    async fn load(&self, name: &str) -> DashResult<EventDocument> {
        let data = self.api.get_iasi(name).await?;
        Ok(serde_json::from_value(data)?)
    }
}

/// `{base}/outputs/indices/{name}/iasi.json` with the required keys present.
pub struct StaticStrategy {
    files: Arc<StaticFiles>,
}

impl StaticStrategy {
    pub fn new(files: Arc<StaticFiles>) -> Self {
        Self { files }
    }
}

#[async_trait]
impl LoadStrategy for StaticStrategy {
    fn kind(&self) -> SourceKind {
        SourceKind::Static
    }

    async fn load(&self, name: &str) -> DashResult<EventDocument> {
        let path = StaticFiles::document_path(name)?;
        let value = self.files.read_json(&path).await?;
        EventDocument::from_value_checked(value, "iasi.json")
    }
}

type Synthesizer = Box<dyn Fn(&str) -> EventDocument + Send + Sync>;

#[derive(Debug, Clone)]
pub struct Loaded {
    pub document: EventDocument,
    pub source: SourceKind,
}

pub struct Fetcher {
    strategies: Vec<Box<dyn LoadStrategy>>,
    synthesize: Synthesizer,
}

impl Fetcher {
    pub fn new(strategies: Vec<Box<dyn LoadStrategy>>) -> Self {
        Self {
            strategies,
            synthesize: Box::new(demo::synthesize_today),
        }
    }

    /// Remote first, then the static copy.
    pub fn standard(api: Arc<dyn IndexApi>, files: Arc<StaticFiles>) -> Self {
        Self::new(vec![
            Box::new(RemoteStrategy::new(api)),
            Box::new(StaticStrategy::new(files)),
        ])
    }

    /// Replace the demo generator, e.g. with a seeded one.
    pub fn with_synthesizer<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> EventDocument + Send + Sync + 'static,
    {
        self.synthesize = Box::new(f);
        self
    }

    /// Never fails. Moving past the first strategy or into demo data posts a warning.
    pub async fn load(&self, name: &str, ui: &mut dyn HostUi) -> Loaded {
        let _scope = ProfileScope::with_context("fetch.load", &[("event_name", v_str(name))]);
        let mut last: Option<(SourceKind, DashboardError)> = None;

        for strategy in &self.strategies {
            if let Some((failed, err)) = &last {
                ui.notify(
                    Notice::Warn,
                    &format!(
                        "{} source unavailable for {} ({}); trying {} copy",
                        failed.as_str(),
                        name,
                        err,
                        strategy.kind().as_str()
                    ),
                );
            }
            match strategy.load(name).await {
                Ok(document) => {
                    log_load(name, strategy.kind().as_str(), document.timeline.len());
                    return Loaded { document, source: strategy.kind() };
                }
                Err(err) => {
                    log_fallback(name, strategy.kind().as_str(), err.kind(), &err.to_string());
                    last = Some((strategy.kind(), err));
                }
            }
        }

        let reason = last
            .map(|(_, err)| err.to_string())
            .unwrap_or_else(|| "no data source configured".to_string());
        ui.notify(
            Notice::Warn,
            &format!("could not load iasi.json for {}: {}. Demo mode.", name, reason),
        );
        let document = (self.synthesize)(name);
        log_load(name, SourceKind::Synthetic.as_str(), document.timeline.len());
        Loaded { document, source: SourceKind::Synthetic }
    }
}
