//! Application state and the user-facing actions.
//!
//! Every action catches its own failures and turns them into notices, so the
//! dashboard stays usable after any single error. Each public action holds a
//! `BusyGuard` for its whole duration.

use std::path::Path;
use std::sync::Arc;

use serde_json::Value;

use crate::aoi::{AoiOutcome, AoiResolver, GeometrySource};
use crate::api::{AoiUpload, HttpIndexApi, IndexApi, PublishReceipt};
use crate::classify::Thresholds;
use crate::error::{DashResult, DashboardError};
use crate::fetch::{Fetcher, StaticBase, StaticFiles};
use crate::logging::{log, log_classification, log_notice, obj, v_str, Domain, Level};
use crate::model::EventDocument;
use crate::render::{weights_view, RenderedView, Renderer};
use crate::session::SessionStore;
use crate::state::{Config, Selection};
use crate::ui::{BusyGuard, BusyIndicator, HostUi, MapSurface, NoBusy, Notice};

pub struct Dashboard {
    api: Arc<dyn IndexApi>,
    geometry: Arc<dyn GeometrySource>,
    fetcher: Fetcher,
    store: SessionStore,
    selection: Selection,
    events: Vec<String>,
    defaults: Thresholds,
    thresholds: Thresholds,
    renderer: Renderer,
    aoi: AoiResolver,
    last_aoi: Option<AoiOutcome>,
    ui: Box<dyn HostUi>,
    map: Box<dyn MapSurface>,
    busy: Arc<dyn BusyIndicator>,
}

impl Dashboard {
    pub fn new(
        cfg: &Config,
        api: Arc<dyn IndexApi>,
        geometry: Arc<dyn GeometrySource>,
        fetcher: Fetcher,
        mut ui: Box<dyn HostUi>,
        map: Box<dyn MapSurface>,
    ) -> Self {
        let events = cfg.events.clone();
        for name in &events {
            ui.add_event_option(name);
        }
        let first = events.first().cloned().unwrap_or_else(|| "demo".to_string());
        Self {
            api,
            geometry,
            fetcher,
            store: SessionStore::new(),
            selection: Selection { event: first, window: cfg.window.clone() },
            events,
            defaults: cfg.thresholds,
            thresholds: cfg.thresholds,
            renderer: Renderer::new(),
            aoi: AoiResolver::new(),
            last_aoi: None,
            ui,
            map,
            busy: Arc::new(NoBusy),
        }
    }

    /// HTTP API plus static copies under `cfg.static_base`.
    pub fn from_config(cfg: &Config, ui: Box<dyn HostUi>, map: Box<dyn MapSurface>) -> DashResult<Self> {
        let http = HttpIndexApi::new(cfg)?;
        let files = Arc::new(StaticFiles::new(StaticBase::parse(&cfg.static_base), http.client()));
        let api: Arc<dyn IndexApi> = Arc::new(http);
        let fetcher = Fetcher::standard(api.clone(), files.clone());
        log(
            Level::Info,
            Domain::System,
            "dashboard_init",
            obj(&[
                ("server_base", v_str(&cfg.server_base)),
                ("static_base", v_str(&cfg.static_base)),
                ("authenticated", Value::Bool(cfg.api_token.is_some())),
            ]),
        );
        Ok(Self::new(cfg, api, files, fetcher, ui, map))
    }

    pub fn with_busy(mut self, busy: Arc<dyn BusyIndicator>) -> Self {
        self.busy = busy;
        self
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Takes effect on the next render.
    pub fn set_window(&mut self, window: &str) {
        self.selection.window = window.to_string();
    }

    pub fn events(&self) -> &[String] {
        &self.events
    }

    /// Thresholds in effect for the last render.
    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn aoi(&self) -> &AoiResolver {
        &self.aoi
    }

    pub fn last_aoi(&self) -> Option<AoiOutcome> {
        self.last_aoi
    }

    fn notify(&mut self, level: Notice, message: &str) {
        log_notice(
            match level {
                Notice::Info => Level::Info,
                Notice::Warn => Level::Warn,
                Notice::Error => Level::Error,
            },
            message,
        );
        self.ui.notify(level, message);
    }

    fn add_event(&mut self, name: &str) {
        if !self.events.iter().any(|e| e == name) {
            self.events.push(name.to_string());
            self.ui.add_event_option(name);
        }
    }

    // -------------------------------------------------------------------------
    // Render
    // -------------------------------------------------------------------------

    pub async fn render(&mut self) -> Option<RenderedView> {
        let _busy = BusyGuard::acquire(self.busy.clone());
        self.render_current().await
    }

    /// Change event and/or window, then render.
    pub async fn select(&mut self, event: &str, window: Option<&str>) -> Option<RenderedView> {
        let _busy = BusyGuard::acquire(self.busy.clone());
        self.add_event(event);
        self.selection.event = event.to_string();
        if let Some(w) = window {
            self.selection.window = w.to_string();
        }
        self.ui.select_event(event);
        self.render_current().await
    }

    async fn render_current(&mut self) -> Option<RenderedView> {
        let name = self.selection.event.clone();
        let (doc, _) = self.store.load(&name, &self.fetcher, self.ui.as_mut()).await;

        // Always rebuilt from the defaults; overrides apply to this event only.
        self.thresholds = self.defaults.with_override(doc.meta.thresholds.as_ref());
        self.ui.set_weights(&weights_view(doc.meta.weights.as_ref()));

        let outcome = self
            .aoi
            .resolve(&doc.meta, self.map.as_mut(), self.ui.as_mut(), self.geometry.as_ref())
            .await;
        self.last_aoi = Some(outcome);

        let view = self.renderer.render(
            self.ui.as_mut(),
            &doc.timeline,
            &doc.metrics,
            &self.selection.window,
            &self.thresholds,
        );
        match &view {
            Some(v) => log_classification(&name, doc.latest().map(|s| s.score()).unwrap_or(0.0), v.state.label()),
            None => log_notice(Level::Warn, &DashboardError::EmptyData.to_string()),
        }
        view
    }

    // -------------------------------------------------------------------------
    // Server actions
    // -------------------------------------------------------------------------

    /// Upload the selected in-memory document.
    pub async fn publish(&mut self) -> Option<PublishReceipt> {
        let _busy = BusyGuard::acquire(self.busy.clone());
        let name = self.selection.event.clone();
        let Some(doc) = self.store.get(&name) else {
            self.notify(Notice::Error, "No iasi.json loaded in memory to publish");
            return None;
        };

        match self.api.upload_iasi(&doc).await {
            Ok(receipt) => {
                log(
                    Level::Info,
                    Domain::Server,
                    "published",
                    obj(&[
                        ("event_name", v_str(&name)),
                        ("fingerprint", v_str(&doc.fingerprint())),
                        ("returned_name", receipt.name.as_deref().map(v_str).unwrap_or(Value::Null)),
                    ]),
                );
                self.notify(Notice::Info, "Published iasi.json to server");
                if let Some(returned) = &receipt.name {
                    self.add_event(returned);
                }
                Some(receipt)
            }
            Err(err) => {
                self.notify(Notice::Error, &format!("Error publishing iasi.json: {}", err));
                None
            }
        }
    }

    /// Multipart upload of a raw AOI file; an empty name becomes `uploaded`.
    pub async fn publish_aoi(&mut self, file: &Path, name: &str) -> Option<PublishReceipt> {
        let _busy = BusyGuard::acquire(self.busy.clone());
        let bytes = match std::fs::read(file) {
            Ok(b) => b,
            Err(e) => {
                self.notify(Notice::Error, &format!("Select an AOI file before publishing ({}: {})", file.display(), e));
                return None;
            }
        };
        let upload = AoiUpload {
            file_name: file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "aoi.geojson".to_string()),
            bytes,
        };
        let target = if name.trim().is_empty() { "uploaded" } else { name.trim() };

        match self.api.upload_aoi(upload, target).await {
            Ok(receipt) => {
                let path = receipt.path.clone().unwrap_or_else(|| "?".to_string());
                self.notify(Notice::Info, &format!("AOI published at {}", path));
                Some(receipt)
            }
            Err(err) => {
                self.notify(Notice::Error, &format!("Error publishing AOI: {}", err));
                None
            }
        }
    }

    /// Merge server index names into the selectable list; nothing is removed.
    pub async fn list_remote(&mut self) -> Option<Vec<String>> {
        let _busy = BusyGuard::acquire(self.busy.clone());
        match self.api.list_indices().await {
            Ok(names) => {
                self.notify(Notice::Info, &format!("Indices on server: {}", names.join(", ")));
                for n in &names {
                    self.add_event(n);
                }
                Some(names)
            }
            Err(err) => {
                self.notify(Notice::Error, &format!("Error listing indices: {}", err));
                None
            }
        }
    }

    /// Always hits the API, replaces the cached entry, selects it and re-renders.
    pub async fn reload(&mut self, name: &str) -> Option<RenderedView> {
        let _busy = BusyGuard::acquire(self.busy.clone());
        if name.trim().is_empty() {
            self.notify(Notice::Error, "Select an index to reload");
            return None;
        }

        let fetched = match self.api.get_iasi(name).await {
            Ok(data) => serde_json::from_value::<EventDocument>(data).map_err(DashboardError::from),
            Err(err) => Err(err),
        };
        match fetched {
            Ok(doc) => {
                log(
                    Level::Info,
                    Domain::Server,
                    "reloaded",
                    obj(&[("event_name", v_str(name)), ("fingerprint", v_str(&doc.fingerprint()))]),
                );
                self.store.insert(name, doc);
                self.add_event(name);
                self.selection.event = name.to_string();
                self.ui.select_event(name);
                self.notify(Notice::Info, &format!("Reloaded from server: {}", name));
                self.render_current().await
            }
            Err(err) => {
                self.notify(Notice::Error, &format!("Error reloading index: {}", err));
                None
            }
        }
    }

    // -------------------------------------------------------------------------
    // Local file inputs
    // -------------------------------------------------------------------------

    /// Load an `iasi.json` from disk; it must name itself in `meta.name`.
    pub async fn load_local_document(&mut self, file: &Path) -> Option<RenderedView> {
        let _busy = BusyGuard::acquire(self.busy.clone());
        let doc = match read_text(file).and_then(|t| EventDocument::from_local_json(&t)) {
            Ok(doc) => doc,
            Err(err) => {
                self.notify(Notice::Error, &format!("Error loading iasi.json: {}", err));
                return None;
            }
        };
        let name = doc.meta.name.clone();
        self.store.insert(&name, doc);
        self.add_event(&name);
        self.selection.event = name.clone();
        self.ui.select_event(&name);
        self.notify(Notice::Info, &format!("Loaded local iasi.json: {}", name));
        self.render_current().await
    }

    /// Attach a GeoJSON file as the selected event's in-memory AOI.
    pub async fn load_local_aoi(&mut self, file: &Path) -> Option<RenderedView> {
        let _busy = BusyGuard::acquire(self.busy.clone());
        let geojson = match read_text(file).and_then(|t| serde_json::from_str::<Value>(&t).map_err(DashboardError::from)) {
            Ok(v) => v,
            Err(err) => {
                self.notify(Notice::Error, &format!("Error parsing AOI GeoJSON: {}", err));
                return None;
            }
        };
        let name = self.selection.event.clone();
        self.store.attach_aoi(&name, geojson);
        self.notify(Notice::Info, &format!("AOI loaded locally for {}", name));
        self.render_current().await
    }
}

fn read_text(path: &Path) -> DashResult<String> {
    std::fs::read_to_string(path).map_err(|e| DashboardError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}
