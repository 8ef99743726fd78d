//! Shared fakes: in-memory backend, recording host UI and map.
#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use iasi_dash::aoi::GeometrySource;
use iasi_dash::api::{AoiUpload, Health, IndexApi, InboxStatus, PublishReceipt};
use iasi_dash::classify::RiskState;
use iasi_dash::error::{DashResult, DashboardError};
use iasi_dash::geo::{AoiGeometry, Bounds};
use iasi_dash::model::EventDocument;
use iasi_dash::ui::{
    BarSeries, BusyIndicator, ChartHandle, HostUi, KpiView, LayerHandle, LineSeries, MapSurface, Notice, WeightsView,
};

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

pub fn doc_value(name: &str, scores: &[f64]) -> Value {
    let timeline: Vec<Value> = scores
        .iter()
        .enumerate()
        .map(|(i, s)| {
            json!({
                "date": format!("2024-01-{:02}", i + 1),
                "A": 0.1, "R": 0.2, "D": 0.3, "M": 0.4, "S": 0.5,
                "IASi": s
            })
        })
        .collect();
    json!({
        "meta": {"name": name},
        "timeline": timeline,
        "metrics": {
            "7": {"auc_pr": 0.61, "f1": 0.55, "false_alarm_pm": 1.25, "lead_time_days": 4},
            "14": {"auc_pr": 0.64}
        }
    })
}

pub fn doc(name: &str, scores: &[f64]) -> EventDocument {
    serde_json::from_value(doc_value(name, scores)).unwrap()
}

pub fn square(lon: f64, lat: f64) -> Value {
    json!({
        "type": "Feature",
        "properties": {},
        "geometry": {
            "type": "Polygon",
            "coordinates": [[[lon, lat], [lon + 1.0, lat], [lon + 1.0, lat + 1.0], [lon, lat + 1.0], [lon, lat]]]
        }
    })
}

// ---------------------------------------------------------------------------
// In-memory backend
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryApi {
    pub docs: Mutex<BTreeMap<String, Value>>,
    pub offline: AtomicBool,
    pub get_calls: AtomicUsize,
    pub aoi_uploads: Mutex<Vec<(String, String, usize)>>,
}

impl MemoryApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_doc(self: Arc<Self>, name: &str, value: Value) -> Arc<Self> {
        self.docs.lock().unwrap().insert(name.to_string(), value);
        self
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> DashResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(DashboardError::Network("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl IndexApi for MemoryApi {
    async fn health(&self) -> Health {
        if self.offline.load(Ordering::SeqCst) {
            Health::Unreachable
        } else {
            Health::Reachable
        }
    }

    async fn status(&self) -> DashResult<InboxStatus> {
        self.check_online()?;
        Ok(InboxStatus { processed: 3, invalid: 1, queued: 0 })
    }

    async fn get_iasi(&self, name: &str) -> DashResult<Value> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        self.docs
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| DashboardError::Api("Not found".to_string()))
    }

    async fn upload_iasi(&self, doc: &EventDocument) -> DashResult<PublishReceipt> {
        self.check_online()?;
        let name = doc.meta.name.clone();
        // store the wire form, exactly what a server would persist
        let wire: Value = serde_json::from_str(&serde_json::to_string(doc).unwrap()).unwrap();
        self.docs.lock().unwrap().insert(name.clone(), wire);
        Ok(PublishReceipt {
            path: Some(format!("outputs/indices/{}/iasi.json", name)),
            name: Some(name),
        })
    }

    async fn upload_aoi(&self, upload: AoiUpload, name: &str) -> DashResult<PublishReceipt> {
        self.check_online()?;
        self.aoi_uploads
            .lock()
            .unwrap()
            .push((upload.file_name, name.to_string(), upload.bytes.len()));
        Ok(PublishReceipt { name: None, path: Some(format!("config/aoi_{}.geojson", name)) })
    }

    async fn list_indices(&self) -> DashResult<Vec<String>> {
        self.check_online()?;
        Ok(self.docs.lock().unwrap().keys().cloned().collect())
    }
}

// ---------------------------------------------------------------------------
// Geometry source
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeGeometry {
    pub files: HashMap<String, Value>,
    pub calls: AtomicUsize,
}

impl FakeGeometry {
    pub fn with(path: &str, value: Value) -> Arc<Self> {
        let mut files = HashMap::new();
        files.insert(path.to_string(), value);
        Arc::new(Self { files, calls: AtomicUsize::new(0) })
    }

    pub fn empty() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl GeometrySource for FakeGeometry {
    async fn fetch_geometry(&self, path: &str) -> DashResult<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.files.get(path).cloned().ok_or_else(|| DashboardError::Io {
            path: path.to_string(),
            reason: "not found".to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Recording host UI
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct UiLog {
    pub notices: Vec<(Notice, String)>,
    pub lines: Vec<LineSeries>,
    pub bars: Vec<BarSeries>,
    pub live_charts: Vec<ChartHandle>,
    pub destroyed: Vec<ChartHandle>,
    pub kpis: Option<KpiView>,
    pub badge: Option<RiskState>,
    pub weights: Option<WeightsView>,
    pub options: Vec<String>,
    pub selected: Option<String>,
    next_id: u64,
}

impl UiLog {
    pub fn count(&self, level: Notice) -> usize {
        self.notices.iter().filter(|(l, _)| *l == level).count()
    }

    pub fn chart_calls(&self) -> usize {
        self.lines.len() + self.bars.len() + self.destroyed.len()
    }
}

#[derive(Clone, Default)]
pub struct RecordingUi(pub Arc<Mutex<UiLog>>);

impl RecordingUi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> std::sync::MutexGuard<'_, UiLog> {
        self.0.lock().unwrap()
    }
}

impl HostUi for RecordingUi {
    fn notify(&mut self, level: Notice, message: &str) {
        self.log().notices.push((level, message.to_string()));
    }

    fn draw_line_chart(&mut self, series: &LineSeries) -> ChartHandle {
        let mut log = self.log();
        log.next_id += 1;
        let h = ChartHandle(log.next_id);
        log.lines.push(series.clone());
        log.live_charts.push(h);
        h
    }

    fn draw_bar_chart(&mut self, series: &BarSeries) -> ChartHandle {
        let mut log = self.log();
        log.next_id += 1;
        let h = ChartHandle(log.next_id);
        log.bars.push(series.clone());
        log.live_charts.push(h);
        h
    }

    fn destroy_chart(&mut self, handle: ChartHandle) {
        let mut log = self.log();
        log.live_charts.retain(|h| *h != handle);
        log.destroyed.push(handle);
    }

    fn set_kpis(&mut self, kpis: &KpiView) {
        self.log().kpis = Some(kpis.clone());
    }

    fn set_state_badge(&mut self, state: RiskState) {
        self.log().badge = Some(state);
    }

    fn set_weights(&mut self, weights: &WeightsView) {
        self.log().weights = Some(weights.clone());
    }

    fn add_event_option(&mut self, name: &str) {
        self.log().options.push(name.to_string());
    }

    fn select_event(&mut self, name: &str) {
        self.log().selected = Some(name.to_string());
    }
}

// ---------------------------------------------------------------------------
// Recording map
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MapLog {
    pub markers: Vec<(f64, f64, String)>,
    pub geometries: Vec<Value>,
    pub fits: Vec<Bounds>,
    pub views: Vec<(f64, f64, u8)>,
    pub live: Vec<LayerHandle>,
    pub removed: Vec<LayerHandle>,
    pub reject_geometry: bool,
    next_id: u64,
}

#[derive(Clone, Default)]
pub struct RecordingMap(pub Arc<Mutex<MapLog>>);

impl RecordingMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> std::sync::MutexGuard<'_, MapLog> {
        self.0.lock().unwrap()
    }
}

impl MapSurface for RecordingMap {
    fn add_marker(&mut self, lat: f64, lon: f64, label: &str) -> LayerHandle {
        let mut log = self.log();
        log.next_id += 1;
        let h = LayerHandle(log.next_id);
        log.markers.push((lat, lon, label.to_string()));
        log.live.push(h);
        h
    }

    fn add_geometry(&mut self, geometry: &AoiGeometry) -> DashResult<LayerHandle> {
        let mut log = self.log();
        if log.reject_geometry {
            return Err(DashboardError::Parse("host refused geometry".to_string()));
        }
        log.next_id += 1;
        let h = LayerHandle(log.next_id);
        log.geometries.push(geometry.geojson.clone());
        log.live.push(h);
        Ok(h)
    }

    fn fit_bounds(&mut self, bounds: Bounds, _padding_px: u32) {
        self.log().fits.push(bounds);
    }

    fn set_view(&mut self, lat: f64, lon: f64, zoom: u8) {
        self.log().views.push((lat, lon, zoom));
    }

    fn remove_layer(&mut self, handle: LayerHandle) {
        let mut log = self.log();
        log.live.retain(|h| *h != handle);
        log.removed.push(handle);
    }
}

// ---------------------------------------------------------------------------
// Busy counter
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct BusyCounter {
    pub depth: AtomicI32,
    pub shows: AtomicUsize,
}

impl BusyIndicator for BusyCounter {
    fn show(&self) {
        self.depth.fetch_add(1, Ordering::SeqCst);
        self.shows.fetch_add(1, Ordering::SeqCst);
    }

    fn hide(&self) {
        self.depth.fetch_sub(1, Ordering::SeqCst);
    }
}
