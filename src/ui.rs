//! Host UI seam: typed view updates the core pushes to whatever presents them.
//!
//! The core never touches a presentation layer directly. A browser host, a
//! console host or a test recorder all implement the same traits.

use std::sync::Arc;

use serde::Serialize;

use crate::classify::RiskState;
use crate::error::DashResult;
use crate::geo::{AoiGeometry, Bounds};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Notice {
    Info,
    Warn,
    Error,
}

/// Opaque id for a chart instance living on the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChartHandle(pub u64);

/// Opaque id for a map layer (marker or AOI) living on the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerHandle(pub u64);

/// Horizontal guide line spanning the whole date axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceLine {
    pub label: String,
    pub value: f64,
    pub data: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineSeries {
    pub labels: Vec<String>,
    /// One point per sample; `None` leaves a gap.
    pub score: Vec<Option<f64>>,
    pub observation: ReferenceLine,
    pub alert: ReferenceLine,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarSeries {
    pub labels: [&'static str; 5],
    pub values: [f64; 5],
}

/// Preformatted KPI strings, ready to drop into the host's fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiView {
    pub score: String,
    pub state: RiskState,
    pub state_label: String,
    pub date: String,
    pub window: String,
    pub auc_pr: String,
    pub f1: String,
    pub false_alarm_pm: String,
    pub lead_time_days: String,
}

/// Display weights alpha..epsilon, 2 decimals or `-`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightsView {
    pub values: [String; 5],
}

pub trait HostUi {
    /// Transient, dismissible message.
    fn notify(&mut self, level: Notice, message: &str);
    fn draw_line_chart(&mut self, series: &LineSeries) -> ChartHandle;
    fn draw_bar_chart(&mut self, series: &BarSeries) -> ChartHandle;
    fn destroy_chart(&mut self, handle: ChartHandle);
    fn set_kpis(&mut self, kpis: &KpiView);
    fn set_state_badge(&mut self, state: RiskState);
    fn set_weights(&mut self, weights: &WeightsView);
    /// Append to the selectable event list.
    fn add_event_option(&mut self, name: &str);
    fn select_event(&mut self, name: &str);
}

pub trait MapSurface {
    fn add_marker(&mut self, lat: f64, lon: f64, label: &str) -> LayerHandle;
    /// Fails when the host cannot draw the geometry.
    fn add_geometry(&mut self, geometry: &AoiGeometry) -> DashResult<LayerHandle>;
    fn fit_bounds(&mut self, bounds: Bounds, padding_px: u32);
    fn set_view(&mut self, lat: f64, lon: f64, zoom: u8);
    fn remove_layer(&mut self, handle: LayerHandle);
}

pub trait BusyIndicator: Send + Sync {
    fn show(&self);
    fn hide(&self);
}

/// For hosts without a spinner.
pub struct NoBusy;

impl BusyIndicator for NoBusy {
    fn show(&self) {}
    fn hide(&self) {}
}

/// Shows the indicator on acquire and hides it on drop, whatever the exit path.
pub struct BusyGuard {
    indicator: Arc<dyn BusyIndicator>,
}

impl BusyGuard {
    pub fn acquire(indicator: Arc<dyn BusyIndicator>) -> Self {
        indicator.show();
        Self { indicator }
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.indicator.hide();
    }
}
