//! Console host: prints the dashboard view as text.

use crate::classify::RiskState;
use crate::error::DashResult;
use crate::geo::{AoiGeometry, Bounds};
use crate::render::COMPONENT_LABELS;
use crate::ui::{BarSeries, BusyIndicator, ChartHandle, HostUi, KpiView, LayerHandle, LineSeries, MapSurface, Notice, WeightsView};

const SPARK: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

fn sparkline(values: &[Option<f64>]) -> String {
    values
        .iter()
        .map(|v| match v {
            Some(x) => {
                let idx = (x.clamp(0.0, 1.0) * (SPARK.len() - 1) as f64).round() as usize;
                SPARK[idx]
            }
            None => ' ',
        })
        .collect()
}

fn bar(value: f64, width: usize) -> String {
    let filled = (value.clamp(0.0, 1.0) * width as f64).round() as usize;
    format!("{}{}", "#".repeat(filled), ".".repeat(width - filled))
}

#[derive(Debug, Default)]
pub struct ConsoleUi {
    next_id: u64,
}

impl ConsoleUi {
    pub fn new() -> Self {
        Self::default()
    }

    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

impl HostUi for ConsoleUi {
    fn notify(&mut self, level: Notice, message: &str) {
        let tag = match level {
            Notice::Info => "info",
            Notice::Warn => "warn",
            Notice::Error => "error",
        };
        println!("[{}] {}", tag, message);
    }

    fn draw_line_chart(&mut self, series: &LineSeries) -> ChartHandle {
        let first = series.labels.first().map(String::as_str).unwrap_or("");
        let last = series.labels.last().map(String::as_str).unwrap_or("");
        println!("IASi {} .. {}", first, last);
        println!("  {}", sparkline(&series.score));
        println!(
            "  guides: observation={} alert={}",
            series.observation.label, series.alert.label
        );
        ChartHandle(self.next())
    }

    fn draw_bar_chart(&mut self, series: &BarSeries) -> ChartHandle {
        for (label, value) in series.labels.iter().zip(series.values.iter()) {
            println!("  {} {} {:.2}", label, bar(*value, 20), value);
        }
        ChartHandle(self.next())
    }

    fn destroy_chart(&mut self, _handle: ChartHandle) {}

    fn set_kpis(&mut self, k: &KpiView) {
        println!(
            "score={} state={} date={} window={}",
            k.score, k.state_label, k.date, k.window
        );
        println!(
            "auc_pr={} f1={} false_alarm_pm={} lead_time_days={}",
            k.auc_pr, k.f1, k.false_alarm_pm, k.lead_time_days
        );
    }

    fn set_state_badge(&mut self, state: RiskState) {
        println!("[{}] {}", state.badge_class(), state.label());
    }

    fn set_weights(&mut self, weights: &WeightsView) {
        let parts: Vec<String> = COMPONENT_LABELS
            .iter()
            .zip(weights.values.iter())
            .map(|(l, w)| format!("{}={}", l, w))
            .collect();
        println!("weights {}", parts.join(" "));
    }

    fn add_event_option(&mut self, _name: &str) {}

    fn select_event(&mut self, name: &str) {
        println!("event: {}", name);
    }
}

#[derive(Debug, Default)]
pub struct ConsoleMap {
    next_id: u64,
}

impl ConsoleMap {
    pub fn new() -> Self {
        Self::default()
    }

    fn next(&mut self) -> LayerHandle {
        self.next_id += 1;
        LayerHandle(self.next_id)
    }
}

impl MapSurface for ConsoleMap {
    fn add_marker(&mut self, lat: f64, lon: f64, label: &str) -> LayerHandle {
        println!("map: marker {} at ({:.3}, {:.3})", label, lat, lon);
        self.next()
    }

    fn add_geometry(&mut self, geometry: &AoiGeometry) -> DashResult<LayerHandle> {
        let ty = geometry.geojson.get("type").and_then(|t| t.as_str()).unwrap_or("?");
        println!("map: AOI {}", ty);
        Ok(self.next())
    }

    fn fit_bounds(&mut self, b: Bounds, _padding_px: u32) {
        println!(
            "map: fit lon [{:.3}, {:.3}] lat [{:.3}, {:.3}]",
            b.min_lon, b.max_lon, b.min_lat, b.max_lat
        );
    }

    fn set_view(&mut self, lat: f64, lon: f64, zoom: u8) {
        println!("map: view ({:.3}, {:.3}) zoom {}", lat, lon, zoom);
    }

    fn remove_layer(&mut self, _handle: LayerHandle) {}
}

/// Busy indicator on stderr so stdout stays clean.
pub struct StderrSpinner;

impl BusyIndicator for StderrSpinner {
    fn show(&self) {
        eprint!("... ");
    }

    fn hide(&self) {
        eprintln!("done");
    }
}
