//! Timeline to chart series and KPI strings.

use std::collections::BTreeMap;

use crate::classify::{RiskState, Thresholds};
use crate::logging::{log, obj, v_num, Domain, Level};
use crate::model::{Sample, WeightSet, WindowMetrics};
use crate::ui::{BarSeries, ChartHandle, HostUi, KpiView, LineSeries, Notice, ReferenceLine, WeightsView};

pub const PLACEHOLDER: &str = "—";
pub const COMPONENT_LABELS: [&str; 5] = ["A", "R", "D", "M", "S"];

/// Fixed decimals with ties rounded away from zero (2.5 -> "3", 0.125 -> "0.13").
fn fmt_num(x: f64, decimals: usize) -> String {
    let scale = 10f64.powi(decimals as i32);
    let rounded = (x * scale).round() / scale;
    format!("{:.*}", decimals, rounded)
}

fn fmt_opt(x: Option<f64>, decimals: usize) -> String {
    x.map(|v| fmt_num(v, decimals))
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

pub fn line_series(timeline: &[Sample], th: &Thresholds) -> LineSeries {
    let n = timeline.len();
    LineSeries {
        labels: timeline.iter().map(|s| s.date.clone().unwrap_or_default()).collect(),
        score: timeline.iter().map(|s| s.iasi).collect(),
        observation: ReferenceLine {
            label: fmt_num(th.observation, 2),
            value: th.observation,
            data: vec![th.observation; n],
        },
        alert: ReferenceLine {
            label: fmt_num(th.alert, 2),
            value: th.alert,
            data: vec![th.alert; n],
        },
    }
}

pub fn bar_series(latest: &Sample) -> BarSeries {
    BarSeries {
        labels: COMPONENT_LABELS,
        values: latest.components().map(|v| v.unwrap_or(0.0)),
    }
}

pub fn kpi_view(latest: &Sample, metrics: Option<&WindowMetrics>, window: &str, state: RiskState) -> KpiView {
    let m = metrics.cloned().unwrap_or_default();
    KpiView {
        score: fmt_num(latest.score(), 2),
        state,
        state_label: state.label().to_string(),
        date: latest.date.clone().unwrap_or_else(|| PLACEHOLDER.to_string()),
        window: format!("{}d", window),
        auc_pr: fmt_opt(m.auc_pr, 2),
        f1: fmt_opt(m.f1, 2),
        false_alarm_pm: fmt_opt(m.false_alarm_pm, 2),
        lead_time_days: fmt_opt(m.lead_time_days, 0),
    }
}

/// Document weights, or the fixed defaults when the document has none.
pub fn weights_view(weights: Option<&WeightSet>) -> WeightsView {
    let w = weights.copied().unwrap_or_default();
    WeightsView {
        values: w
            .as_array()
            .map(|v| v.map(|x| fmt_num(x, 2)).unwrap_or_else(|| "-".to_string())),
    }
}

/// What a successful render put on screen.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedView {
    pub state: RiskState,
    pub kpis: KpiView,
}

/// Owns the host's chart instances so each render replaces, never stacks.
#[derive(Debug, Default)]
pub struct Renderer {
    line: Option<ChartHandle>,
    bars: Option<ChartHandle>,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_charts(&self) -> usize {
        self.line.iter().count() + self.bars.iter().count()
    }

    /// Empty timeline: one warning, no chart calls, KPIs untouched.
    pub fn render(
        &mut self,
        ui: &mut dyn HostUi,
        timeline: &[Sample],
        metrics: &BTreeMap<String, WindowMetrics>,
        window: &str,
        th: &Thresholds,
    ) -> Option<RenderedView> {
        let Some(latest) = timeline.last() else {
            ui.notify(Notice::Warn, "Timeline is empty or invalid.");
            return None;
        };

        if let Some(old) = self.line.take() {
            ui.destroy_chart(old);
        }
        self.line = Some(ui.draw_line_chart(&line_series(timeline, th)));

        if let Some(old) = self.bars.take() {
            ui.destroy_chart(old);
        }
        self.bars = Some(ui.draw_bar_chart(&bar_series(latest)));

        let state = th.classify(latest.score());
        let kpis = kpi_view(latest, metrics.get(window), window, state);
        ui.set_state_badge(state);
        ui.set_kpis(&kpis);

        log(
            Level::Debug,
            Domain::Render,
            "rendered",
            obj(&[
                ("samples", v_num(timeline.len() as f64)),
                ("score", v_num(latest.score())),
            ]),
        );
        Some(RenderedView { state, kpis })
    }
}
