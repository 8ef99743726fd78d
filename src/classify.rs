use serde::{Deserialize, Serialize};

use crate::model::ThresholdOverride;

/// Ordered risk states derived from the latest IASi sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskState {
    Observation,
    Caution,
    Alert,
}

impl RiskState {
    pub fn label(&self) -> &'static str {
        match self {
            RiskState::Observation => "Observation",
            RiskState::Caution => "Caution",
            RiskState::Alert => "Alert",
        }
    }

    /// Badge class for the host UI.
    pub fn badge_class(&self) -> &'static str {
        match self {
            RiskState::Observation => "obs",
            RiskState::Caution => "caution",
            RiskState::Alert => "alert",
        }
    }
}

/// Classification cut points. Never validated for consistency; `classify`
/// stays total whatever the values are.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub observation: f64,
    pub caution_min: f64,
    pub caution_max: f64,
    pub alert: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            observation: 0.50,
            caution_min: 0.50,
            caution_max: 0.69,
            alert: 0.70,
        }
    }
}

impl Thresholds {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            observation: env_f64("TH_OBSERVATION").unwrap_or(d.observation),
            caution_min: env_f64("TH_CAUTION_MIN").unwrap_or(d.caution_min),
            caution_max: env_f64("TH_CAUTION_MAX").unwrap_or(d.caution_max),
            alert: env_f64("TH_ALERT").unwrap_or(d.alert),
        }
    }

    /// Alert wins over the caution band, even when the two overlap.
    pub fn classify(&self, score: f64) -> RiskState {
        if score >= self.alert {
            RiskState::Alert
        } else if score >= self.caution_min && score <= self.caution_max {
            RiskState::Caution
        } else {
            RiskState::Observation
        }
    }

    /// Field-by-field overlay; absent fields keep `self`'s value.
    pub fn with_override(&self, over: Option<&ThresholdOverride>) -> Thresholds {
        let Some(t) = over else {
            return *self;
        };
        Thresholds {
            observation: t.observation.unwrap_or(self.observation),
            caution_min: t.caution_min.unwrap_or(self.caution_min),
            caution_max: t.caution_max.unwrap_or(self.caution_max),
            alert: t.alert.unwrap_or(self.alert),
        }
    }
}

fn env_f64(key: &str) -> Option<f64> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
