//! Event document types: the `{meta, timeline, metrics}` JSON produced upstream.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::error::{DashResult, DashboardError};

/// Top-level keys every stored `iasi.json` must carry.
pub const REQUIRED_KEYS: [&str; 3] = ["meta", "timeline", "metrics"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDocument {
    pub meta: EventMeta,
    #[serde(default, deserialize_with = "lenient_timeline")]
    pub timeline: Vec<Sample>,
    #[serde(default, deserialize_with = "lenient_metrics")]
    pub metrics: BTreeMap<String, WindowMetrics>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventMeta {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aoi_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aoi_geo: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thresholds: Option<ThresholdOverride>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weights: Option<WeightSet>,
    /// Keys this crate does not interpret; kept so republishing is lossless.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EventMeta {
    pub fn epicenter(&self) -> Option<(f64, f64)> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }
}

/// One daily sample. Every field may be missing; display code treats missing
/// numbers as 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    #[serde(default, deserialize_with = "lenient_date", skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(rename = "A", default, deserialize_with = "lenient_num", skip_serializing_if = "Option::is_none")]
    pub a: Option<f64>,
    #[serde(rename = "R", default, deserialize_with = "lenient_num", skip_serializing_if = "Option::is_none")]
    pub r: Option<f64>,
    #[serde(rename = "D", default, deserialize_with = "lenient_num", skip_serializing_if = "Option::is_none")]
    pub d: Option<f64>,
    #[serde(rename = "M", default, deserialize_with = "lenient_num", skip_serializing_if = "Option::is_none")]
    pub m: Option<f64>,
    #[serde(rename = "S", default, deserialize_with = "lenient_num", skip_serializing_if = "Option::is_none")]
    pub s: Option<f64>,
    #[serde(rename = "IASi", default, deserialize_with = "lenient_num", skip_serializing_if = "Option::is_none")]
    pub iasi: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Sample {
    /// Sub-scores in A,R,D,M,S order.
    pub fn components(&self) -> [Option<f64>; 5] {
        [self.a, self.r, self.d, self.m, self.s]
    }

    pub fn score(&self) -> f64 {
        self.iasi.unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowMetrics {
    #[serde(default, deserialize_with = "lenient_num", skip_serializing_if = "Option::is_none")]
    pub auc_pr: Option<f64>,
    #[serde(default, deserialize_with = "lenient_num", skip_serializing_if = "Option::is_none")]
    pub f1: Option<f64>,
    #[serde(default, deserialize_with = "lenient_num", skip_serializing_if = "Option::is_none")]
    pub false_alarm_pm: Option<f64>,
    #[serde(default, deserialize_with = "lenient_num", skip_serializing_if = "Option::is_none")]
    pub lead_time_days: Option<f64>,
    /// e.g. `brier`, `best_threshold`; carried through publish untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ThresholdOverride {
    #[serde(default, deserialize_with = "lenient_num", skip_serializing_if = "Option::is_none")]
    pub observation: Option<f64>,
    #[serde(default, deserialize_with = "lenient_num", skip_serializing_if = "Option::is_none")]
    pub caution_min: Option<f64>,
    #[serde(default, deserialize_with = "lenient_num", skip_serializing_if = "Option::is_none")]
    pub caution_max: Option<f64>,
    #[serde(default, deserialize_with = "lenient_num", skip_serializing_if = "Option::is_none")]
    pub alert: Option<f64>,
}

/// Display weights for A,R,D,M,S.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightSet {
    #[serde(default, deserialize_with = "lenient_num", skip_serializing_if = "Option::is_none")]
    pub alpha: Option<f64>,
    #[serde(default, deserialize_with = "lenient_num", skip_serializing_if = "Option::is_none")]
    pub beta: Option<f64>,
    #[serde(default, deserialize_with = "lenient_num", skip_serializing_if = "Option::is_none")]
    pub gamma: Option<f64>,
    #[serde(default, deserialize_with = "lenient_num", skip_serializing_if = "Option::is_none")]
    pub delta: Option<f64>,
    #[serde(default, deserialize_with = "lenient_num", skip_serializing_if = "Option::is_none")]
    pub epsilon: Option<f64>,
}

impl Default for WeightSet {
    fn default() -> Self {
        Self {
            alpha: Some(0.25),
            beta: Some(0.20),
            gamma: Some(0.25),
            delta: Some(0.15),
            epsilon: Some(0.15),
        }
    }
}

impl WeightSet {
    pub fn as_array(&self) -> [Option<f64>; 5] {
        [self.alpha, self.beta, self.gamma, self.delta, self.epsilon]
    }
}

/// Accepts a number, a numeric string, or null.
fn lenient_num<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

/// Strings pass through; a bare number (e.g. a year) is kept as its text.
fn lenient_date<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Windows whose value is not an object are dropped; the KPIs show
/// placeholders for them.
fn lenient_metrics<'de, D>(deserializer: D) -> Result<BTreeMap<String, WindowMetrics>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    let Value::Object(windows) = raw else {
        return Ok(BTreeMap::new());
    };
    Ok(windows
        .into_iter()
        .filter(|(_, v)| v.is_object())
        .map(|(k, v)| (k, serde_json::from_value(v).unwrap_or_default()))
        .collect())
}

/// A timeline that is not an array reads as empty; the renderer reports it.
fn lenient_timeline<'de, D>(deserializer: D) -> Result<Vec<Sample>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    match raw {
        Value::Array(items) => Ok(items
            .into_iter()
            .map(|item| serde_json::from_value(item).unwrap_or_default())
            .collect()),
        _ => Ok(Vec::new()),
    }
}

impl EventDocument {
    /// Placeholder used when an AOI is attached before any document is resident.
    pub fn empty(name: &str) -> Self {
        Self {
            meta: EventMeta {
                name: name.to_string(),
                ..EventMeta::default()
            },
            timeline: Vec::new(),
            metrics: BTreeMap::new(),
        }
    }

    /// Parse a stored document, rejecting it when a required top-level key is absent.
    pub fn from_value_checked(value: Value, schema: &str) -> DashResult<Self> {
        let missing = missing_keys(&value, &REQUIRED_KEYS);
        if !missing.is_empty() {
            return Err(DashboardError::schema(schema, &missing));
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Parse a user-supplied document; only `meta.name` is mandatory.
    pub fn from_local_json(text: &str) -> DashResult<Self> {
        let doc: EventDocument = serde_json::from_str(text)?;
        if doc.meta.name.trim().is_empty() {
            return Err(DashboardError::schema("iasi.json", &["meta.name"]));
        }
        Ok(doc)
    }

    pub fn latest(&self) -> Option<&Sample> {
        self.timeline.last()
    }

    /// Hex SHA-256 of the compact JSON form.
    pub fn fingerprint(&self) -> String {
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        hex::encode(Sha256::digest(&bytes))
    }

    /// Fingerprint over `meta.name`, `timeline` and `metrics` only.
    pub fn content_fingerprint(&self) -> String {
        let body = serde_json::json!({
            "name": self.meta.name,
            "timeline": self.timeline,
            "metrics": self.metrics,
        });
        hex::encode(Sha256::digest(body.to_string().as_bytes()))
    }
}

/// Names of `keys` absent from a JSON object (all of them when not an object).
pub fn missing_keys<'a>(value: &Value, keys: &[&'a str]) -> Vec<&'a str> {
    match value.as_object() {
        Some(map) => keys.iter().copied().filter(|k| !map.contains_key(*k)).collect(),
        None => keys.to_vec(),
    }
}
