use crate::classify::Thresholds;

pub const DEFAULT_SERVER_BASE: &str = "http://127.0.0.1:5001";

#[derive(Clone, Debug)]
pub struct Config {
    pub server_base: String,
    pub api_token: Option<String>,
    /// Directory or http(s) URL holding `outputs/indices/...` and `config/aoi.geojson`.
    pub static_base: String,
    pub events: Vec<String>,
    pub window: String,
    pub http_timeout_secs: u64,
    pub poll_secs: u64,
    pub poll_delay_secs: u64,
    pub thresholds: Thresholds,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_base: DEFAULT_SERVER_BASE.to_string(),
            api_token: None,
            static_base: ".".to_string(),
            events: vec!["demo".to_string()],
            window: "7".to_string(),
            http_timeout_secs: 10,
            poll_secs: 10,
            poll_delay_secs: 2,
            thresholds: Thresholds::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            server_base: std::env::var("IASI_SERVER_BASE").unwrap_or(d.server_base),
            api_token: std::env::var("IASI_API_TOKEN").ok().filter(|t| !t.trim().is_empty()),
            static_base: std::env::var("IASI_BASE_DIR").unwrap_or(d.static_base),
            events: std::env::var("IASI_EVENTS").ok().map(|v| parse_list(&v)).filter(|v| !v.is_empty()).unwrap_or(d.events),
            window: std::env::var("IASI_WINDOW").unwrap_or(d.window),
            http_timeout_secs: std::env::var("IASI_HTTP_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(d.http_timeout_secs),
            poll_secs: std::env::var("IASI_POLL_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(d.poll_secs),
            poll_delay_secs: std::env::var("IASI_POLL_DELAY_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(d.poll_delay_secs),
            thresholds: Thresholds::from_env(),
        }
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

/// What the user is looking at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selection {
    pub event: String,
    pub window: String,
}
