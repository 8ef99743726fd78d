use thiserror::Error;

/// Failure taxonomy for every boundary operation (fetch, parse, render).
///
/// None of these ever reach a top-level handler: callers turn them into a
/// user notice or treat them as a signal to try the next fallback.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("network error: {0}")]
    Network(String),

    #[error("invalid {schema}: missing {}", missing.join(", "))]
    Schema { schema: String, missing: Vec<String> },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("timeline is empty or invalid")]
    EmptyData,

    #[error("server rejected request: {0}")]
    Api(String),

    #[error("io error on {path}: {reason}")]
    Io { path: String, reason: String },
}

impl DashboardError {
    pub fn schema(schema: &str, missing: &[&str]) -> Self {
        DashboardError::Schema {
            schema: schema.to_string(),
            missing: missing.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Short tag used in structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            DashboardError::Network(_) => "network",
            DashboardError::Schema { .. } => "schema",
            DashboardError::Parse(_) => "parse",
            DashboardError::EmptyData => "empty_data",
            DashboardError::Api(_) => "api",
            DashboardError::Io { .. } => "io",
        }
    }
}

impl From<reqwest::Error> for DashboardError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            DashboardError::Parse(err.to_string())
        } else {
            DashboardError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for DashboardError {
    fn from(err: serde_json::Error) -> Self {
        DashboardError::Parse(err.to_string())
    }
}

impl From<url::ParseError> for DashboardError {
    fn from(err: url::ParseError) -> Self {
        DashboardError::Network(format!("bad url: {}", err))
    }
}

pub type DashResult<T> = Result<T, DashboardError>;
