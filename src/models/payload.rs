use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::parse_timestamp;

/// Body of `POST /api/run` on the strategy execution service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRequest {
    #[serde(default)]
    pub strategies: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_overrides: Option<Map<String, Value>>,
    #[serde(default = "default_backtest")]
    pub backtest: bool,
}

fn default_backtest() -> bool {
    true
}

impl RunRequest {
    pub fn new(strategies: Vec<String>) -> Self {
        Self {
            strategies,
            config_overrides: None,
            backtest: true,
        }
    }
}

/// Raw multi-strategy result, already deserialized but not yet validated.
///
/// `results` stays untyped: each entry is checked on its own by the
/// normalizer so that one malformed strategy cannot sink the others.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunPayload {
    #[serde(default)]
    pub results: Map<String, Value>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub ran_at: Option<String>,
    #[serde(default)]
    pub total_trades: Option<u64>,
    #[serde(default)]
    pub combined_summary: Map<String, Value>,
}

impl RunPayload {
    pub fn ran_at(&self) -> Option<DateTime<Utc>> {
        self.ran_at.as_deref().and_then(parse_timestamp)
    }

    pub fn data_mode(&self) -> Option<&str> {
        self.combined_summary
            .get("data_mode")
            .and_then(Value::as_str)
            .filter(|mode| !mode.is_empty())
    }

    pub fn total_execution_time(&self) -> Option<f64> {
        self.combined_summary
            .get("total_execution_time")
            .and_then(Value::as_f64)
            .filter(|secs| secs.is_finite() && *secs >= 0.0)
    }
}
