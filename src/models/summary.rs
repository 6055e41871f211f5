use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Map, Value};

use super::decimal_from_value;

const TOTAL_TRADES_KEYS: &[&str] = &["total_trades", "totalTrades"];
const INITIAL_CAPITAL_KEYS: &[&str] = &["initial_capital", "initialCapital"];
const FINAL_CAPITAL_KEYS: &[&str] = &["final_capital", "finalCapital"];
const EXECUTION_TIME_KEYS: &[&str] = &[
    "execution_time",
    "execution_time_seconds",
    "executionTime",
    "executionTimeSeconds",
];

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SummaryError {
    #[error("summary is missing initial or final capital")]
    MissingCapital,

    #[error("summary field `{0}` is not a valid value")]
    InvalidField(&'static str),
}

/// Scalar rollup of one strategy run.
///
/// Keys the dashboard does not know about are kept in `additional`, in the
/// order the service sent them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategySummary {
    pub total_trades: u64,
    pub initial_capital: Decimal,
    pub final_capital: Decimal,
    pub execution_time_seconds: f64,
    pub additional: Map<String, Value>,
}

impl StrategySummary {
    /// Read a summary object from the service payload.
    ///
    /// `trade_count` backs a missing `total_trades`; `entry_execution_time`
    /// backs a missing execution time (the service also reports it next to
    /// the summary).
    pub fn from_raw(
        raw: &Map<String, Value>,
        trade_count: usize,
        entry_execution_time: Option<f64>,
    ) -> Result<Self, SummaryError> {
        let initial = lookup(raw, INITIAL_CAPITAL_KEYS);
        let final_ = lookup(raw, FINAL_CAPITAL_KEYS);
        let (Some(initial), Some(final_)) = (initial, final_) else {
            return Err(SummaryError::MissingCapital);
        };

        let initial_capital = decimal_from_value(initial)
            .filter(|d| !d.is_sign_negative())
            .ok_or(SummaryError::InvalidField("initial_capital"))?;
        let final_capital = decimal_from_value(final_)
            .filter(|d| !d.is_sign_negative())
            .ok_or(SummaryError::InvalidField("final_capital"))?;

        let total_trades = match lookup(raw, TOTAL_TRADES_KEYS) {
            Some(v) => v.as_u64().ok_or(SummaryError::InvalidField("total_trades"))?,
            None => trade_count as u64,
        };

        let execution_time_seconds = match lookup(raw, EXECUTION_TIME_KEYS) {
            Some(v) => v
                .as_f64()
                .filter(|secs| secs.is_finite() && *secs >= 0.0)
                .ok_or(SummaryError::InvalidField("execution_time"))?,
            None => entry_execution_time
                .filter(|secs| secs.is_finite() && *secs >= 0.0)
                .unwrap_or(0.0),
        };

        let additional = raw
            .iter()
            .filter(|(key, _)| !is_known_key(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Ok(Self {
            total_trades,
            initial_capital,
            final_capital,
            execution_time_seconds,
            additional,
        })
    }
}

fn lookup<'a>(raw: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| raw.get(*key))
        .find(|value| !value.is_null())
}

fn is_known_key(key: &str) -> bool {
    [
        TOTAL_TRADES_KEYS,
        INITIAL_CAPITAL_KEYS,
        FINAL_CAPITAL_KEYS,
        EXECUTION_TIME_KEYS,
    ]
    .iter()
    .any(|keys| keys.contains(&key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_reads_service_summary_and_keeps_extras_in_order() {
        let raw = object(json!({
            "total_trades": 4,
            "initial_capital": 50000,
            "final_capital": 50450.5,
            "total_return": 0.9,
            "execution_time": 2.5,
            "win_rate": 75.0,
            "label": "weekly"
        }));

        let summary = StrategySummary::from_raw(&raw, 0, None).unwrap();
        assert_eq!(summary.total_trades, 4);
        assert_eq!(summary.initial_capital, Decimal::from(50_000));
        assert_eq!(summary.final_capital, Decimal::new(504505, 1));
        assert_eq!(summary.execution_time_seconds, 2.5);

        let keys: Vec<&str> = summary.additional.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["total_return", "win_rate", "label"]);
    }

    #[test]
    fn test_camel_case_and_fallbacks() {
        let raw = object(json!({ "initialCapital": 100, "finalCapital": 90 }));
        let summary = StrategySummary::from_raw(&raw, 7, Some(1.25)).unwrap();
        assert_eq!(summary.total_trades, 7);
        assert_eq!(summary.execution_time_seconds, 1.25);
        assert!(summary.additional.is_empty());
    }

    #[test]
    fn test_missing_capital_is_rejected() {
        let raw = object(json!({ "total_trades": 1, "initial_capital": 100 }));
        assert_eq!(
            StrategySummary::from_raw(&raw, 1, None),
            Err(SummaryError::MissingCapital)
        );

        let raw = object(json!({ "initial_capital": null, "final_capital": 100 }));
        assert_eq!(
            StrategySummary::from_raw(&raw, 1, None),
            Err(SummaryError::MissingCapital)
        );
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let raw = object(json!({ "initial_capital": "lots", "final_capital": 100 }));
        assert_eq!(
            StrategySummary::from_raw(&raw, 0, None),
            Err(SummaryError::InvalidField("initial_capital"))
        );

        let raw = object(json!({ "initial_capital": 100, "final_capital": -5 }));
        assert_eq!(
            StrategySummary::from_raw(&raw, 0, None),
            Err(SummaryError::InvalidField("final_capital"))
        );
    }
}
