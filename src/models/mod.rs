pub mod payload;
pub mod summary;
pub mod trade;
pub mod view;

pub use payload::{RunPayload, RunRequest};
pub use summary::{StrategySummary, SummaryError};
pub use trade::TradeRecord;
pub use view::{ByStrategy, StrategyView, StrategyViews};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// TradeAction
// ---------------------------------------------------------------------------

/// Kind of trade event emitted by a strategy.
///
/// Unknown action strings are kept verbatim in `Other` so that the ledger and
/// the distribution histogram can still show them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TradeAction {
    BuyShares,
    SellShares,
    SellPut,
    SellCall,
    BuyCrypto,
    SellCrypto,
    Other(String),
}

impl TradeAction {
    pub fn from_api_str(s: &str) -> Self {
        match s.trim() {
            "BUY_SHARES" => TradeAction::BuyShares,
            "SELL_SHARES" => TradeAction::SellShares,
            "SELL_PUT" => TradeAction::SellPut,
            "SELL_CALL" => TradeAction::SellCall,
            "BUY_CRYPTO" => TradeAction::BuyCrypto,
            "SELL_CRYPTO" => TradeAction::SellCrypto,
            other => TradeAction::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TradeAction::BuyShares => "BUY_SHARES",
            TradeAction::SellShares => "SELL_SHARES",
            TradeAction::SellPut => "SELL_PUT",
            TradeAction::SellCall => "SELL_CALL",
            TradeAction::BuyCrypto => "BUY_CRYPTO",
            TradeAction::SellCrypto => "SELL_CRYPTO",
            TradeAction::Other(s) => s,
        }
    }

    /// Chart label: separators become spaces, case is left alone.
    pub fn display_label(&self) -> String {
        self.as_str().replace(['_', '-'], " ")
    }
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TradeAction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TradeAction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(TradeAction::from_api_str(&raw))
    }
}

// ---------------------------------------------------------------------------
// Loose value coercion shared by trade and summary parsing
// ---------------------------------------------------------------------------

/// Reads a JSON number (or numeric string) as an exact decimal.
///
/// Goes through the shortest textual form so `3.96` stays `3.96` instead of
/// picking up binary float noise.
pub fn decimal_from_value(value: &Value) -> Option<Decimal> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    if text.is_empty() {
        return None;
    }
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

/// Parses an ISO-8601 instant. Values without an offset are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
