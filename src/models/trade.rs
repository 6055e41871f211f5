use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::{decimal_from_value, parse_timestamp, TradeAction};

/// One executed trade as reported by the strategy execution service.
///
/// Accepts the service's snake_case keys as well as camelCase aliases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    #[serde(default, deserialize_with = "de_label")]
    pub week: String,
    #[serde(
        rename = "strategy",
        alias = "strategy_name",
        alias = "strategyName",
        default,
        deserialize_with = "de_label"
    )]
    pub strategy_name: String,
    pub symbol: String,
    pub action: TradeAction,
    #[serde(deserialize_with = "de_decimal")]
    pub quantity: Decimal,
    #[serde(deserialize_with = "de_decimal")]
    pub price: Decimal,
    #[serde(default, deserialize_with = "de_optional_decimal")]
    pub strike: Option<Decimal>,
    #[serde(alias = "cashFlow", deserialize_with = "de_decimal")]
    pub cash_flow: Decimal,
    #[serde(default, deserialize_with = "de_label")]
    pub notes: String,
    #[serde(deserialize_with = "de_timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl TradeRecord {
    /// Quantity and price must be non-negative; cash flow carries the sign.
    pub fn is_well_formed(&self) -> bool {
        !self.quantity.is_sign_negative() && !self.price.is_sign_negative()
    }
}

fn de_decimal<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
    let value = Value::deserialize(deserializer)?;
    decimal_from_value(&value)
        .ok_or_else(|| D::Error::custom(format!("expected a number, got {value}")))
}

fn de_optional_decimal<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Decimal>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    match &value {
        Value::Null => Ok(None),
        Value::String(s) if s.trim().is_empty() || s.trim() == "None" => Ok(None),
        _ => decimal_from_value(&value)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("expected a strike, got {value}"))),
    }
}

fn de_label<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(D::Error::custom(format!("expected a label, got {other}"))),
    }
}

fn de_timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| D::Error::custom(format!("invalid timestamp: {raw}")))
}
