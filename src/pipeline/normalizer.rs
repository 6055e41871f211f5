use serde_json::{Map, Value};

use crate::models::{RunPayload, StrategySummary, StrategyView, StrategyViews, TradeRecord};

pub const NO_RESULT: &str = "no result returned";
pub const MISSING_TRADES: &str = "missing trades";
pub const MALFORMED_TRADES: &str = "malformed trades";
pub const MALFORMED_SUMMARY: &str = "malformed summary";

/// Turn the raw service payload into one view per requested strategy.
///
/// Views come back in request order with duplicate ids collapsed. Ids present
/// in the payload but not requested are ignored. Never fails: every problem
/// with an entry becomes a `Failed` view for that entry alone.
pub fn normalize(payload: &RunPayload, requested: &[String]) -> StrategyViews {
    for id in payload.results.keys() {
        if !requested.contains(id) {
            tracing::debug!(strategy = %id, "Ignoring result for strategy that was not requested");
        }
    }

    let mut views = StrategyViews::new();
    for id in requested {
        if views.get(id).is_some() {
            continue;
        }
        let view = match payload.results.get(id) {
            Some(entry) => normalize_entry(id, entry),
            None => StrategyView::failed(NO_RESULT),
        };
        if let Some(error) = view.error() {
            tracing::warn!(strategy = %id, error, "Strategy result unavailable");
        }
        views.insert(id.clone(), view);
    }
    views
}

fn normalize_entry(id: &str, entry: &Value) -> StrategyView {
    let Some(entry) = entry.as_object() else {
        return StrategyView::failed(MALFORMED_SUMMARY);
    };

    if let Some(error) = entry_error(entry) {
        return StrategyView::failed(error);
    }

    let trades = match entry.get("trades") {
        Some(Value::Array(items)) => match parse_trades(id, items) {
            Some(trades) => trades,
            None => return StrategyView::failed(MALFORMED_TRADES),
        },
        _ => return StrategyView::failed(MISSING_TRADES),
    };

    let Some(raw_summary) = entry.get("summary").and_then(Value::as_object) else {
        return StrategyView::failed(MALFORMED_SUMMARY);
    };
    let entry_execution_time = entry.get("execution_time").and_then(Value::as_f64);

    match StrategySummary::from_raw(raw_summary, trades.len(), entry_execution_time) {
        Ok(summary) => StrategyView::Ready { trades, summary },
        Err(e) => {
            tracing::debug!(strategy = %id, error = %e, "Rejecting strategy summary");
            StrategyView::failed(MALFORMED_SUMMARY)
        }
    }
}

/// A null or empty `error` sits next to successful results on the wire and
/// does not mark a failure.
fn entry_error(entry: &Map<String, Value>) -> Option<String> {
    match entry.get("error")? {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn parse_trades(id: &str, items: &[Value]) -> Option<Vec<TradeRecord>> {
    let mut trades = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let mut trade: TradeRecord = match serde_json::from_value(item.clone()) {
            Ok(trade) => trade,
            Err(e) => {
                tracing::debug!(strategy = %id, index, error = %e, "Rejecting trade record");
                return None;
            }
        };
        if !trade.is_well_formed() {
            tracing::debug!(strategy = %id, index, "Trade has negative quantity or price");
            return None;
        }
        if trade.strategy_name.is_empty() {
            trade.strategy_name = id.to_string();
        }
        trades.push(trade);
    }
    Some(trades)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(results: Value) -> RunPayload {
        serde_json::from_value(json!({ "results": results, "status": "success" })).unwrap()
    }

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn trade() -> Value {
        json!({
            "week": "Week0", "symbol": "IWM", "action": "SELL_PUT", "quantity": 1,
            "price": 3.96, "cash_flow": 3.96, "timestamp": "2025-06-28T13:09:31Z"
        })
    }

    fn summary() -> Value {
        json!({ "total_trades": 1, "initial_capital": 50000, "final_capital": 50003.96 })
    }

    #[test]
    fn test_missing_entry_is_no_result() {
        let views = normalize(&payload(json!({})), &ids(&["wheel"]));
        assert_eq!(views.get("wheel").and_then(StrategyView::error), Some(NO_RESULT));
    }

    #[test]
    fn test_error_entry_is_propagated_verbatim() {
        let views = normalize(
            &payload(json!({
                "rotator": { "error": "timeout", "trades": [trade()], "summary": summary() }
            })),
            &ids(&["rotator"]),
        );
        assert_eq!(views.get("rotator"), Some(&StrategyView::failed("timeout")));
    }

    #[test]
    fn test_empty_error_field_is_not_a_failure() {
        let views = normalize(
            &payload(json!({ "wheel": { "error": "", "trades": [], "summary": summary() } })),
            &ids(&["wheel"]),
        );
        assert!(views.get("wheel").unwrap().is_ready());
    }

    #[test]
    fn test_trades_are_tagged_with_owner() {
        let views = normalize(
            &payload(json!({ "wheel": { "trades": [trade()], "summary": summary() } })),
            &ids(&["wheel"]),
        );
        let (trades, summary) = views.get("wheel").unwrap().as_ready().unwrap();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].strategy_name, "wheel");
        assert_eq!(summary.total_trades, 1);
    }

    #[test]
    fn test_missing_capital_is_malformed_summary() {
        let views = normalize(
            &payload(json!({
                "wheel": { "trades": [], "summary": { "total_trades": 0, "initial_capital": 10 } }
            })),
            &ids(&["wheel"]),
        );
        assert_eq!(views.get("wheel").and_then(StrategyView::error), Some(MALFORMED_SUMMARY));
    }

    #[test]
    fn test_bad_trades_shapes() {
        let views = normalize(
            &payload(json!({
                "wheel": { "summary": summary() },
                "rotator": { "trades": [{ "symbol": "BTC" }], "summary": summary() }
            })),
            &ids(&["wheel", "rotator"]),
        );
        assert_eq!(views.get("wheel").and_then(StrategyView::error), Some(MISSING_TRADES));
        assert_eq!(views.get("rotator").and_then(StrategyView::error), Some(MALFORMED_TRADES));
    }

    #[test]
    fn test_request_order_dedup_and_superset() {
        let views = normalize(
            &payload(json!({
                "wheel": { "trades": [], "summary": summary() },
                "rotator": { "trades": [], "summary": summary() },
                "extra": { "trades": [], "summary": summary() }
            })),
            &ids(&["rotator", "wheel", "rotator"]),
        );
        assert_eq!(views.ids(), ids(&["rotator", "wheel"]));
        assert!(views.get("extra").is_none());
    }
}
