use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use crate::models::{
    decimal_from_value, ByStrategy, RunPayload, StrategySummary, StrategyViews, TradeRecord,
};

/// Key fragments that mark an additional metric as a percentage.
const PERCENTAGE_HINTS: &[&str] = &["rate", "percentage", "ratio"];

const MINUTE_SECS: f64 = 60.0;

/// Values echoed from the run that produced the views.
#[derive(Debug, Clone, PartialEq)]
pub struct RunContext {
    pub data_mode: String,
    pub ran_at: DateTime<Utc>,
    pub total_execution_seconds: Option<f64>,
}

impl RunContext {
    pub fn from_payload(payload: &RunPayload, fallback_data_mode: &str) -> Self {
        Self {
            data_mode: payload
                .data_mode()
                .unwrap_or(fallback_data_mode)
                .to_string(),
            ran_at: payload.ran_at().unwrap_or_else(Utc::now),
            total_execution_seconds: payload.total_execution_time(),
        }
    }
}

// ---------------------------------------------------------------------------
// Additional metrics
// ---------------------------------------------------------------------------

/// How a strategy-specific metric should be rendered.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum MetricValue {
    Plain(Decimal),
    Percentage(Decimal),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedMetric {
    pub name: String,
    pub value: MetricValue,
}

/// Tag one additional summary entry. The number itself is never altered.
pub fn classify_metric(name: &str, value: &Value) -> MetricValue {
    let text = || match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    let Value::Number(_) = value else {
        return MetricValue::Text(text());
    };
    let Some(number) = decimal_from_value(value) else {
        return MetricValue::Text(text());
    };

    let lower = name.to_lowercase();
    if PERCENTAGE_HINTS.iter().any(|hint| lower.contains(hint)) {
        MetricValue::Percentage(number)
    } else {
        MetricValue::Plain(number)
    }
}

// ---------------------------------------------------------------------------
// Execution duration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationUnit {
    Seconds,
    Minutes,
}

/// Execution time with its display unit. `seconds` is the raw value and the
/// only one used for arithmetic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionDuration {
    pub seconds: f64,
    pub unit: DurationUnit,
    pub label: String,
}

impl ExecutionDuration {
    pub fn from_seconds(seconds: f64) -> Self {
        // Unit follows the rounded value: 59.96 shows as "1.0m".
        let (unit, label) = if (seconds * 10.0).round() / 10.0 < MINUTE_SECS {
            (DurationUnit::Seconds, format!("{seconds:.1}s"))
        } else {
            (DurationUnit::Minutes, format!("{:.1}m", seconds / MINUTE_SECS))
        };
        Self {
            seconds,
            unit,
            label,
        }
    }
}

// ---------------------------------------------------------------------------
// Trade statistics
// ---------------------------------------------------------------------------

/// Win/loss statistics over a strategy's trade ledger, by cash flow sign.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeStatistics {
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: Decimal,
    pub gross_profit: Decimal,
    pub gross_loss: Decimal,
    /// `None` when there are no losing trades or the ratio is out of range.
    pub profit_factor: Option<Decimal>,
    pub avg_win: Decimal,
    pub avg_loss: Decimal,
    pub net_cash_flow: Decimal,
}

impl TradeStatistics {
    pub fn from_trades(trades: &[TradeRecord]) -> Self {
        let wins: Vec<Decimal> = trades
            .iter()
            .map(|t| t.cash_flow)
            .filter(|cf| *cf > Decimal::ZERO)
            .collect();
        let losses: Vec<Decimal> = trades
            .iter()
            .map(|t| t.cash_flow)
            .filter(|cf| *cf < Decimal::ZERO)
            .collect();

        let gross_profit = saturating_sum(wins.iter().copied());
        let loss_total = saturating_sum(losses.iter().copied());
        let gross_loss = loss_total.abs();

        let win_rate = if trades.is_empty() {
            Decimal::ZERO
        } else {
            Decimal::from(wins.len() as u64) / Decimal::from(trades.len() as u64)
                * Decimal::ONE_HUNDRED
        };

        let profit_factor = if gross_loss.is_zero() {
            None
        } else {
            gross_profit.checked_div(gross_loss).map(|pf| pf.round_dp(2))
        };

        Self {
            winning_trades: wins.len(),
            losing_trades: losses.len(),
            win_rate,
            gross_profit,
            gross_loss,
            profit_factor,
            avg_win: mean(gross_profit, wins.len()).round_dp(2),
            avg_loss: mean(loss_total, losses.len()).round_dp(2),
            net_cash_flow: saturating_sum(trades.iter().map(|t| t.cash_flow)),
        }
    }

    pub fn profit_factor_label(&self) -> String {
        match self.profit_factor {
            Some(pf) => pf.to_string(),
            None if self.gross_profit > Decimal::ZERO => "∞".into(),
            None => "0".into(),
        }
    }
}

fn mean(total: Decimal, count: usize) -> Decimal {
    if count == 0 {
        return Decimal::ZERO;
    }
    total
        .checked_div(Decimal::from(count as u64))
        .unwrap_or(Decimal::ZERO)
}

/// Sum that clamps at the representable range instead of panicking.
fn saturating_sum(values: impl Iterator<Item = Decimal>) -> Decimal {
    values.fold(Decimal::ZERO, Decimal::saturating_add)
}

// ---------------------------------------------------------------------------
// Per-strategy and combined rollups
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedMetrics {
    pub pnl: Decimal,
    pub return_pct: Decimal,
    pub trade_count: u64,
    pub initial_capital: Decimal,
    pub final_capital: Decimal,
    pub duration: ExecutionDuration,
    pub additional: Vec<NamedMetric>,
    pub trade_stats: TradeStatistics,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombinedMetrics {
    pub total_trades: u64,
    pub strategies_run: usize,
    pub combined_cash_flow: Decimal,
    pub strategies_requested: Vec<String>,
    pub strategies_failed: Vec<String>,
    pub data_mode: String,
    pub ran_at: DateTime<Utc>,
    pub total_execution_seconds: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregate {
    pub per_strategy: ByStrategy<DerivedMetrics>,
    pub combined: CombinedMetrics,
}

/// `(final - initial) / initial * 100`, or zero when there is no capital.
pub fn return_pct(initial_capital: Decimal, pnl: Decimal) -> Decimal {
    if initial_capital <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    pnl.checked_div(initial_capital)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or(Decimal::ZERO)
}

pub fn derive_metrics(trades: &[TradeRecord], summary: &StrategySummary) -> DerivedMetrics {
    let pnl = summary.final_capital.saturating_sub(summary.initial_capital);

    DerivedMetrics {
        pnl,
        return_pct: return_pct(summary.initial_capital, pnl),
        trade_count: summary.total_trades,
        initial_capital: summary.initial_capital,
        final_capital: summary.final_capital,
        duration: ExecutionDuration::from_seconds(summary.execution_time_seconds),
        additional: summary
            .additional
            .iter()
            .map(|(name, value)| NamedMetric {
                name: name.clone(),
                value: classify_metric(name, value),
            })
            .collect(),
        trade_stats: TradeStatistics::from_trades(trades),
    }
}

/// Derive per-strategy metrics and the cross-strategy rollup.
///
/// Failed views add nothing to any sum but stay listed in
/// `strategies_requested` (and `strategies_failed`).
pub fn aggregate(views: &StrategyViews, context: &RunContext) -> Aggregate {
    let mut per_strategy = ByStrategy::new();
    let mut strategies_run = 0;
    let mut total_trades = 0u64;
    let mut combined_cash_flow = Decimal::ZERO;
    let mut execution_seconds = 0.0;

    for (id, trades, summary) in views.ready() {
        let metrics = derive_metrics(trades, summary);
        strategies_run += 1;
        total_trades = total_trades.saturating_add(summary.total_trades);
        combined_cash_flow = combined_cash_flow.saturating_add(metrics.pnl);
        execution_seconds += summary.execution_time_seconds;
        per_strategy.insert(id.to_string(), metrics);
    }

    let strategies_failed = views
        .iter()
        .filter(|(_, view)| !view.is_ready())
        .map(|(id, _)| id.to_string())
        .collect();

    let combined = CombinedMetrics {
        total_trades,
        strategies_run,
        combined_cash_flow,
        strategies_requested: views.ids(),
        strategies_failed,
        data_mode: context.data_mode.clone(),
        ran_at: context.ran_at,
        total_execution_seconds: context.total_execution_seconds.unwrap_or(execution_seconds),
    };

    Aggregate {
        per_strategy,
        combined,
    }
}

/// Plain-text rendering of one strategy's metrics, for logs.
pub fn format_report(strategy: &str, metrics: &DerivedMetrics) -> String {
    let stats = &metrics.trade_stats;
    let mut report = String::new();
    let _ = writeln!(report, "=== {strategy} PERFORMANCE ===");
    let _ = writeln!(report, "P&L: ${:.2}", metrics.pnl);
    let _ = writeln!(report, "Return: {:.4}%", metrics.return_pct);
    let _ = writeln!(report, "Execution Time: {}", metrics.duration.label);
    let _ = writeln!(report, "Total Trades: {}", metrics.trade_count);
    let _ = writeln!(report, "Win Rate: {:.1}%", stats.win_rate);
    let _ = writeln!(report, "Winning Trades: {}", stats.winning_trades);
    let _ = writeln!(report, "Losing Trades: {}", stats.losing_trades);
    let _ = writeln!(report, "Profit Factor: {}", stats.profit_factor_label());
    let _ = writeln!(report, "Average Win: ${:.2}", stats.avg_win);
    let _ = write!(report, "Average Loss: ${:.2}", stats.avg_loss);
    for metric in &metrics.additional {
        let rendered = match &metric.value {
            MetricValue::Plain(n) => n.to_string(),
            MetricValue::Percentage(n) => format!("{n}%"),
            MetricValue::Text(s) => s.clone(),
        };
        let _ = write!(report, "\n{}: {rendered}", metric.name);
    }
    report
}
