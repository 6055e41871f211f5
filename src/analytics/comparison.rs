use std::cmp::Reverse;
use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;

use super::metrics::return_pct;
use crate::models::StrategyViews;

/// One bar group in the strategy comparison chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonDatum {
    pub strategy_id: String,
    pub strategy_label: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub return_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub return_percent: Decimal,
    pub trade_count: u64,
    #[serde(with = "rust_decimal::serde::float")]
    pub initial_capital: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub final_capital: Decimal,
}

/// One bar in the action-type histogram.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionCount {
    pub action_label: String,
    pub count: usize,
}

/// Whether a chart has anything to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartStatus {
    NoData,
    Ready,
}

impl ChartStatus {
    pub fn of<T>(rows: &[T]) -> Self {
        if rows.is_empty() {
            ChartStatus::NoData
        } else {
            ChartStatus::Ready
        }
    }
}

pub fn strategy_label(id: &str) -> String {
    match id {
        "wheel" => "Options Wheel".into(),
        "rotator" => "Crypto Rotator".into(),
        other => other.to_string(),
    }
}

/// One row per successful strategy, in request order. Failed strategies are
/// left out rather than drawn as zero.
pub fn build_comparison(views: &StrategyViews) -> Vec<ComparisonDatum> {
    views
        .ready()
        .map(|(id, _, summary)| {
            let return_amount = summary.final_capital - summary.initial_capital;
            ComparisonDatum {
                strategy_id: id.to_string(),
                strategy_label: strategy_label(id),
                return_amount,
                return_percent: return_pct(summary.initial_capital, return_amount),
                trade_count: summary.total_trades,
                initial_capital: summary.initial_capital,
                final_capital: summary.final_capital,
            }
        })
        .collect()
}

/// Count trades per action across all successful strategies.
///
/// Ordered by count descending, then label ascending, so identical input
/// always renders the same way.
pub fn build_action_distribution(views: &StrategyViews) -> Vec<ActionCount> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for (_, trades, _) in views.ready() {
        for trade in trades {
            *counts.entry(trade.action.display_label()).or_default() += 1;
        }
    }

    let mut distribution: Vec<ActionCount> = counts
        .into_iter()
        .map(|(action_label, count)| ActionCount {
            action_label,
            count,
        })
        .collect();
    distribution.sort_by(|a, b| {
        Reverse(a.count)
            .cmp(&Reverse(b.count))
            .then_with(|| a.action_label.cmp(&b.action_label))
    });
    distribution
}
