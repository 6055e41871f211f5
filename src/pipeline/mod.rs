pub mod normalizer;

pub use normalizer::{normalize, MALFORMED_SUMMARY, MALFORMED_TRADES, MISSING_TRADES, NO_RESULT};

use std::collections::HashMap;

use serde::Serialize;

use crate::analytics::{
    aggregate, build_action_distribution, build_comparison, format_report, strategy_label,
    ActionCount, ChartStatus, CombinedMetrics, ComparisonDatum, DerivedMetrics, RunContext,
};
use crate::ledger::{LedgerView, SortSpec, TradeLedger};
use crate::models::{ByStrategy, RunPayload, StrategyView, StrategyViews};

/// What one fetch cycle produced: the ids that were asked for and the raw
/// service payload. Everything else is derived from it on demand.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSnapshot {
    pub requested: Vec<String>,
    pub payload: RunPayload,
}

impl RunSnapshot {
    pub fn views(&self) -> StrategyViews {
        normalize(&self.payload, &self.requested)
    }
}

/// Per-strategy table preferences that survive refetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LedgerPrefs {
    pub sort: SortSpec,
    pub collapsed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CardStatus {
    Ready,
    Failed,
}

/// Header of one strategy section; a failed card carries its inline error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyCard {
    pub strategy_id: String,
    pub label: String,
    pub status: CardStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Everything one dashboard panel renders. Plain data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelView {
    pub run_status: String,
    pub strategies: Vec<StrategyCard>,
    pub derived_metrics: ByStrategy<DerivedMetrics>,
    pub combined_metrics: CombinedMetrics,
    pub sorted_trades: ByStrategy<LedgerView>,
    pub comparison_status: ChartStatus,
    pub chart_comparison_data: Vec<ComparisonDatum>,
    pub action_distribution_data: Vec<ActionCount>,
}

/// Ledger for every successful strategy, with its stored preferences applied.
pub fn build_ledgers(
    views: &StrategyViews,
    prefs: &HashMap<String, LedgerPrefs>,
) -> ByStrategy<TradeLedger> {
    views
        .ready()
        .map(|(id, trades, _)| {
            let pref = prefs.get(id).copied().unwrap_or_default();
            (
                id.to_string(),
                TradeLedger::with_state(trades.to_vec(), pref.sort, pref.collapsed),
            )
        })
        .collect()
}

pub fn build_panel(
    snapshot: &RunSnapshot,
    prefs: &HashMap<String, LedgerPrefs>,
    fallback_data_mode: &str,
) -> PanelView {
    let views = snapshot.views();
    let context = RunContext::from_payload(&snapshot.payload, fallback_data_mode);
    let aggregate = aggregate(&views, &context);

    for (id, metrics) in aggregate.per_strategy.iter() {
        tracing::debug!(strategy = %id, "\n{}", format_report(id, metrics));
    }

    let strategies = views.iter().map(|(id, view)| card(id, view)).collect();
    let sorted_trades = build_ledgers(&views, prefs)
        .into_iter()
        .map(|(id, ledger)| (id, ledger.view()))
        .collect();
    let chart_comparison_data = build_comparison(&views);

    PanelView {
        run_status: snapshot.payload.status.clone(),
        strategies,
        derived_metrics: aggregate.per_strategy,
        combined_metrics: aggregate.combined,
        sorted_trades,
        comparison_status: ChartStatus::of(&chart_comparison_data),
        chart_comparison_data,
        action_distribution_data: build_action_distribution(&views),
    }
}

fn card(id: &str, view: &StrategyView) -> StrategyCard {
    StrategyCard {
        strategy_id: id.to_string(),
        label: strategy_label(id),
        status: if view.is_ready() {
            CardStatus::Ready
        } else {
            CardStatus::Failed
        },
        error: view.error().map(str::to_string),
    }
}
