use std::collections::HashMap;
use std::sync::Arc;

use futures_util::FutureExt;
use metrics::{counter, gauge};
use serde::Serialize;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;

use crate::analytics::{
    build_action_distribution, build_comparison, ActionCount, ChartStatus, ComparisonDatum,
};
use crate::api::ws_types::{LedgerUpdate, StateSummary, WsMessage};
use crate::client::ExecutionClient;
use crate::ledger::{LedgerView, SortField};
use crate::models::{RunRequest, StrategyView, StrategyViews};
use crate::pipeline::{build_ledgers, build_panel, LedgerPrefs, PanelView, RunSnapshot};
use crate::request::{LoadingPolicy, Outcome, Phase, RequestController};

pub type RunController = RequestController<RunRequest, RunSnapshot>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PanelError {
    #[error("no strategy results loaded")]
    NoData,

    #[error("strategy `{0}` is not part of the current results")]
    UnknownStrategy(String),

    #[error("strategy `{strategy}` failed: {error}")]
    StrategyFailed { strategy: String, error: String },
}

#[derive(Debug, Clone)]
pub struct PanelSettings {
    pub default_strategies: Vec<String>,
    pub fallback_data_mode: String,
}

/// Snapshot served to `GET /api/dashboard/state`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelState {
    pub phase: Phase,
    pub loading: bool,
    pub error: Option<String>,
    pub view: Option<PanelView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonChart {
    pub status: ChartStatus,
    pub rows: Vec<ComparisonDatum>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionChart {
    pub status: ChartStatus,
    pub rows: Vec<ActionCount>,
}

/// Controller wired to the execution service.
pub fn execution_controller(client: ExecutionClient, policy: LoadingPolicy) -> RunController {
    RequestController::with_policy(
        move |request: RunRequest| {
            let client = client.clone();
            async move {
                let payload = client.run_strategies(&request).await?;
                Ok(RunSnapshot {
                    requested: request.strategies,
                    payload,
                })
            }
            .boxed()
        },
        policy,
    )
}

/// One dashboard panel: its own request controller plus the per-strategy
/// table preferences. Never shared between panels.
#[derive(Clone)]
pub struct DashboardPanel {
    controller: RunController,
    prefs: Arc<Mutex<HashMap<String, LedgerPrefs>>>,
    settings: Arc<PanelSettings>,
    events: broadcast::Sender<WsMessage>,
}

impl DashboardPanel {
    pub fn new(
        controller: RunController,
        settings: PanelSettings,
        events: broadcast::Sender<WsMessage>,
    ) -> Self {
        Self {
            controller,
            prefs: Arc::new(Mutex::new(HashMap::new())),
            settings: Arc::new(settings),
            events,
        }
    }

    /// Forward every controller state change to WebSocket clients.
    pub fn spawn_state_forwarder(&self) -> JoinHandle<()> {
        let mut rx = self.controller.subscribe();
        let events = self.events.clone();
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let summary = {
                    let state = rx.borrow_and_update();
                    StateSummary {
                        phase: state.phase(),
                        loading: state.loading,
                        error: state.error.clone(),
                    }
                };
                // No subscribers is fine.
                let _ = events.send(WsMessage::StateChanged(summary));
            }
            tracing::debug!("Panel state channel closed");
        })
    }

    /// Fetch fresh results. An empty strategy list means the configured
    /// defaults.
    pub async fn run(&self, mut request: RunRequest) -> Outcome<PanelView> {
        if request.strategies.is_empty() {
            request.strategies = self.settings.default_strategies.clone();
        }
        tracing::info!(strategies = ?request.strategies, "Running strategies");

        match self.controller.execute(request).await {
            Outcome::Success(snapshot) => {
                let prefs = self.prefs.lock().await.clone();
                let view = build_panel(&snapshot, &prefs, &self.settings.fallback_data_mode);
                record_view_metrics(&view);
                Outcome::Success(view)
            }
            Outcome::Failure(error) => {
                tracing::warn!(%error, "Strategy run failed");
                Outcome::Failure(error)
            }
        }
    }

    pub async fn state(&self) -> PanelState {
        let state = self.controller.state().await;
        let view = match &state.data {
            Some(snapshot) => {
                let prefs = self.prefs.lock().await.clone();
                Some(build_panel(snapshot, &prefs, &self.settings.fallback_data_mode))
            }
            None => None,
        };
        PanelState {
            phase: state.phase(),
            loading: state.loading,
            error: state.error,
            view,
        }
    }

    pub async fn reset(&self) {
        self.controller.reset().await;
    }

    pub async fn dismiss_error(&self) {
        self.controller.dismiss_error().await;
    }

    pub async fn ledger(&self, strategy: &str) -> Result<LedgerView, PanelError> {
        let views = self.current_views().await?;
        ensure_ready(&views, strategy)?;
        let prefs = self.prefs.lock().await;
        build_ledgers(&views, &prefs)
            .get(strategy)
            .map(|ledger| ledger.view())
            .ok_or_else(|| PanelError::UnknownStrategy(strategy.to_string()))
    }

    /// Header click on `field` for one strategy's table.
    pub async fn select_sort(
        &self,
        strategy: &str,
        field: SortField,
    ) -> Result<LedgerView, PanelError> {
        let views = self.current_views().await?;
        ensure_ready(&views, strategy)?;
        let pref = {
            let mut prefs = self.prefs.lock().await;
            let pref = prefs.entry(strategy.to_string()).or_default();
            pref.sort = pref.sort.select(field);
            *pref
        };
        self.announce_ledger(strategy, pref);
        self.ledger(strategy).await
    }

    pub async fn toggle_collapsed(&self, strategy: &str) -> Result<LedgerView, PanelError> {
        let views = self.current_views().await?;
        ensure_ready(&views, strategy)?;
        let pref = {
            let mut prefs = self.prefs.lock().await;
            let pref = prefs.entry(strategy.to_string()).or_default();
            pref.collapsed = !pref.collapsed;
            *pref
        };
        self.announce_ledger(strategy, pref);
        self.ledger(strategy).await
    }

    pub async fn comparison(&self) -> Result<ComparisonChart, PanelError> {
        let views = self.current_views().await?;
        let rows = build_comparison(&views);
        Ok(ComparisonChart {
            status: ChartStatus::of(&rows),
            rows,
        })
    }

    pub async fn distribution(&self) -> Result<DistributionChart, PanelError> {
        let views = self.current_views().await?;
        let rows = build_action_distribution(&views);
        Ok(DistributionChart {
            status: ChartStatus::of(&rows),
            rows,
        })
    }

    async fn current_views(&self) -> Result<StrategyViews, PanelError> {
        self.controller
            .state()
            .await
            .data
            .map(|snapshot| snapshot.views())
            .ok_or(PanelError::NoData)
    }

    fn announce_ledger(&self, strategy: &str, pref: LedgerPrefs) {
        let _ = self.events.send(WsMessage::LedgerUpdated(LedgerUpdate {
            strategy: strategy.to_string(),
            sort: pref.sort,
            collapsed: pref.collapsed,
        }));
    }
}

fn ensure_ready(views: &StrategyViews, strategy: &str) -> Result<(), PanelError> {
    match views.get(strategy) {
        None => Err(PanelError::UnknownStrategy(strategy.to_string())),
        Some(StrategyView::Failed { error }) => Err(PanelError::StrategyFailed {
            strategy: strategy.to_string(),
            error: error.clone(),
        }),
        Some(StrategyView::Ready { .. }) => Ok(()),
    }
}

fn record_view_metrics(view: &PanelView) {
    let failed = view.combined_metrics.strategies_failed.len() as u64;
    counter!("strategy_views_failed").increment(failed);
    gauge!("strategies_ready").set(view.combined_metrics.strategies_run as f64);
}
