pub mod analytics;
pub mod api;
pub mod client;
pub mod config;
pub mod errors;
pub mod ledger;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod request;
pub mod services;

use tokio::sync::broadcast;

use crate::api::ws_types::WsMessage;
use crate::config::AppConfig;
use crate::services::DashboardPanel;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub panel: DashboardPanel,
    pub ws_tx: broadcast::Sender<WsMessage>,
    pub metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
}
