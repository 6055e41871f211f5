use std::time::Duration;

use tokio::sync::broadcast;

use strategy_dashboard::api::router::create_router;
use strategy_dashboard::api::ws_types::WsMessage;
use strategy_dashboard::client::ExecutionClient;
use strategy_dashboard::config::AppConfig;
use strategy_dashboard::services::dashboard::execution_controller;
use strategy_dashboard::services::{DashboardPanel, PanelSettings};
use strategy_dashboard::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    let addr = format!("{}:{}", config.host, config.port);
    let metrics_handle = strategy_dashboard::metrics::init_metrics()?;

    let client = ExecutionClient::with_timeout(
        &config.strategy_service_url,
        Duration::from_secs(config.request_timeout_secs),
    )?;
    tracing::info!(
        service = %client.base_url(),
        timeout_secs = config.request_timeout_secs,
        "Strategy execution client ready"
    );

    // --- WebSocket broadcast channel for dashboard ---
    let (ws_broadcast_tx, _) = broadcast::channel::<WsMessage>(256);

    let controller = execution_controller(client, config.loading_policy());
    let panel = DashboardPanel::new(
        controller,
        PanelSettings {
            default_strategies: config.default_strategies.clone(),
            fallback_data_mode: config.data_mode.clone(),
        },
        ws_broadcast_tx.clone(),
    );
    panel.spawn_state_forwarder();

    if config.api_token.is_none() {
        tracing::warn!("API_TOKEN is not set; API authentication disabled");
    }

    let state = AppState {
        config,
        panel,
        ws_tx: ws_broadcast_tx,
        metrics_handle,
    };
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {addr}");
    axum::serve(listener, router).await?;

    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .init();
}
