use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use futures_util::FutureExt;
use serde_json::{json, Value};
use tokio::sync::{broadcast, oneshot};

use strategy_dashboard::api::ws_types::WsMessage;
use strategy_dashboard::config::AppConfig;
use strategy_dashboard::models::{RunPayload, RunRequest};
use strategy_dashboard::pipeline::RunSnapshot;
use strategy_dashboard::request::{FetchError, LoadingPolicy, RequestController};
use strategy_dashboard::services::dashboard::RunController;
use strategy_dashboard::services::{DashboardPanel, PanelSettings};
use strategy_dashboard::AppState;

/// One wheel trade, summary 50000 -> 50003.96.
#[allow(dead_code)]
pub fn wheel_entry() -> Value {
    json!({
        "trades": [
            {
                "week": "Week0",
                "strategy": "wheel",
                "symbol": "SPY",
                "action": "SELL_PUT",
                "quantity": 1,
                "price": 3.96,
                "strike": 540,
                "cash_flow": 3.96,
                "notes": "cash-secured put",
                "timestamp": "2025-06-02T14:30:00"
            }
        ],
        "summary": {
            "total_trades": 1,
            "initial_capital": 50000,
            "final_capital": 50003.96,
            "win_rate": 1.0
        },
        "execution_time": 0.8
    })
}

#[allow(dead_code)]
pub fn rotator_entry() -> Value {
    json!({
        "trades": [
            { "week": "Week0", "symbol": "BTC", "action": "BUY_CRYPTO", "quantity": 0.1,
              "price": 60000, "cash_flow": -6000, "timestamp": "2025-06-02T00:00:00Z" },
            { "week": "Week1", "symbol": "BTC", "action": "SELL_CRYPTO", "quantity": 0.1,
              "price": 62000, "cash_flow": 6200, "timestamp": "2025-06-09T00:00:00Z" },
            { "week": "Week1", "symbol": "ETH", "action": "BUY_CRYPTO", "quantity": 1,
              "price": 3000, "cash_flow": -3000, "timestamp": "2025-06-09T00:00:00Z" }
        ],
        "summary": {
            "total_trades": 3,
            "initial_capital": 10000,
            "final_capital": 10200
        },
        "execution_time": 1.5
    })
}

#[allow(dead_code)]
pub fn payload(results: Value) -> RunPayload {
    serde_json::from_value(json!({
        "results": results,
        "status": "success",
        "ran_at": "2025-06-10T12:00:00Z",
        "combined_summary": { "data_mode": "mock" }
    }))
    .expect("fixture payload")
}

#[allow(dead_code)]
pub fn snapshot(requested: &[&str], results: Value) -> RunSnapshot {
    RunSnapshot {
        requested: requested.iter().map(|s| s.to_string()).collect(),
        payload: payload(results),
    }
}

/// Controller that always answers with the same payload.
#[allow(dead_code)]
pub fn fixed_controller(payload: RunPayload) -> RunController {
    RequestController::new(move |request: RunRequest| {
        let payload = payload.clone();
        async move {
            Ok::<_, FetchError>(RunSnapshot {
                requested: request.strategies,
                payload,
            })
        }
        .boxed()
    })
}

type Gate = oneshot::Receiver<Result<RunPayload, FetchError>>;

/// Pending gates keyed by the `gate` entry of a request's `config_overrides`.
pub type Gates = Arc<Mutex<HashMap<String, Gate>>>;

/// Controller whose calls each park on a named gate until the test resolves
/// it, so completion order is fully under the test's control.
#[allow(dead_code)]
pub fn gated_controller(policy: LoadingPolicy) -> (RunController, Gates) {
    let gates: Gates = Arc::new(Mutex::new(HashMap::new()));
    let pending = Arc::clone(&gates);
    let controller = RequestController::with_policy(
        move |request: RunRequest| {
            let gate = request
                .config_overrides
                .as_ref()
                .and_then(|overrides| overrides.get("gate"))
                .and_then(Value::as_str)
                .and_then(|name| pending.lock().unwrap().remove(name));
            async move {
                let result = match gate {
                    Some(gate) => gate
                        .await
                        .unwrap_or_else(|_| Err(FetchError::Other("gate dropped".into()))),
                    None => Err(FetchError::Other("no gate registered".into())),
                };
                result.map(|payload| RunSnapshot {
                    requested: request.strategies,
                    payload,
                })
            }
            .boxed()
        },
        policy,
    );
    (controller, gates)
}

/// Register a gate and return the sender that resolves it.
#[allow(dead_code)]
pub fn open_gate(gates: &Gates, name: &str) -> oneshot::Sender<Result<RunPayload, FetchError>> {
    let (tx, rx) = oneshot::channel();
    gates.lock().unwrap().insert(name.to_string(), rx);
    tx
}

/// Request that parks on gate `name`.
#[allow(dead_code)]
pub fn gated_request(strategies: &[&str], name: &str) -> RunRequest {
    let mut request = RunRequest::new(strategies.iter().map(|s| s.to_string()).collect());
    let mut overrides = serde_json::Map::new();
    overrides.insert("gate".into(), json!(name));
    request.config_overrides = Some(overrides);
    request
}

/// Wait until the call parked on `name` has started.
#[allow(dead_code)]
pub async fn wait_started(gates: &Gates, name: &str) {
    while gates.lock().unwrap().contains_key(name) {
        tokio::task::yield_now().await;
    }
}

#[allow(dead_code)]
pub fn test_config(api_token: Option<&str>) -> AppConfig {
    AppConfig {
        host: "127.0.0.1".into(),
        port: 0,
        strategy_service_url: "http://127.0.0.1:9".into(),
        request_timeout_secs: 1,
        default_strategies: vec!["wheel".into(), "rotator".into()],
        data_mode: "mock".into(),
        clear_on_loading: false,
        api_token: api_token.map(str::to_string),
    }
}

#[allow(dead_code)]
pub fn test_state(controller: RunController, api_token: Option<&str>) -> AppState {
    let config = test_config(api_token);
    let (ws_tx, _) = broadcast::channel::<WsMessage>(16);
    let panel = DashboardPanel::new(
        controller,
        PanelSettings {
            default_strategies: config.default_strategies.clone(),
            fallback_data_mode: config.data_mode.clone(),
        },
        ws_tx.clone(),
    );
    AppState {
        config,
        panel,
        ws_tx,
        metrics_handle: strategy_dashboard::metrics::detached_handle(),
    }
}
