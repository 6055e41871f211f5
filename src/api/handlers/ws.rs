use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use tokio::sync::broadcast::error::RecvError;

use crate::api::ws_types::{StateSummary, WsMessage};
use crate::AppState;

pub async fn handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: AppState) {
    tracing::info!("Dashboard WebSocket client connected");

    let mut rx = state.ws_tx.subscribe();

    // Late joiners get the current phase before any broadcast.
    let current = state.panel.state().await;
    let greeting = WsMessage::StateChanged(StateSummary {
        phase: current.phase,
        loading: current.loading,
        error: current.error,
    });
    if !send_json(&mut socket, &greeting).await {
        return;
    }

    loop {
        tokio::select! {
            msg = rx.recv() => {
                match msg {
                    Ok(ws_msg) => {
                        if !send_json(&mut socket, &ws_msg).await {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(n)) => {
                        tracing::warn!(skipped = n, "Dashboard WS client lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            client_msg = socket.recv() => {
                match client_msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {} // clients only listen
                    Some(Err(_)) => break,
                }
            }
        }
    }

    tracing::info!("Dashboard WebSocket client disconnected");
}

/// Returns false once the socket is gone.
async fn send_json(socket: &mut WebSocket, msg: &WsMessage) -> bool {
    match serde_json::to_string(msg) {
        Ok(json) => socket.send(Message::Text(json)).await.is_ok(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize WsMessage");
            true
        }
    }
}
