use serde::Serialize;

use crate::ledger::SortSpec;
use crate::request::Phase;

/// Messages broadcast to all connected WebSocket clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum WsMessage {
    #[serde(rename = "state_changed")]
    StateChanged(StateSummary),

    #[serde(rename = "ledger_updated")]
    LedgerUpdated(LedgerUpdate),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateSummary {
    pub phase: Phase,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerUpdate {
    pub strategy: String,
    pub sort: SortSpec,
    pub collapsed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ws_message_wire_shape() {
        let msg = WsMessage::StateChanged(StateSummary {
            phase: Phase::Failed,
            loading: false,
            error: Some("boom".into()),
        });
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({
                "type": "state_changed",
                "data": { "phase": "failed", "loading": false, "error": "boom" }
            })
        );

        let msg = WsMessage::LedgerUpdated(LedgerUpdate {
            strategy: "wheel".into(),
            sort: SortSpec::default(),
            collapsed: true,
        });
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "ledger_updated");
        assert_eq!(value["data"]["sort"]["field"], "timestamp");
        assert_eq!(value["data"]["sort"]["direction"], "desc");
    }
}
