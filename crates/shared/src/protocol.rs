use serde::{Deserialize, Serialize};

use crate::{
    domain::{ConnectionState, CounterValue, Status, TxHash},
    error::ApiError,
};

/// Updates published by a counter session to presentation layers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum SessionEvent {
    ConnectionChanged(ConnectionState),
    CounterUpdated(CounterValue),
    StatusChanged(Status),
    TransactionSubmitted { tx_hash: TxHash },
    TransactionConfirmed { tx_hash: TxHash, block_number: u64 },
    Error(ApiError),
}

/// Snapshot of everything a presentation layer renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionView {
    pub connection: ConnectionState,
    pub counter: CounterValue,
    pub status: Status,
    pub can_read: bool,
    pub can_write: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{domain::Activity, error::ErrorCode};

    #[test]
    fn events_use_tagged_json() {
        let event = SessionEvent::StatusChanged(Status::Pending {
            activity: Activity::Increment,
        });
        let json = serde_json::to_value(&event).expect("serialize");
        assert_eq!(json["type"], "status_changed");
        assert_eq!(json["payload"]["status"], "pending");
        assert_eq!(json["payload"]["activity"], "increment");

        let event = SessionEvent::Error(ApiError::new(ErrorCode::NoWallet, "missing"));
        let json = serde_json::to_value(&event).expect("serialize");
        assert_eq!(json["payload"]["code"], "no_wallet");
    }
}
