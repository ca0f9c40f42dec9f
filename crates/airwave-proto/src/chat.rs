//! Chat and discovery payloads shared by several outbound events.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::SessionId;

/// A chat message as stored in a session's log and broadcast to its room.
///
/// Immutable once created. `amount` is always zero for regular messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Unique message id
    pub id: Uuid,
    /// Display name of the author
    pub author: String,
    /// Message body
    pub text: String,
    /// Monetized message
    pub is_super_chat: bool,
    /// Amount in the smallest currency unit
    pub amount: u64,
    /// Unix milliseconds
    pub timestamp: u64,
}

/// One entry of the session directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    /// Session id
    pub id: SessionId,
    /// Display title
    pub title: String,
    /// Host display name
    pub host_name: String,
    /// Current viewer count
    pub viewers: usize,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn chat_message_uses_camel_case() {
        let msg = ChatMessage {
            id: Uuid::nil(),
            author: "ana".to_string(),
            text: "hello".to_string(),
            is_super_chat: true,
            amount: 50,
            timestamp: 1_700_000_000_000,
        };

        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({
                "id": "00000000-0000-0000-0000-000000000000",
                "author": "ana",
                "text": "hello",
                "isSuperChat": true,
                "amount": 50,
                "timestamp": 1_700_000_000_000u64,
            })
        );
    }
}
