//! Inbound frames sent by hosts and viewers.

use serde::{Deserialize, Serialize};

use crate::{
    ConnectionId, NegotiationPayload,
    errors::{ProtocolError, Result},
};

/// Every frame a client may send.
///
/// Session ids are carried as raw strings. A string that does not parse as a
/// session id simply names a session that does not exist, which the server
/// answers with `sessionNotFound` rather than a decode error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Host publishes a new live session.
    #[serde(rename_all = "camelCase")]
    StartSession {
        /// Display title
        title: String,
        /// Host display name; falls back to the authenticated identity
        #[serde(default)]
        host_name: Option<String>,
    },

    /// Viewer joins a session.
    #[serde(rename_all = "camelCase")]
    JoinSession {
        /// Session to watch
        session_id: String,
    },

    /// Viewer leaves a session.
    #[serde(rename_all = "camelCase")]
    LeaveSession {
        /// Session to leave
        session_id: String,
    },

    /// Host ends a session.
    #[serde(rename_all = "camelCase")]
    StopSession {
        /// Session to end
        session_id: String,
    },

    /// Request a snapshot of every active session.
    ListSessions,

    /// Host offers a media path to one viewer.
    #[serde(rename_all = "camelCase")]
    Offer {
        /// Session the negotiation belongs to
        session_id: String,
        /// Viewer connection that receives the offer
        target: ConnectionId,
        /// Opaque offer
        payload: NegotiationPayload,
    },

    /// Viewer answers the host's offer.
    #[serde(rename_all = "camelCase")]
    Answer {
        /// Session the negotiation belongs to
        session_id: String,
        /// Opaque answer
        payload: NegotiationPayload,
    },

    /// Either side trickles an ICE candidate.
    #[serde(rename_all = "camelCase")]
    Candidate {
        /// Session the negotiation belongs to
        session_id: String,
        /// Connection that receives the candidate
        target: ConnectionId,
        /// Opaque candidate
        payload: NegotiationPayload,
    },

    /// Chat or super-chat message.
    #[serde(rename_all = "camelCase")]
    ChatMessage {
        /// Session the message is posted to
        session_id: String,
        /// Display name of the author (not verified)
        author: String,
        /// Message body
        text: String,
        /// Whether the message is monetized
        #[serde(default)]
        is_super_chat: bool,
        /// Amount in the smallest currency unit
        #[serde(default)]
        amount: u64,
        /// Sender clock in Unix milliseconds
        #[serde(default)]
        timestamp: Option<u64>,
    },
}

impl ClientMessage {
    /// Decode a text frame and check required fields.
    pub fn decode(text: &str) -> Result<Self> {
        let message: Self =
            serde_json::from_str(text).map_err(|e| ProtocolError::Malformed(e.to_string()))?;
        message.check_required()?;
        Ok(message)
    }

    /// Encode to a text frame.
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| ProtocolError::Encode(e.to_string()))
    }

    /// Wire name of this event, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::StartSession { .. } => "startSession",
            Self::JoinSession { .. } => "joinSession",
            Self::LeaveSession { .. } => "leaveSession",
            Self::StopSession { .. } => "stopSession",
            Self::ListSessions => "listSessions",
            Self::Offer { .. } => "offer",
            Self::Answer { .. } => "answer",
            Self::Candidate { .. } => "candidate",
            Self::ChatMessage { .. } => "chatMessage",
        }
    }

    fn check_required(&self) -> Result<()> {
        let session_id = match self {
            Self::StartSession { title, .. } => {
                return non_blank(title, "title");
            },
            Self::ListSessions => return Ok(()),
            Self::ChatMessage { session_id, text, .. } => {
                non_blank(text, "text")?;
                session_id
            },
            Self::JoinSession { session_id }
            | Self::LeaveSession { session_id }
            | Self::StopSession { session_id }
            | Self::Offer { session_id, .. }
            | Self::Answer { session_id, .. }
            | Self::Candidate { session_id, .. } => session_id,
        };
        non_blank(session_id, "sessionId")
    }
}

fn non_blank(value: &str, field: &'static str) -> Result<()> {
    if value.trim().is_empty() { Err(ProtocolError::MissingField(field)) } else { Ok(()) }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn decodes_join() {
        let msg = ClientMessage::decode(r#"{"event":"joinSession","data":{"sessionId":"abc"}}"#)
            .unwrap();
        assert_eq!(msg, ClientMessage::JoinSession { session_id: "abc".to_string() });
    }

    #[test]
    fn decodes_unit_event_without_data() {
        let msg = ClientMessage::decode(r#"{"event":"listSessions"}"#).unwrap();
        assert_eq!(msg, ClientMessage::ListSessions);
    }

    #[test]
    fn chat_defaults_optional_fields() {
        let msg = ClientMessage::decode(
            r#"{"event":"chatMessage","data":{"sessionId":"s","author":"a","text":"hi"}}"#,
        )
        .unwrap();

        assert_eq!(msg, ClientMessage::ChatMessage {
            session_id: "s".to_string(),
            author: "a".to_string(),
            text: "hi".to_string(),
            is_super_chat: false,
            amount: 0,
            timestamp: None,
        });
    }

    #[test]
    fn offer_payload_is_kept_verbatim() {
        let text = json!({
            "event": "offer",
            "data": {
                "sessionId": "s",
                "target": 7,
                "payload": {"type": "offer", "sdp": "v=0\r\n"}
            }
        })
        .to_string();

        match ClientMessage::decode(&text).unwrap() {
            ClientMessage::Offer { target, payload, .. } => {
                assert_eq!(target, ConnectionId(7));
                assert_eq!(payload, json!({"type": "offer", "sdp": "v=0\r\n"}));
            },
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn missing_session_id_is_malformed() {
        let err = ClientMessage::decode(r#"{"event":"joinSession","data":{}}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::Malformed(_)));
    }

    #[test]
    fn blank_session_id_is_missing_field() {
        let err = ClientMessage::decode(r#"{"event":"joinSession","data":{"sessionId":"  "}}"#)
            .unwrap_err();
        assert!(matches!(err, ProtocolError::MissingField("sessionId")));
    }

    #[test]
    fn blank_title_is_missing_field() {
        let err =
            ClientMessage::decode(r#"{"event":"startSession","data":{"title":""}}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::MissingField("title")));
    }

    #[test]
    fn negative_amount_is_malformed() {
        let err = ClientMessage::decode(
            r#"{"event":"chatMessage","data":{"sessionId":"s","author":"a","text":"t","isSuperChat":true,"amount":-5}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ProtocolError::Malformed(_)));
    }

    #[test]
    fn unknown_event_is_malformed() {
        let err = ClientMessage::decode(r#"{"event":"selfDestruct"}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::Malformed(_)));
    }

    #[test]
    fn not_json_is_malformed() {
        assert!(matches!(ClientMessage::decode("hello"), Err(ProtocolError::Malformed(_))));
    }
}
