//! Outbound frames produced by the server.

use serde::{Deserialize, Serialize};

use crate::{
    ChatMessage, ConnectionId, ErrorPayload, NegotiationPayload, SessionId, SessionSummary,
    errors::{ProtocolError, Result},
};

/// Every frame the server may send.
///
/// Deserialize is implemented so test clients and tools can read frames back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Greeting sent once a connection is registered.
    #[serde(rename_all = "camelCase")]
    Connected {
        /// Identity of this connection
        connection_id: ConnectionId,
    },

    /// Id of the session the requester just started.
    SessionId {
        /// New session id
        id: SessionId,
    },

    /// Discovery notice for a newly started session.
    NewSession {
        /// Session id
        id: SessionId,
        /// Display title
        title: String,
        /// Viewer count at creation (always zero)
        viewers: usize,
    },

    /// Discovery notice for a session that no longer exists.
    RemovedSession {
        /// Removed session id
        id: SessionId,
    },

    /// Title of the joined session.
    SessionTitle {
        /// Display title
        title: String,
    },

    /// Host display name of the joined session.
    #[serde(rename_all = "camelCase")]
    SessionHost {
        /// Host display name
        host_name: String,
    },

    /// Full chat log of the joined session, in log order.
    ChatHistory {
        /// Messages, oldest first
        messages: Vec<ChatMessage>,
    },

    /// Current viewer count of a session.
    #[serde(rename_all = "camelCase")]
    ViewerCount {
        /// Session id
        session_id: SessionId,
        /// True cardinality of the viewer set
        count: usize,
    },

    /// Sent to the host: a viewer joined and awaits an offer.
    #[serde(rename_all = "camelCase")]
    ViewerJoined {
        /// Session id
        session_id: SessionId,
        /// Joining viewer
        viewer_id: ConnectionId,
    },

    /// Sent to the host: a viewer left or disconnected.
    #[serde(rename_all = "camelCase")]
    ViewerLeft {
        /// Session id
        session_id: SessionId,
        /// Departed viewer
        viewer_id: ConnectionId,
    },

    /// The requested session does not exist.
    #[serde(rename_all = "camelCase")]
    SessionNotFound {
        /// Session id as the client sent it
        session_id: String,
    },

    /// The session ended; sent to every member of its room.
    #[serde(rename_all = "camelCase")]
    SessionEnded {
        /// Ended session id
        session_id: SessionId,
    },

    /// Snapshot of the session directory.
    SessionList {
        /// Active sessions, oldest first
        sessions: Vec<SessionSummary>,
    },

    /// Relayed offer.
    #[serde(rename_all = "camelCase")]
    Offer {
        /// Session the negotiation belongs to
        session_id: String,
        /// Sending connection
        from: ConnectionId,
        /// Opaque offer
        payload: NegotiationPayload,
    },

    /// Relayed answer, delivered to the host.
    #[serde(rename_all = "camelCase")]
    Answer {
        /// Session the negotiation belongs to
        session_id: SessionId,
        /// Answering viewer
        from: ConnectionId,
        /// Opaque answer
        payload: NegotiationPayload,
    },

    /// Relayed ICE candidate.
    #[serde(rename_all = "camelCase")]
    Candidate {
        /// Session the negotiation belongs to
        session_id: String,
        /// Sending connection
        from: ConnectionId,
        /// Opaque candidate
        payload: NegotiationPayload,
    },

    /// Live chat message broadcast to a session room.
    ChatMessage(ChatMessage),

    /// Sent to the host alone for every monetized message.
    #[serde(rename_all = "camelCase")]
    SuperChatNotice {
        /// Session id
        session_id: SessionId,
        /// The monetized message
        message: ChatMessage,
    },

    /// Error notice for the originating connection.
    Error(ErrorPayload),
}

impl ServerMessage {
    /// Encode to a text frame.
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| ProtocolError::Encode(e.to_string()))
    }

    /// Decode a text frame produced by [`ServerMessage::encode`].
    pub fn decode(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| ProtocolError::Malformed(e.to_string()))
    }

    /// Wire name of this event, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Connected { .. } => "connected",
            Self::SessionId { .. } => "sessionId",
            Self::NewSession { .. } => "newSession",
            Self::RemovedSession { .. } => "removedSession",
            Self::SessionTitle { .. } => "sessionTitle",
            Self::SessionHost { .. } => "sessionHost",
            Self::ChatHistory { .. } => "chatHistory",
            Self::ViewerCount { .. } => "viewerCount",
            Self::ViewerJoined { .. } => "viewerJoined",
            Self::ViewerLeft { .. } => "viewerLeft",
            Self::SessionNotFound { .. } => "sessionNotFound",
            Self::SessionEnded { .. } => "sessionEnded",
            Self::SessionList { .. } => "sessionList",
            Self::Offer { .. } => "offer",
            Self::Answer { .. } => "answer",
            Self::Candidate { .. } => "candidate",
            Self::ChatMessage(_) => "chatMessage",
            Self::SuperChatNotice { .. } => "superChatNotice",
            Self::Error(_) => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    fn wire(message: &ServerMessage) -> Value {
        serde_json::from_str(&message.encode().unwrap()).unwrap()
    }

    #[test]
    fn viewer_count_wire_shape() {
        let session_id = SessionId::from_random_bytes([1; 16]);
        let value = wire(&ServerMessage::ViewerCount { session_id, count: 3 });

        assert_eq!(
            value,
            json!({
                "event": "viewerCount",
                "data": {"sessionId": session_id.to_string(), "count": 3}
            })
        );
    }

    #[test]
    fn error_wire_shape() {
        let value = wire(&ServerMessage::Error(ErrorPayload::invalid_payload("bad")));
        assert_eq!(value, json!({"event": "error", "data": {"code": 1, "message": "bad"}}));
    }

    #[test]
    fn event_name_matches_tag() {
        let session_id = SessionId::from_random_bytes([2; 16]);
        let messages = [
            ServerMessage::Connected { connection_id: ConnectionId(1) },
            ServerMessage::SessionEnded { session_id },
            ServerMessage::SessionHost { host_name: "h".to_string() },
            ServerMessage::SessionList { sessions: Vec::new() },
        ];

        for message in messages {
            assert_eq!(wire(&message)["event"], message.name());
        }
    }
}
