//! Negotiation relay.
//!
//! Offers and candidates name their target, so they are forwarded without a
//! session lookup. Answers go to the host of the named session, which is the
//! only lookup on this path. Payloads are forwarded untouched and every
//! relayed message carries the sender as `from`.

use airwave_core::Environment;
use airwave_proto::{ConnectionId, NegotiationPayload, ServerMessage};

use crate::driver::{Actions, LogLevel, ServerDriver};

impl<E: Environment> ServerDriver<E> {
    /// Forward an offer to its target.
    pub(crate) fn relay_offer(
        &self,
        from: ConnectionId,
        session_id: String,
        target: ConnectionId,
        payload: NegotiationPayload,
    ) -> Actions<E> {
        self.relay_to_target(target, ServerMessage::Offer { session_id, from, payload })
    }

    /// Forward an answer to the host of the session.
    ///
    /// Dropped silently if the session has ended.
    pub(crate) fn relay_answer(
        &self,
        from: ConnectionId,
        raw_id: &str,
        payload: NegotiationPayload,
    ) -> Actions<E> {
        let Some(session) = self.resolve(raw_id).and_then(|id| self.store.get(id)) else {
            return vec![
                self.log(LogLevel::Debug, format!("dropped answer from {from}: no session")),
            ];
        };

        vec![self.send(session.host(), ServerMessage::Answer {
            session_id: session.id(),
            from,
            payload,
        })]
    }

    /// Forward a candidate to its target.
    pub(crate) fn relay_candidate(
        &self,
        from: ConnectionId,
        session_id: String,
        target: ConnectionId,
        payload: NegotiationPayload,
    ) -> Actions<E> {
        self.relay_to_target(target, ServerMessage::Candidate { session_id, from, payload })
    }

    fn relay_to_target(&self, target: ConnectionId, message: ServerMessage) -> Actions<E> {
        if !self.registry.has_connection(target) {
            return vec![
                self.log(LogLevel::Debug, format!("dropped {}: {target} is gone", message.name())),
            ];
        }

        vec![self.send(target, message)]
    }
}
