//! Chat message composition.
//!
//! Turns what a client sent into the immutable [`ChatMessage`] that gets logged
//! and broadcast. Normalization happens here, once, so every copy of a message
//! (history replay, live broadcast, super-chat notice) is identical.

use airwave_proto::ChatMessage;

use crate::env::Environment;

/// Chat message as submitted by a client, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatDraft {
    /// Display name of the author (untrusted)
    pub author: String,
    /// Message body
    pub text: String,
    /// Sender claims the message is monetized
    pub is_super_chat: bool,
    /// Amount as sent
    pub amount: u64,
    /// Sender clock in Unix milliseconds
    pub timestamp: Option<u64>,
}

impl ChatDraft {
    /// Normalize into a [`ChatMessage`].
    ///
    /// - `amount` is forced to `0` for regular messages
    /// - the super-chat flag is kept as sent
    /// - a fresh id is drawn from `env`
    /// - a missing timestamp defaults to the environment's wall clock
    pub fn compose<E: Environment>(self, env: &E) -> ChatMessage {
        let is_super_chat = self.is_super_chat;
        let amount = if is_super_chat { self.amount } else { 0 };

        ChatMessage {
            id: uuid::Builder::from_random_bytes(env.random_id_bytes()).into_uuid(),
            author: self.author,
            text: self.text,
            is_super_chat,
            amount,
            timestamp: self.timestamp.unwrap_or_else(|| env.unix_millis()),
        }
    }
}
