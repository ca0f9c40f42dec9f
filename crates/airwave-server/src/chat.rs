//! Chat and super-chat.

use airwave_core::{ChatDraft, Environment};
use airwave_proto::{ConnectionId, ServerMessage};

use crate::{
    driver::{Actions, LogLevel, ServerDriver, check_len},
    server_error::ServerError,
};

impl<E: Environment> ServerDriver<E> {
    /// Post a chat message to a session.
    ///
    /// The composed message is logged, then broadcast to the room. A
    /// monetized message additionally goes to the host alone as a
    /// `superChatNotice`. Unknown sessions are a no-op.
    ///
    /// Fails only if the store loses a session the driver just resolved.
    pub(crate) fn post_message(
        &mut self,
        sender: ConnectionId,
        raw_id: &str,
        draft: ChatDraft,
    ) -> Result<Actions<E>, ServerError> {
        if let Err(err) = check_len("text", &draft.text, self.config.max_chat_len) {
            return Ok(self.reject_invalid(sender, &err));
        }

        let Some(id) = self.resolve(raw_id) else {
            return Ok(vec![
                self.log(LogLevel::Debug, format!("dropped chat from {sender}: no session")),
            ]);
        };

        let message = draft.compose(&self.env);
        self.store.append_chat(id, message.clone())?;

        let mut actions =
            vec![self.broadcast_room(id, ServerMessage::ChatMessage(message.clone()))];

        if message.is_super_chat
            && let Some(session) = self.store.get(id)
        {
            actions.push(self.log(
                LogLevel::Info,
                format!("super-chat of {} in {id} from {sender}", message.amount),
            ));
            let notice = ServerMessage::SuperChatNotice { session_id: id, message };
            actions.push(self.send(session.host(), notice));
        }

        Ok(actions)
    }
}
