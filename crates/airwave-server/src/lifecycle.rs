//! Session lifecycle: start, join, leave, stop and disconnect.
//!
//! A session is `Active` from start until it ends, and an ended id is never
//! reused. Room membership in the registry mirrors session roles: the room of
//! a session holds its host plus its viewers, nothing else.

use airwave_core::{Environment, StoreError};
use airwave_proto::{ConnectionId, ErrorPayload, ServerMessage, SessionId};

use crate::driver::{Actions, LogLevel, ServerDriver, check_len};

/// Host name used when neither the request nor the identity carries one.
const ANONYMOUS_HOST: &str = "anonymous";

impl<E: Environment> ServerDriver<E> {
    /// Start a session hosted by `host`.
    ///
    /// The new id goes to the requester alone; every connection learns about
    /// the session through `newSession`.
    pub(crate) fn start_session(
        &mut self,
        host: ConnectionId,
        title: String,
        host_name: Option<String>,
    ) -> Actions<E> {
        if let Err(err) = check_len("title", &title, self.config.max_title_len) {
            return self.reject_invalid(host, &err);
        }

        let host_name = host_name
            .filter(|name| !name.trim().is_empty())
            .or_else(|| self.registry.info(host)?.display_name().map(str::to_string))
            .unwrap_or_else(|| ANONYMOUS_HOST.to_string());

        let id = self.store.create(&self.env, title.clone(), host_name, host);
        self.registry.subscribe(host, id);

        vec![
            self.send(host, ServerMessage::SessionId { id }),
            self.broadcast_all(ServerMessage::NewSession { id, title, viewers: 0 }),
            self.log(LogLevel::Info, format!("session {id} started by {host}")),
        ]
    }

    /// Join a session as viewer.
    ///
    /// The joiner receives title, host name and the complete chat log before
    /// anything else about the session, then the room receives the new count.
    pub(crate) fn join_session(&mut self, viewer: ConnectionId, raw_id: &str) -> Actions<E> {
        let Some(id) = self.resolve(raw_id) else {
            return self.not_found(viewer, raw_id);
        };

        let count = match self.store.add_viewer(id, viewer) {
            Ok(count) => count,
            Err(StoreError::HostCannotWatch { .. }) => {
                return vec![
                    self.send(viewer, ServerMessage::Error(ErrorPayload::host_cannot_watch(id))),
                    self.log(LogLevel::Debug, format!("host {viewer} tried to watch {id}")),
                ];
            },
            Err(StoreError::SessionNotFound(_)) => {
                return self.not_found(viewer, raw_id);
            },
        };
        self.registry.subscribe(viewer, id);

        let Some(session) = self.store.get(id) else {
            return self.not_found(viewer, raw_id);
        };
        let host = session.host();

        vec![
            self.send(viewer, ServerMessage::SessionTitle { title: session.title().to_string() }),
            self.send(viewer, ServerMessage::SessionHost {
                host_name: session.host_name().to_string(),
            }),
            self.send(viewer, ServerMessage::ChatHistory { messages: session.chat_log().to_vec() }),
            self.broadcast_room(id, ServerMessage::ViewerCount { session_id: id, count }),
            self.send(host, ServerMessage::ViewerJoined { session_id: id, viewer_id: viewer }),
            self.log(LogLevel::Info, format!("{viewer} joined {id} ({count} watching)")),
        ]
    }

    /// Leave a session. A connection that is not watching is a no-op.
    pub(crate) fn leave_session(&mut self, viewer: ConnectionId, raw_id: &str) -> Actions<E> {
        let Some(id) = self.resolve(raw_id) else {
            return vec![self.log(LogLevel::Debug, format!("{viewer} left unknown session"))];
        };

        match self.viewer_departed(id, viewer) {
            Some(actions) => actions,
            None => vec![self.log(LogLevel::Debug, format!("{viewer} was not watching {id}"))],
        }
    }

    /// End a session at its host's request.
    pub(crate) fn stop_session(&mut self, requester: ConnectionId, raw_id: &str) -> Actions<E> {
        let Some(id) = self.resolve(raw_id) else {
            return self.not_found(requester, raw_id);
        };

        if !self.store.get(id).is_some_and(|s| s.is_host(requester)) {
            return vec![
                self.send(requester, ServerMessage::Error(ErrorPayload::not_session_host(id))),
                self.log(LogLevel::Warn, format!("{requester} tried to stop {id} without hosting")),
            ];
        }

        self.end_session(id, "stopped by host")
    }

    /// Snapshot of every live session, oldest first.
    pub(crate) fn list_sessions(&self, requester: ConnectionId) -> Actions<E> {
        vec![self.send(requester, ServerMessage::SessionList { sessions: self.store.summaries() })]
    }

    /// Clean up after a closed connection.
    ///
    /// Only the sessions the connection takes part in are visited, via the
    /// registry's reverse index. Every hosted session ends; every watched
    /// session loses a viewer. Unknown connections are a no-op.
    pub(crate) fn disconnect(&mut self, connection_id: ConnectionId, reason: &str) -> Actions<E> {
        let Some((_, rooms)) = self.registry.unregister(connection_id) else {
            return vec![
                self.log(LogLevel::Debug, format!("close for unknown {connection_id}: {reason}")),
            ];
        };

        let mut rooms: Vec<SessionId> = rooms.into_iter().collect();
        rooms.sort_unstable();

        let mut actions = Vec::new();
        let (mut hosted, mut watched) = (0, 0);

        for id in rooms {
            let Some(session) = self.store.get(id) else {
                continue;
            };

            if session.is_host(connection_id) {
                hosted += 1;
                actions.extend(self.end_session(id, "host disconnected"));
            } else if let Some(left) = self.viewer_departed(id, connection_id) {
                watched += 1;
                actions.extend(left);
            }
        }

        actions.push(self.log(
            LogLevel::Info,
            format!("{connection_id} closed ({reason}), ended {hosted}, left {watched}"),
        ));
        actions
    }

    /// Remove a viewer and tell the room and the host.
    ///
    /// `None` if the connection was not a viewer of the session.
    fn viewer_departed(&mut self, id: SessionId, viewer: ConnectionId) -> Option<Actions<E>> {
        let count = self.store.remove_viewer(id, viewer).ok().flatten()?;
        self.registry.unsubscribe(viewer, id);

        let host = self.store.get(id)?.host();
        Some(vec![
            self.broadcast_room(id, ServerMessage::ViewerCount { session_id: id, count }),
            self.send(host, ServerMessage::ViewerLeft { session_id: id, viewer_id: viewer }),
            self.log(LogLevel::Info, format!("{viewer} left {id} ({count} watching)")),
        ])
    }

    /// Notify the room, delete the session, then notify discovery.
    pub(crate) fn end_session(&mut self, id: SessionId, reason: &str) -> Actions<E> {
        let ended = self.broadcast_room(id, ServerMessage::SessionEnded { session_id: id });

        self.store.remove_session(id);
        self.registry.close_room(id);

        vec![
            ended,
            self.broadcast_all(ServerMessage::RemovedSession { id }),
            self.log(LogLevel::Info, format!("session {id} ended: {reason}")),
        ]
    }

    fn not_found(&self, requester: ConnectionId, raw_id: &str) -> Actions<E> {
        vec![
            self.send(requester, ServerMessage::SessionNotFound { session_id: raw_id.to_string() }),
            self.log(LogLevel::Debug, format!("{requester} asked for unknown session {raw_id}")),
        ]
    }
}
