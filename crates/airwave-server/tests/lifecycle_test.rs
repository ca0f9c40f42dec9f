//! Session lifecycle tests: start, join, leave, stop, disconnect.

use airwave_harness::{InvariantRegistry, SimServer};
use airwave_proto::{ClientMessage, ConnectionId, ErrorPayload, ServerMessage, SessionId};

fn start(server: &mut SimServer, host: ConnectionId, title: &str) -> SessionId {
    let outcome = server
        .send(host, ClientMessage::StartSession { title: title.to_string(), host_name: None })
        .unwrap();

    outcome
        .to(host)
        .into_iter()
        .find_map(|m| match m {
            ServerMessage::SessionId { id } => Some(*id),
            _ => None,
        })
        .unwrap()
}

fn join(session_id: SessionId) -> ClientMessage {
    ClientMessage::JoinSession { session_id: session_id.to_string() }
}

fn leave(session_id: SessionId) -> ClientMessage {
    ClientMessage::LeaveSession { session_id: session_id.to_string() }
}

fn counts(messages: &[ServerMessage]) -> Vec<usize> {
    messages
        .iter()
        .filter_map(|m| match m {
            ServerMessage::ViewerCount { count, .. } => Some(*count),
            _ => None,
        })
        .collect()
}

fn check(server: &SimServer, context: &str) {
    InvariantRegistry::standard().assert_all(&server.snapshot(), context);
}

#[test]
fn connect_greets_with_connection_id() {
    let mut server = SimServer::new(1);
    let conn = server.connect();

    assert_eq!(server.inbox(conn), vec![ServerMessage::Connected { connection_id: conn }]);
}

#[test]
fn start_replies_to_host_and_announces_to_everyone() {
    let mut server = SimServer::new(1);
    let host = server.connect();
    let other = server.connect();
    server.take_inbox(host);
    server.take_inbox(other);

    let id = start(&mut server, host, "Demo");

    let host_inbox = server.take_inbox(host);
    assert_eq!(host_inbox[0], ServerMessage::SessionId { id });
    let announcement = ServerMessage::NewSession { id, title: "Demo".to_string(), viewers: 0 };
    assert_eq!(host_inbox[1], announcement);
    assert_eq!(server.take_inbox(other), vec![announcement]);
    check(&server, "after start");
}

#[test]
fn host_name_falls_back_to_identity_then_anonymous() {
    let mut server = SimServer::new(2);
    let named = server.connect_as("u-1", "Ana");
    let anon = server.connect();
    let viewer = server.connect();

    let explicit = {
        let outcome = server
            .send(named, ClientMessage::StartSession {
                title: "t".to_string(),
                host_name: Some("Stage Ana".to_string()),
            })
            .unwrap();
        match outcome.to(named)[0] {
            ServerMessage::SessionId { id } => *id,
            ref other => panic!("unexpected {other:?}"),
        }
    };
    let from_identity = start(&mut server, named, "t");
    let anonymous = start(&mut server, anon, "t");

    for (id, expected) in
        [(explicit, "Stage Ana"), (from_identity, "Ana"), (anonymous, "anonymous")]
    {
        let outcome = server.send(viewer, join(id)).unwrap();
        assert!(
            outcome
                .to(viewer)
                .contains(&&ServerMessage::SessionHost { host_name: expected.to_string() })
        );
    }
}

#[test]
fn join_sends_title_host_history_then_count() {
    let mut server = SimServer::new(3);
    let host = server.connect_as("u-h", "Host");
    let viewer = server.connect();
    let id = start(&mut server, host, "Demo");
    server.take_inbox(viewer);

    server.send(viewer, join(id)).unwrap();

    let inbox = server.take_inbox(viewer);
    assert_eq!(inbox, vec![
        ServerMessage::SessionTitle { title: "Demo".to_string() },
        ServerMessage::SessionHost { host_name: "Host".to_string() },
        ServerMessage::ChatHistory { messages: Vec::new() },
        ServerMessage::ViewerCount { session_id: id, count: 1 },
    ]);

    let host_inbox = server.take_inbox(host);
    assert!(host_inbox.contains(&ServerMessage::ViewerCount { session_id: id, count: 1 }));
    let joined = ServerMessage::ViewerJoined { session_id: id, viewer_id: viewer };
    assert!(host_inbox.contains(&joined));
    check(&server, "after join");
}

#[test]
fn join_unknown_session_is_not_found_without_mutation() {
    let mut server = SimServer::new(4);
    let host = server.connect();
    let viewer = server.connect();
    let id = start(&mut server, host, "Demo");
    server.take_inbox(host);
    server.take_inbox(viewer);

    for raw in ["not-a-uuid", "00000000-0000-0000-0000-000000000000"] {
        let request = ClientMessage::JoinSession { session_id: raw.to_string() };
        let outcome = server.send(viewer, request).unwrap();

        assert_eq!(outcome.to(viewer), vec![&ServerMessage::SessionNotFound {
            session_id: raw.to_string(),
        }]);
        assert!(outcome.to(host).is_empty());
    }

    let session = server.driver().store().get(id).unwrap();
    assert_eq!(session.viewer_count(), 0);
    assert!(!server.driver().registry().is_subscribed(viewer, id));
}

#[test]
fn host_cannot_watch_own_session() {
    let mut server = SimServer::new(5);
    let host = server.connect();
    let id = start(&mut server, host, "Demo");
    server.take_inbox(host);

    server.send(host, join(id)).unwrap();

    match &server.take_inbox(host)[..] {
        [ServerMessage::Error(err)] => assert_eq!(err.code, ErrorPayload::HOST_CANNOT_WATCH),
        other => panic!("expected a single error, got {other:?}"),
    }
    assert_eq!(server.driver().store().get(id).unwrap().viewer_count(), 0);
    check(&server, "after host join attempt");
}

#[test]
fn rejoin_is_idempotent() {
    let mut server = SimServer::new(6);
    let host = server.connect();
    let viewer = server.connect();
    let id = start(&mut server, host, "Demo");

    server.send(viewer, join(id)).unwrap();
    server.send(viewer, join(id)).unwrap();

    assert_eq!(counts(&server.inbox(host)), vec![1, 1]);
    assert_eq!(server.driver().store().get(id).unwrap().viewer_count(), 1);
    check(&server, "after rejoin");
}

#[test]
fn double_leave_is_a_no_op() {
    let mut server = SimServer::new(7);
    let host = server.connect();
    let a = server.connect();
    let b = server.connect();
    let id = start(&mut server, host, "Demo");
    server.send(a, join(id)).unwrap();
    server.send(b, join(id)).unwrap();

    server.send(a, leave(id)).unwrap();
    let second = server.send(a, leave(id)).unwrap();

    assert!(second.is_silent());
    assert_eq!(counts(&server.inbox(host)), vec![1, 2, 1]);
    let left = ServerMessage::ViewerLeft { session_id: id, viewer_id: a };
    assert!(server.inbox(host).contains(&left));
    check(&server, "after double leave");
}

#[test]
fn stop_notifies_room_then_removes_then_announces() {
    let mut server = SimServer::new(8);
    let host = server.connect();
    let viewer = server.connect();
    let bystander = server.connect();
    let id = start(&mut server, host, "Demo");
    server.send(viewer, join(id)).unwrap();

    let outcome =
        server.send(host, ClientMessage::StopSession { session_id: id.to_string() }).unwrap();

    let messages: Vec<_> = outcome.messages().cloned().collect();
    assert_eq!(messages, vec![
        ServerMessage::SessionEnded { session_id: id },
        ServerMessage::RemovedSession { id },
    ]);
    assert_eq!(outcome.actions()[0].recipients(), &[host, viewer]);
    assert_eq!(outcome.actions()[1].recipients(), &[host, viewer, bystander]);

    assert!(server.driver().store().get(id).is_none());
    assert_eq!(server.driver().registry().room_size(id), 0);
    check(&server, "after stop");
}

#[test]
fn stop_by_non_host_is_declined() {
    let mut server = SimServer::new(9);
    let host = server.connect();
    let viewer = server.connect();
    let id = start(&mut server, host, "Demo");
    server.send(viewer, join(id)).unwrap();
    server.take_inbox(viewer);

    server.send(viewer, ClientMessage::StopSession { session_id: id.to_string() }).unwrap();

    match &server.take_inbox(viewer)[..] {
        [ServerMessage::Error(err)] => assert_eq!(err.code, ErrorPayload::NOT_SESSION_HOST),
        other => panic!("expected a single error, got {other:?}"),
    }
    assert!(server.driver().store().contains(id));
}

#[test]
fn list_sessions_in_creation_order() {
    let mut server = SimServer::new(10);
    let h1 = server.connect();
    let h2 = server.connect();
    let viewer = server.connect();
    let first = start(&mut server, h1, "First");
    let second = start(&mut server, h2, "Second");
    server.send(viewer, join(second)).unwrap();
    server.take_inbox(viewer);

    server.send(viewer, ClientMessage::ListSessions).unwrap();

    match &server.take_inbox(viewer)[..] {
        [ServerMessage::SessionList { sessions }] => {
            let ids: Vec<_> = sessions.iter().map(|s| s.id).collect();
            assert_eq!(ids, vec![first, second]);
            assert_eq!(sessions[0].viewers, 0);
            assert_eq!(sessions[1].viewers, 1);
            assert_eq!(sessions[1].title, "Second");
        },
        other => panic!("expected a session list, got {other:?}"),
    }
}

#[test]
fn host_disconnect_ends_session_once() {
    let mut server = SimServer::new(11);
    let host = server.connect();
    let viewer = server.connect();
    let id = start(&mut server, host, "Demo");
    server.send(viewer, join(id)).unwrap();
    server.take_inbox(viewer);

    server.disconnect(host).unwrap();

    let inbox = server.take_inbox(viewer);
    let ended =
        inbox.iter().filter(|m| matches!(m, ServerMessage::SessionEnded { .. })).count();
    assert_eq!(ended, 1);
    assert!(inbox.contains(&ServerMessage::RemovedSession { id }));
    assert!(!server.driver().store().contains(id));

    let rejoin = server.send(viewer, join(id)).unwrap();
    assert_eq!(rejoin.to(viewer), vec![&ServerMessage::SessionNotFound {
        session_id: id.to_string(),
    }]);
    check(&server, "after host disconnect");
}

#[test]
fn viewer_disconnect_only_touches_watched_sessions() {
    let mut server = SimServer::new(12);
    let h1 = server.connect();
    let h2 = server.connect();
    let viewer = server.connect();
    let other = server.connect();
    let watched = start(&mut server, h1, "Watched");
    let unrelated = start(&mut server, h2, "Unrelated");
    server.send(viewer, join(watched)).unwrap();
    server.send(other, join(unrelated)).unwrap();
    server.take_inbox(h2);

    server.disconnect(viewer).unwrap();

    assert_eq!(server.driver().store().get(watched).unwrap().viewer_count(), 0);
    assert_eq!(server.driver().store().get(unrelated).unwrap().viewer_count(), 1);
    assert!(server.take_inbox(h2).is_empty());
    assert!(server.inbox(h1).contains(&ServerMessage::ViewerLeft {
        session_id: watched,
        viewer_id: viewer,
    }));
    check(&server, "after viewer disconnect");
}

#[test]
fn disconnect_of_host_and_viewer_cleans_both() {
    let mut server = SimServer::new(13);
    let dual = server.connect();
    let other_host = server.connect();
    let viewer = server.connect();
    let hosted = start(&mut server, dual, "Mine");
    let watched = start(&mut server, other_host, "Theirs");
    server.send(viewer, join(hosted)).unwrap();
    server.send(dual, join(watched)).unwrap();

    server.disconnect(dual).unwrap();

    assert!(!server.driver().store().contains(hosted));
    assert_eq!(server.driver().store().get(watched).unwrap().viewer_count(), 0);
    assert_eq!(counts(&server.inbox(other_host)), vec![1, 0]);
    check(&server, "after dual disconnect");
}

#[test]
fn host_of_several_sessions_ends_all_on_disconnect() {
    let mut server = SimServer::new(14);
    let host = server.connect();
    let a = start(&mut server, host, "A");
    let b = start(&mut server, host, "B");

    server.disconnect(host).unwrap();

    assert!(!server.driver().store().contains(a));
    assert!(!server.driver().store().contains(b));
    assert_eq!(server.driver().session_count(), 0);
    check(&server, "after multi-host disconnect");
}

#[test]
fn disconnect_without_roles_is_a_no_op() {
    let mut server = SimServer::new(15);
    let host = server.connect();
    let idle = server.connect();
    let id = start(&mut server, host, "Demo");
    server.take_inbox(host);

    let outcome = server.disconnect(idle).unwrap();

    assert!(outcome.is_silent());
    assert!(server.driver().store().contains(id));
    assert!(server.take_inbox(host).is_empty());
}

#[test]
fn disconnect_of_unknown_connection_is_harmless() {
    let mut server = SimServer::new(16);
    let outcome = server.disconnect(ConnectionId(404)).unwrap();
    assert!(outcome.is_silent());
}
