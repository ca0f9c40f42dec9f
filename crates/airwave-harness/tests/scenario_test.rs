//! Full broadcast scenario, checked step by step against the invariants.
//!
//! host starts "Demo"; A and B join; host posts a super-chat; A leaves; host
//! disconnects; B tries to rejoin.

use airwave_harness::{InvariantRegistry, SimServer};
use airwave_proto::{ClientMessage, ServerMessage, SessionId};

fn viewer_counts(messages: &[ServerMessage]) -> Vec<usize> {
    messages
        .iter()
        .filter_map(|m| match m {
            ServerMessage::ViewerCount { count, .. } => Some(*count),
            _ => None,
        })
        .collect()
}

#[test]
fn demo_broadcast_scenario() {
    let invariants = InvariantRegistry::standard();
    let mut server = SimServer::new(2024);

    let host = server.connect_as("u-host", "Host");
    let a = server.connect();
    let b = server.connect();
    for conn in [host, a, b] {
        server.take_inbox(conn);
    }

    // Host starts "Demo" and alone learns the id.
    let start = server
        .send(host, ClientMessage::StartSession { title: "Demo".to_string(), host_name: None })
        .unwrap();
    let s1: SessionId = match start.to(host)[0] {
        ServerMessage::SessionId { id } => *id,
        ref other => panic!("expected session id, got {other:?}"),
    };
    assert!(!start.to(a).iter().any(|m| matches!(m, ServerMessage::SessionId { .. })));
    invariants.assert_all(&server.snapshot(), "after start");

    // A joins: count 1, title "Demo", empty history.
    server.send(a, ClientMessage::JoinSession { session_id: s1.to_string() }).unwrap();
    let a_inbox = server.take_inbox(a);
    assert!(a_inbox.contains(&ServerMessage::SessionTitle { title: "Demo".to_string() }));
    assert!(a_inbox.contains(&ServerMessage::ChatHistory { messages: Vec::new() }));
    assert_eq!(viewer_counts(&a_inbox), vec![1]);
    invariants.assert_all(&server.snapshot(), "after A joins");

    // B joins: count 2, seen by A, B and the host.
    server.send(b, ClientMessage::JoinSession { session_id: s1.to_string() }).unwrap();
    assert_eq!(viewer_counts(&server.take_inbox(a)), vec![2]);
    assert_eq!(viewer_counts(&server.take_inbox(b)), vec![2]);
    assert_eq!(viewer_counts(&server.take_inbox(host)), vec![1, 2]);
    invariants.assert_all(&server.snapshot(), "after B joins");

    // Host posts a super-chat of 50.
    server
        .send(host, ClientMessage::ChatMessage {
            session_id: s1.to_string(),
            author: "Host".to_string(),
            text: "thanks for watching".to_string(),
            is_super_chat: true,
            amount: 50,
            timestamp: None,
        })
        .unwrap();
    for viewer in [a, b] {
        match &server.take_inbox(viewer)[..] {
            [ServerMessage::ChatMessage(m)] => {
                assert!(m.is_super_chat);
                assert_eq!(m.amount, 50);
            },
            other => panic!("{viewer}: expected one chat message, got {other:?}"),
        }
    }
    let host_inbox = server.take_inbox(host);
    assert!(matches!(&host_inbox[..], [
        ServerMessage::ChatMessage(_),
        ServerMessage::SuperChatNotice { .. }
    ]));
    invariants.assert_all(&server.snapshot(), "after super-chat");

    // A leaves: count 1.
    server.send(a, ClientMessage::LeaveSession { session_id: s1.to_string() }).unwrap();
    assert_eq!(viewer_counts(&server.take_inbox(b)), vec![1]);
    assert_eq!(viewer_counts(&server.take_inbox(host)), vec![1]);
    invariants.assert_all(&server.snapshot(), "after A leaves");

    // Host disconnects: B is told the session ended.
    server.disconnect(host).unwrap();
    let b_inbox = server.take_inbox(b);
    assert_eq!(b_inbox[0], ServerMessage::SessionEnded { session_id: s1 });
    assert!(b_inbox.contains(&ServerMessage::RemovedSession { id: s1 }));
    invariants.assert_all(&server.snapshot(), "after host disconnect");

    // B rejoins: not found.
    server.send(b, ClientMessage::JoinSession { session_id: s1.to_string() }).unwrap();
    assert_eq!(server.take_inbox(b), vec![ServerMessage::SessionNotFound {
        session_id: s1.to_string(),
    }]);
    assert_eq!(server.driver().session_count(), 0);
}

#[test]
fn scenario_replays_identically_from_seed() {
    fn run(seed: u64) -> Vec<ServerMessage> {
        let mut server = SimServer::new(seed);
        let host = server.connect();
        let viewer = server.connect();
        server
            .send(host, ClientMessage::StartSession { title: "t".to_string(), host_name: None })
            .unwrap();
        let id = server.driver().store().summaries()[0].id;
        server.send(viewer, ClientMessage::JoinSession { session_id: id.to_string() }).unwrap();
        server
            .send(viewer, ClientMessage::ChatMessage {
                session_id: id.to_string(),
                author: "v".to_string(),
                text: "hi".to_string(),
                is_super_chat: false,
                amount: 0,
                timestamp: None,
            })
            .unwrap();
        server.inbox(host)
    }

    assert_eq!(run(99), run(99));
    assert_ne!(run(99), run(100));
}
