//! Property-based tests for ConnectionRegistry
//!
//! Random register/subscribe/unsubscribe/close sequences must keep the room
//! index and the reverse connection index describing the same membership.

use std::collections::{BTreeSet, HashSet};

use airwave_proto::{ConnectionId, SessionId};
use airwave_server::{ConnectionInfo, ConnectionRegistry};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum RegistryOp {
    Register(u64),
    Unregister(u64),
    Subscribe(u64, u8),
    Unsubscribe(u64, u8),
    CloseRoom(u8),
}

fn op_strategy() -> impl Strategy<Value = RegistryOp> {
    let conn = 0u64..6;
    let room = 0u8..4;
    prop_oneof![
        2 => conn.clone().prop_map(RegistryOp::Register),
        1 => conn.clone().prop_map(RegistryOp::Unregister),
        4 => (conn.clone(), room.clone()).prop_map(|(c, r)| RegistryOp::Subscribe(c, r)),
        2 => (conn, room.clone()).prop_map(|(c, r)| RegistryOp::Unsubscribe(c, r)),
        1 => room.prop_map(RegistryOp::CloseRoom),
    ]
}

fn room(n: u8) -> SessionId {
    SessionId::from_random_bytes([n.wrapping_add(1); 16])
}

/// Membership as seen from the room side.
fn by_room(registry: &ConnectionRegistry) -> BTreeSet<(ConnectionId, SessionId)> {
    (0..4)
        .map(room)
        .flat_map(|r| registry.connections_in_room(r).map(move |c| (c, r)))
        .collect()
}

/// Membership as seen from the connection side.
fn by_connection(registry: &ConnectionRegistry) -> BTreeSet<(ConnectionId, SessionId)> {
    registry
        .connection_ids()
        .flat_map(|c| registry.rooms_for_connection(c).map(move |r| (c, r)))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: both indexes agree with a plain set model after every step
    #[test]
    fn prop_indexes_stay_consistent(ops in prop::collection::vec(op_strategy(), 0..80)) {
        let mut registry = ConnectionRegistry::new();
        let mut registered: HashSet<ConnectionId> = HashSet::new();
        let mut members: BTreeSet<(ConnectionId, SessionId)> = BTreeSet::new();

        for op in ops {
            match op {
                RegistryOp::Register(c) => {
                    let c = ConnectionId(c);
                    let fresh = registry.register(c, ConnectionInfo::anonymous());
                    prop_assert_eq!(fresh, registered.insert(c));
                },
                RegistryOp::Unregister(c) => {
                    let c = ConnectionId(c);
                    let removed = registry.unregister(c);
                    prop_assert_eq!(removed.is_some(), registered.remove(&c));
                    if let Some((_, rooms)) = removed {
                        let expected: HashSet<SessionId> =
                            members.iter().filter(|(m, _)| *m == c).map(|(_, r)| *r).collect();
                        prop_assert_eq!(rooms, expected);
                    }
                    members.retain(|(m, _)| *m != c);
                },
                RegistryOp::Subscribe(c, r) => {
                    let (c, r) = (ConnectionId(c), room(r));
                    let accepted = registry.subscribe(c, r);
                    prop_assert_eq!(accepted, registered.contains(&c));
                    if accepted {
                        members.insert((c, r));
                    }
                },
                RegistryOp::Unsubscribe(c, r) => {
                    let (c, r) = (ConnectionId(c), room(r));
                    prop_assert_eq!(registry.unsubscribe(c, r), members.remove(&(c, r)));
                },
                RegistryOp::CloseRoom(r) => {
                    let r = room(r);
                    let expected: HashSet<ConnectionId> =
                        members.iter().filter(|(_, m)| *m == r).map(|(c, _)| *c).collect();
                    prop_assert_eq!(registry.close_room(r), expected);
                    members.retain(|(_, m)| *m != r);
                },
            }

            prop_assert_eq!(registry.connection_count(), registered.len());
            prop_assert_eq!(&by_room(&registry), &members);
            prop_assert_eq!(&by_connection(&registry), &members);
            for n in 0..4 {
                let r = room(n);
                let size = members.iter().filter(|(_, m)| *m == r).count();
                prop_assert_eq!(registry.room_size(r), size);
            }
        }
    }

    /// Property: a connection that was never registered can never subscribe
    #[test]
    fn prop_unregistered_cannot_subscribe(c in any::<u64>(), r in any::<u8>()) {
        let mut registry = ConnectionRegistry::new();

        prop_assert!(!registry.subscribe(ConnectionId(c), room(r)));
        prop_assert_eq!(registry.room_size(room(r)), 0);
        prop_assert_eq!(registry.rooms_for_connection(ConnectionId(c)).count(), 0);
    }
}
