//! Standard invariant checks.
//!
//! These invariants capture behavioral properties that must always hold.
//! They verify WHAT must be true, not specific test scenarios.

use std::collections::BTreeSet;

use super::{Invariant, InvariantResult, SystemSnapshot};

/// A session never lists its own host as a viewer.
pub struct HostNeverViewer;

impl Invariant for HostNeverViewer {
    fn name(&self) -> &'static str {
        "host_never_viewer"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for session in &state.sessions {
            if session.viewers.contains(&session.host) {
                return Err(self.violation(format!(
                    "session {}: host {} is in its viewer set",
                    session.id, session.host
                )));
            }
        }
        Ok(())
    }
}

/// The room of a session holds exactly its host and its viewers.
///
/// A member outside the roles would receive chat and counts it should not;
/// a role outside the room would miss them.
pub struct RoomMatchesRoles;

impl Invariant for RoomMatchesRoles {
    fn name(&self) -> &'static str {
        "room_matches_roles"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for session in &state.sessions {
            let mut expected = session.viewers.clone();
            expected.insert(session.host);

            if session.room != expected {
                return Err(self.violation(format!(
                    "session {}: room {:?} but host+viewers {:?}",
                    session.id, session.room, expected
                )));
            }
        }
        Ok(())
    }
}

/// Ended sessions leave no subscriptions behind.
pub struct NoOrphanRooms;

impl Invariant for NoOrphanRooms {
    fn name(&self) -> &'static str {
        "no_orphan_rooms"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        let live: BTreeSet<_> = state.sessions.iter().map(|s| s.id).collect();
        match state.subscribed_rooms.difference(&live).next() {
            Some(orphan) => Err(self.violation(format!("room {orphan} has no session"))),
            None => Ok(()),
        }
    }
}

/// Hosts and viewers are registered connections.
///
/// A disconnect must remove the connection from every role it held.
pub struct ParticipantsConnected;

impl Invariant for ParticipantsConnected {
    fn name(&self) -> &'static str {
        "participants_connected"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for session in &state.sessions {
            if !state.connections.contains(&session.host) {
                return Err(self.violation(format!(
                    "session {}: host {} is not connected",
                    session.id, session.host
                )));
            }
            if let Some(gone) = session.viewers.difference(&state.connections).next() {
                return Err(self.violation(format!(
                    "session {}: viewer {gone} is not connected",
                    session.id
                )));
            }
        }
        Ok(())
    }
}

/// The last viewer count announced for a session equals its real count.
pub struct ReportedCountIsTrue;

impl Invariant for ReportedCountIsTrue {
    fn name(&self) -> &'static str {
        "reported_count_is_true"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for session in &state.sessions {
            let actual = session.viewers.len();
            if session.reported_count != Some(actual) {
                return Err(self.violation(format!(
                    "session {}: announced {:?}, actual {}",
                    session.id, session.reported_count, actual
                )));
            }
        }
        Ok(())
    }
}
