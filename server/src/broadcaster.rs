//! Fan-out of server messages to registered sessions

use crate::session_registry::SessionRegistry;
use log::warn;
use shared::{ServerMessage, SessionId};

/// Outcome of one broadcast
#[derive(Debug, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Sessions the message was queued for
    pub delivered: usize,
    /// Sessions whose writer had already shut down
    pub failed: Vec<SessionId>,
}

/// Queues `message` for every registered session except `exclude`
///
/// Each recipient is attempted independently: a session whose connection is
/// gone is reported in [`BroadcastReport::failed`] and the rest still receive
/// the message. Queueing never waits on a socket, so a slow peer cannot hold
/// up the caller.
pub fn broadcast(
    registry: &SessionRegistry,
    message: &ServerMessage,
    exclude: Option<SessionId>,
) -> BroadcastReport {
    let line = message.encode();
    let mut report = BroadcastReport::default();

    for session in registry.iter() {
        if Some(session.id) == exclude {
            continue;
        }

        match session.send_line(line.clone()) {
            Ok(()) => report.delivered += 1,
            Err(e) => {
                warn!("Failed to deliver to player {}: {}", session.id, e);
                report.failed.push(session.id);
            }
        }
    }

    report
}
