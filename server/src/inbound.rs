//! Events flowing from connection tasks to the dispatcher

use crate::error::ConnectionError;
use shared::SessionId;
use std::net::SocketAddr;
use tokio::sync::mpsc;

/// Messages sent from the listener and connection tasks to the dispatcher
///
/// A single channel carries all of them, so for any one session the
/// dispatcher sees `Connected`, then its lines in transport order, then
/// `Disconnected`.
#[derive(Debug)]
pub enum InboundEvent {
    Connected {
        id: SessionId,
        addr: SocketAddr,
        outbound: mpsc::UnboundedSender<String>,
    },
    Line {
        id: SessionId,
        line: String,
    },
    Disconnected {
        id: SessionId,
        /// None when the peer closed the connection cleanly
        reason: Option<ConnectionError>,
    },
}

pub type InboundSender = mpsc::UnboundedSender<InboundEvent>;
pub type InboundReceiver = mpsc::UnboundedReceiver<InboundEvent>;

pub fn channel() -> (InboundSender, InboundReceiver) {
    mpsc::unbounded_channel()
}
