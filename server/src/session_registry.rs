//! Session records and the registry that owns them
//!
//! This module tracks every connected Game Client:
//! - Identity (name and chosen character) once `PlayerData` arrives
//! - Readiness for the match gate
//! - The outbound queue feeding the session's transport writer
//!
//! The registry is owned by the dispatcher alone. Connection tasks never
//! touch it; they talk to the dispatcher through the inbound channel, so
//! add, remove and broadcast iteration can never interleave.

use crate::error::ConnectionError;
use log::info;
use shared::{ServerMessage, SessionId};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use tokio::sync::mpsc;

/// Sprite name used in spawn messages for sessions that never sent `PlayerData`
pub const DEFAULT_SPRITE: &str = "Player";

/// Server-side record of one connected client
#[derive(Debug)]
pub struct Session {
    /// Identifier assigned when the connection was accepted
    pub id: SessionId,
    /// Remote address of the transport
    pub addr: SocketAddr,
    /// Display name from `PlayerData`
    pub name: Option<String>,
    /// Character choice from `PlayerData`
    pub character: Option<String>,
    /// Set by `Ready`, never cleared
    pub ready: bool,
    /// Lines queued here are written to the transport by the connection task
    outbound: mpsc::UnboundedSender<String>,
}

impl Session {
    pub fn new(id: SessionId, addr: SocketAddr, outbound: mpsc::UnboundedSender<String>) -> Self {
        Self {
            id,
            addr,
            name: None,
            character: None,
            ready: false,
            outbound,
        }
    }

    pub fn set_identity(&mut self, name: String, character: String) {
        self.name = Some(name);
        self.character = Some(character);
    }

    /// Marks the session ready; returns true only on the first call
    pub fn mark_ready(&mut self) -> bool {
        let changed = !self.ready;
        self.ready = true;
        changed
    }

    /// Sprite announced for this session when the match starts
    pub fn sprite_name(&self) -> &str {
        self.character
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or(DEFAULT_SPRITE)
    }

    /// Queues a message for this session's transport writer
    ///
    /// Never waits on the transport. Fails only when the writer has already
    /// shut down, which means the connection is gone.
    pub fn send(&self, message: &ServerMessage) -> Result<(), ConnectionError> {
        self.send_line(message.encode())
    }

    pub(crate) fn send_line(&self, line: String) -> Result<(), ConnectionError> {
        self.outbound
            .send(line)
            .map_err(|_| ConnectionError::WriterClosed(self.id))
    }
}

/// Authoritative set of connected sessions
///
/// Session ids are handed out in increasing order at accept time, so keying
/// by id makes iteration follow registration order.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: BTreeMap<SessionId, Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a session; returns false if its id is already taken
    pub fn add(&mut self, session: Session) -> bool {
        if self.sessions.contains_key(&session.id) {
            return false;
        }

        info!("Player {} connected from {}", session.id, session.addr);
        self.sessions.insert(session.id, session);
        true
    }

    /// Removes a session, returning it if it was registered
    ///
    /// Dropping the returned session closes its outbound queue, which stops
    /// the writer and closes the transport.
    pub fn remove(&mut self, id: SessionId) -> Option<Session> {
        self.sessions.remove(&id)
    }

    pub fn get(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(&id)
    }

    pub fn get_mut(&mut self, id: SessionId) -> Option<&mut Session> {
        self.sessions.get_mut(&id)
    }

    pub fn contains(&self, id: SessionId) -> bool {
        self.sessions.contains_key(&id)
    }

    /// Sessions in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.sessions.values()
    }

    /// True when at least one session is registered and all are ready
    pub fn all_ready(&self) -> bool {
        !self.sessions.is_empty() && self.sessions.values().all(|session| session.ready)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
