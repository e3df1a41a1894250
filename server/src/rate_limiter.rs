//! Broadcast rate limiting
//!
//! Position and Attack relays, including the spawn positions sent when a
//! match starts, are only emitted if enough time has passed since the last
//! emission under the same limiter key. Suppressed broadcasts are dropped,
//! never queued: a newer update supersedes them anyway.
//!
//! With the default [`RateLimitScope::Global`] scope there is a single key
//! for the whole server, so an Attack from one client can suppress a Position
//! from another that was due at the same moment.

use serde::Deserialize;
use shared::{MessageKind, SessionId};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Which broadcasts share a `lastEmit` timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum RateLimitScope {
    /// One timestamp for every sender and message kind
    Global,
    /// One timestamp per sender
    PerSession,
    /// One timestamp per sender and message kind
    PerSessionKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum RateKey {
    Global,
    Session(SessionId),
    SessionKind(SessionId, MessageKind),
}

#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    scope: RateLimitScope,
    last_emit: HashMap<RateKey, Instant>,
}

impl RateLimiter {
    pub fn new(interval: Duration, scope: RateLimitScope) -> Self {
        Self {
            interval,
            scope,
            last_emit: HashMap::new(),
        }
    }

    /// Claims an emission slot for `sender`'s broadcast of `kind`
    ///
    /// Returns true, and records `now` as the last emission, when at least
    /// `interval` has elapsed since the previous emission under the same key.
    pub fn try_acquire(&mut self, sender: SessionId, kind: MessageKind, now: Instant) -> bool {
        let key = self.key_for(sender, kind);

        if let Some(last) = self.last_emit.get(&key) {
            if now.saturating_duration_since(*last) < self.interval {
                return false;
            }
        }

        self.last_emit.insert(key, now);
        true
    }

    /// Drops per-session state for a session that has left
    pub fn forget(&mut self, session: SessionId) {
        self.last_emit.retain(|key, _| match key {
            RateKey::Global => true,
            RateKey::Session(id) | RateKey::SessionKind(id, _) => *id != session,
        });
    }

    fn key_for(&self, sender: SessionId, kind: MessageKind) -> RateKey {
        match self.scope {
            RateLimitScope::Global => RateKey::Global,
            RateLimitScope::PerSession => RateKey::Session(sender),
            RateLimitScope::PerSessionKind => RateKey::SessionKind(sender, kind),
        }
    }
}
