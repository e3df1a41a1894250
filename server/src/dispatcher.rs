//! Single consumer of inbound events and sole owner of relay state
//!
//! Every connection task funnels its lines into one channel, and exactly one
//! dispatcher drains it. Session registration, identity, readiness, the match
//! gate and the rate limiter are only ever touched here, so commands from
//! different sessions are applied one at a time in arrival order.
//!
//! The inbound channel is unbounded and the pacing delay caps throughput at
//! one event per delay while a backlog exists (20 per second at the default
//! 50 ms). Clients that together send faster than that build an ever-growing
//! queue and rising relay latency; lower `dispatch_pacing_ms` for busier
//! lobbies.

use crate::broadcaster::broadcast;
use crate::inbound::{InboundEvent, InboundReceiver};
use crate::match_gate::MatchGate;
use crate::rate_limiter::RateLimiter;
use crate::session_registry::{Session, SessionRegistry};
use log::{debug, info, warn};
use shared::{ClientCommand, MessageKind, PositionUpdate, ServerMessage, SessionId};
use std::time::{Duration, Instant};
use tokio::sync::mpsc::error::TryRecvError;

pub struct Dispatcher {
    registry: SessionRegistry,
    match_gate: MatchGate,
    rate_limiter: RateLimiter,
    pacing: Duration,
}

impl Dispatcher {
    pub fn new(rate_limiter: RateLimiter, pacing: Duration) -> Self {
        Self {
            registry: SessionRegistry::new(),
            match_gate: MatchGate::new(),
            rate_limiter,
            pacing,
        }
    }

    /// Drains the inbound channel until every sender has gone
    ///
    /// While more events are already queued, each dispatch is followed by the
    /// configured pacing delay; an empty queue is waited on without delay.
    pub async fn run(mut self, mut inbound: InboundReceiver) {
        info!("Dispatcher started");

        let mut next = inbound.recv().await;
        while let Some(event) = next {
            self.handle_event(event, Instant::now());

            next = match inbound.try_recv() {
                Ok(event) => {
                    if !self.pacing.is_zero() {
                        tokio::time::sleep(self.pacing).await;
                    }
                    Some(event)
                }
                Err(TryRecvError::Empty) => inbound.recv().await,
                Err(TryRecvError::Disconnected) => None,
            };
        }

        info!("Dispatcher stopped");
    }

    /// Applies one inbound event to relay state
    pub fn handle_event(&mut self, event: InboundEvent, now: Instant) {
        match event {
            InboundEvent::Connected { id, addr, outbound } => {
                if !self.registry.add(Session::new(id, addr, outbound)) {
                    warn!("Player id {} already registered, dropping connection from {}", id, addr);
                }
            }
            InboundEvent::Line { id, line } => self.handle_line(id, &line, now),
            InboundEvent::Disconnected { id, reason } => {
                let reason = match reason {
                    Some(e) => e.to_string(),
                    None => "closed by peer".to_string(),
                };
                self.remove_session(id, &reason, now);
            }
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn match_started(&self) -> bool {
        self.match_gate.has_started()
    }

    fn handle_line(&mut self, id: SessionId, line: &str, now: Instant) {
        if !self.registry.contains(id) {
            debug!("Dropping line from unregistered player {}", id);
            return;
        }

        let command = match ClientCommand::parse(line) {
            Ok(command) => command,
            Err(e) => {
                warn!("Dropping malformed line from player {}: {} ({:?})", id, e, line);
                return;
            }
        };

        match command {
            ClientCommand::PlayerData { name, character } => {
                self.handle_player_data(id, name, character, now)
            }
            ClientCommand::Ready => self.handle_ready(id, now),
            ClientCommand::Position(update) => {
                let message = ServerMessage::Position { update, sender: id };
                self.relay(id, MessageKind::Position, message, now)
            }
            ClientCommand::Attack(update) => {
                let message = ServerMessage::Attack { update, sender: id };
                self.relay(id, MessageKind::Attack, message, now)
            }
        }
    }

    fn handle_player_data(&mut self, id: SessionId, name: String, character: String, now: Instant) {
        let Some(session) = self.registry.get_mut(id) else {
            return;
        };

        info!("Player {} is {} playing {}", id, name, character);
        session.set_identity(name, character);

        if let Err(e) = session.send(&ServerMessage::SuccessPlayerConnect) {
            warn!("Failed to confirm player data for {}: {}", id, e);
            self.remove_session(id, "write failed", now);
        }
    }

    fn handle_ready(&mut self, id: SessionId, now: Instant) {
        let Some(session) = self.registry.get_mut(id) else {
            return;
        };

        if session.mark_ready() {
            info!("Player {} ready!", id);
        } else {
            debug!("Player {} sent Ready again", id);
        }

        if self.match_gate.evaluate(&self.registry) {
            self.start_match(now);
        }
    }

    /// Announces spawn points for every session, then starts the match
    fn start_match(&mut self, now: Instant) {
        let assignments: Vec<(SessionId, PositionUpdate)> = self
            .registry
            .iter()
            .enumerate()
            .map(|(index, session)| (session.id, PositionUpdate::spawn(index, session.sprite_name())))
            .collect();

        info!("All {} players ready, starting match", assignments.len());

        for (id, update) in assignments {
            debug!("Player {} spawns at ({}, {})", id, update.x, update.y);
            let message = ServerMessage::Position { update, sender: id };
            self.relay(id, MessageKind::Position, message, now);
        }

        self.deliver(&ServerMessage::GameBegins, None, now);
    }

    /// Broadcasts a rate-limited update to everyone except `sender`
    fn relay(&mut self, sender: SessionId, kind: MessageKind, message: ServerMessage, now: Instant) {
        if !self.rate_limiter.try_acquire(sender, kind, now) {
            debug!("Rate limited {:?} from player {}", kind, sender);
            return;
        }
        self.deliver(&message, Some(sender), now);
    }

    fn deliver(&mut self, message: &ServerMessage, exclude: Option<SessionId>, now: Instant) {
        let report = broadcast(&self.registry, message, exclude);
        debug!("Queued {:?} for {} players", message, report.delivered);
        for id in report.failed {
            self.remove_session(id, "write failed", now);
        }
    }

    /// Drops a session; the rest may now all be ready, so the gate is re-checked
    fn remove_session(&mut self, id: SessionId, reason: &str, now: Instant) {
        if self.registry.remove(id).is_none() {
            return;
        }
        self.rate_limiter.forget(id);
        info!("Player {} disconnected ({})", id, reason);

        if self.match_gate.evaluate(&self.registry) {
            self.start_match(now);
        }
    }
}
