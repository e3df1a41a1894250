//! # Lobby Relay Server Library
//!
//! This library provides the authoritative relay for the multiplayer lobby.
//! It accepts TCP connections from Game Clients, tracks who is connected and
//! who is ready, starts the match once everyone is ready, and relays
//! Position and Attack updates between clients at a bounded rate.
//!
//! Rendering, input, physics and combat resolution all stay on the clients;
//! the relay never interprets an update beyond validating its fields.
//!
//! ## Architecture
//!
//! ### Single Owning Dispatcher
//! All relay state (the session registry, the match gate and the rate
//! limiter) belongs to one dispatcher task. Connection tasks never touch it;
//! they forward decoded lines through a single channel, so commands from all
//! clients are applied one at a time in arrival order and no locking is
//! needed.
//!
//! ### Per-Connection Tasks
//! Each accepted socket is split into a reader, which frames incoming bytes
//! into lines, and a writer, which drains a per-session outbound queue.
//! Broadcasting only queues lines, so a slow or dead peer cannot stall the
//! dispatcher or other sessions. When either half fails the session is
//! removed and its socket closed.
//!
//! ### Rate-Limited Relay
//! Position and Attack relays, and the spawn positions sent at match start,
//! pass through a rate limiter. By default one timestamp is shared by all
//! clients and both kinds; per-session and per-session-and-kind scopes are
//! available through configuration.
//!
//! ## Module Organization
//!
//! - `config`: layered configuration (defaults, TOML file, CLI)
//! - `session_registry`: per-connection session records and their registry
//! - `match_gate`: one-shot readiness gate
//! - `rate_limiter`: broadcast pacing
//! - `broadcaster`: fan-out with per-recipient failure isolation
//! - `inbound`: events from connection tasks to the dispatcher
//! - `dispatcher`: the single consumer applying commands
//! - `connection`: per-connection read and write loops
//! - `network`: listener and task wiring
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::RelayConfig;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Listens on 0.0.0.0:5000 with a 200ms global broadcast interval
//!     let server = Server::bind(RelayConfig::default()).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod broadcaster;
pub mod config;
pub mod connection;
pub mod dispatcher;
pub mod error;
pub mod inbound;
pub mod match_gate;
pub mod network;
pub mod rate_limiter;
pub mod session_registry;
