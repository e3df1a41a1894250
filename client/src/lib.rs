//! # Relay Protocol Client
//!
//! Headless client for the lobby relay server. It speaks the same
//! line-oriented text protocol as the graphical Game Client and is used for
//! scripted load, manual testing and the workspace integration tests.
//!
//! ## What It Does
//! - Connects over TCP and frames the byte stream into protocol lines
//! - Sends `PlayerData`, `Ready`, `Position` and `Attack` commands
//! - Decodes relayed updates, spawn positions and the match announcement
//!
//! ## What It Leaves Out
//! Rendering, input capture, and resolving received attacks against local
//! physics all belong to the Game Client. Callers react to the
//! [`shared::ServerMessage`] values this crate yields however they like.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::RelayClient;
//! use shared::{PositionUpdate, ServerMessage};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = RelayClient::connect("127.0.0.1:5000").await?;
//!     client.join("Alice", "Knight").await?;
//!     client.ready().await?;
//!
//!     while let Some(message) = client.next_message().await? {
//!         if message == ServerMessage::GameBegins {
//!             client
//!                 .send_position(PositionUpdate::new(1.0, 0.0, true, "Knight"))
//!                 .await?;
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod network;

pub use network::{ClientError, RelayClient};
