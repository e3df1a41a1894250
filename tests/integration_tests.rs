//! Integration tests for the relay server
//!
//! Each test starts a real server on an ephemeral loopback port and drives it
//! with protocol clients over TCP.

use client::RelayClient;
use server::config::RelayConfig;
use server::network::Server;
use shared::{PositionUpdate, ServerMessage};
use std::net::SocketAddr;
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout, Duration};

const RECEIVE_TIMEOUT: Duration = Duration::from_secs(2);

// HELPER FUNCTIONS

async fn start_server(broadcast_interval_ms: u64) -> SocketAddr {
    let config = RelayConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        broadcast_interval_ms,
        dispatch_pacing_ms: 0,
        ..RelayConfig::default()
    };

    let server = Server::bind(config).await.expect("Failed to bind server");
    let addr = server.local_addr().expect("Failed to read server address");
    tokio::spawn(server.run());
    addr
}

async fn connect(addr: SocketAddr) -> RelayClient<TcpStream> {
    RelayClient::connect(&addr.to_string())
        .await
        .expect("Failed to connect")
}

/// Connects and waits for the join confirmation, so the session is known
/// to be registered before the caller continues
async fn joined(addr: SocketAddr, name: &str, character: &str) -> RelayClient<TcpStream> {
    let mut client = connect(addr).await;
    client.join(name, character).await.unwrap();
    assert_eq!(expect_line(&mut client).await, "SuccessPlayerConnect");
    client
}

async fn expect_line(client: &mut RelayClient<TcpStream>) -> String {
    timeout(RECEIVE_TIMEOUT, client.next_line())
        .await
        .expect("Timed out waiting for a line")
        .expect("Transport error")
        .expect("Server closed the connection")
}

async fn expect_silence(client: &mut RelayClient<TcpStream>, wait: Duration) {
    if let Ok(result) = timeout(wait, client.next_line()).await {
        panic!("Expected no traffic, got {:?}", result);
    }
}

/// MATCH START TESTS
mod match_tests {
    use super::*;

    /// Two sessions join, both ready, each sees the other's spawn and the
    /// announcement
    #[tokio::test]
    async fn two_player_match_start() {
        let addr = start_server(0).await;

        let mut alice = joined(addr, "Alice", "Knight").await;
        let mut bob = connect(addr).await;

        alice.ready().await.unwrap();
        // Let Alice's Ready land first so Bob's completes the gate
        sleep(Duration::from_millis(50)).await;
        bob.ready().await.unwrap();

        assert_eq!(expect_line(&mut alice).await, "Position:3;0;True;Player;2");
        assert_eq!(expect_line(&mut alice).await, "The game begins!");

        assert_eq!(expect_line(&mut bob).await, "Position:0;0;True;Knight;1");
        assert_eq!(expect_line(&mut bob).await, "The game begins!");
    }

    /// The gate opens exactly once, and only after every session is ready
    #[tokio::test]
    async fn gate_waits_for_all_and_fires_once() {
        let addr = start_server(0).await;

        let mut clients = Vec::new();
        for i in 0..4 {
            clients.push(joined(addr, &format!("P{}", i), "Mage").await);
        }

        for client in clients.iter_mut().take(3) {
            client.ready().await.unwrap();
        }
        expect_silence(&mut clients[0], Duration::from_millis(150)).await;

        clients[3].ready().await.unwrap();

        for client in clients.iter_mut() {
            let mut spawns = 0;
            loop {
                let line = expect_line(client).await;
                if line == "The game begins!" {
                    break;
                }
                assert!(line.starts_with("Position:"), "Unexpected line {:?}", line);
                spawns += 1;
            }
            assert_eq!(spawns, 3);
        }

        // A repeated Ready does not restart the match
        clients[0].ready().await.unwrap();
        for client in clients.iter_mut() {
            expect_silence(client, Duration::from_millis(100)).await;
        }
    }

    /// The gate only considers sessions that are still connected
    #[tokio::test]
    async fn late_joiner_after_start_only_sees_relays() {
        let addr = start_server(0).await;

        let mut alice = joined(addr, "Alice", "Knight").await;
        alice.ready().await.unwrap();
        assert_eq!(expect_line(&mut alice).await, "The game begins!");

        let mut bob = joined(addr, "Bob", "Mage").await;
        bob.ready().await.unwrap();
        expect_silence(&mut bob, Duration::from_millis(100)).await;

        alice
            .send_position(PositionUpdate::new(1.0, 2.0, true, "Knight"))
            .await
            .unwrap();
        assert_eq!(expect_line(&mut bob).await, "Position:1;2;True;Knight;1");
    }
}

/// RELAY TESTS
mod relay_tests {
    use super::*;

    /// A Position reaches every other session verbatim with the sender id
    #[tokio::test]
    async fn position_relayed_verbatim() {
        let addr = start_server(0).await;

        let mut a = joined(addr, "A", "Knight").await;
        let mut b = joined(addr, "B", "Mage").await;
        let mut c = joined(addr, "C", "Rogue").await;

        a.send_raw("Position:-1.250;+3;true;Hero_Knight\n").await.unwrap();

        assert_eq!(expect_line(&mut b).await, "Position:-1.250;+3;true;Hero_Knight;1");
        assert_eq!(expect_line(&mut c).await, "Position:-1.250;+3;true;Hero_Knight;1");
        expect_silence(&mut a, Duration::from_millis(100)).await;
    }

    /// Attacks relay the same way
    #[tokio::test]
    async fn attack_relayed_with_sender() {
        let addr = start_server(0).await;

        let mut a = joined(addr, "A", "Knight").await;
        let mut b = joined(addr, "B", "Mage").await;

        b.send_raw("Attack:1;2;25;False;1.5\n").await.unwrap();

        match timeout(RECEIVE_TIMEOUT, a.next_message()).await.unwrap().unwrap() {
            Some(ServerMessage::Attack { update, sender }) => {
                assert_eq!(sender, 2);
                assert_eq!(update.payload(), "1;2;25;False;1.5");
            }
            other => panic!("Unexpected message: {:?}", other),
        }
    }

    /// Updates inside one interval yield one broadcast; the rest are dropped
    #[tokio::test]
    async fn rate_limited_updates_are_dropped() {
        let addr = start_server(400).await;

        let mut a = joined(addr, "A", "Knight").await;
        let mut b = joined(addr, "B", "Mage").await;

        a.send_raw("Position:1;0;True;Knight\nPosition:2;0;True;Knight\n")
            .await
            .unwrap();
        b.send_raw("Attack:0;0;5;True;1\n").await.unwrap();

        assert_eq!(expect_line(&mut b).await, "Position:1;0;True;Knight;1");
        expect_silence(&mut b, Duration::from_millis(200)).await;
        expect_silence(&mut a, Duration::from_millis(50)).await;

        sleep(Duration::from_millis(250)).await;
        a.send_raw("Position:3;0;True;Knight\n").await.unwrap();
        assert_eq!(expect_line(&mut b).await, "Position:3;0;True;Knight;1");
    }

    /// Lines split across TCP segments are reassembled
    #[tokio::test]
    async fn fragmented_line_reassembled() {
        let addr = start_server(0).await;

        let mut a = joined(addr, "A", "Knight").await;
        let mut b = joined(addr, "B", "Mage").await;

        a.send_raw("Posi").await.unwrap();
        sleep(Duration::from_millis(30)).await;
        a.send_raw("tion:4;5;False;Kni").await.unwrap();
        sleep(Duration::from_millis(30)).await;
        a.send_raw("ght\n").await.unwrap();

        assert_eq!(expect_line(&mut b).await, "Position:4;5;False;Knight;1");
    }

    /// Several commands in one write are all applied in order
    #[tokio::test]
    async fn batched_commands_in_one_write() {
        let addr = start_server(0).await;

        let mut a = connect(addr).await;
        a.send_raw("PlayerData:Solo;Knight\nReady\n").await.unwrap();

        assert_eq!(expect_line(&mut a).await, "SuccessPlayerConnect");
        assert_eq!(expect_line(&mut a).await, "The game begins!");
    }
}

/// ERROR HANDLING TESTS
mod error_tests {
    use super::*;

    /// Malformed lines are dropped without a reply or a disconnect
    #[tokio::test]
    async fn malformed_position_is_dropped() {
        let addr = start_server(0).await;

        let mut a = joined(addr, "A", "Knight").await;
        let mut b = joined(addr, "B", "Mage").await;

        a.send_raw("Position:1;2;True\n").await.unwrap();
        a.send_raw("Position:x;2;True;Knight\n").await.unwrap();
        a.send_raw("Dance:1\n").await.unwrap();
        a.send_raw("PlayerData:OnlyName\n").await.unwrap();
        expect_silence(&mut b, Duration::from_millis(100)).await;
        expect_silence(&mut a, Duration::from_millis(50)).await;

        // Both directions still work for the sender
        a.send_raw("Position:1;2;True;Knight\n").await.unwrap();
        assert_eq!(expect_line(&mut b).await, "Position:1;2;True;Knight;1");

        b.send_raw("Position:7;8;False;Mage\n").await.unwrap();
        assert_eq!(expect_line(&mut a).await, "Position:7;8;False;Mage;2");
    }

    /// A departed session no longer receives broadcasts and does not
    /// disturb the others
    #[tokio::test]
    async fn disconnected_session_is_removed() {
        let addr = start_server(0).await;

        let mut a = joined(addr, "A", "Knight").await;
        let mut b = joined(addr, "B", "Mage").await;
        let c = joined(addr, "C", "Rogue").await;
        drop(c);
        sleep(Duration::from_millis(100)).await;

        a.send_raw("Position:1;1;True;Knight\n").await.unwrap();
        assert_eq!(expect_line(&mut b).await, "Position:1;1;True;Knight;1");

        let mut d = joined(addr, "D", "Archer").await;
        b.send_raw("Position:2;2;True;Mage\n").await.unwrap();
        assert_eq!(expect_line(&mut a).await, "Position:2;2;True;Mage;2");
        assert_eq!(expect_line(&mut d).await, "Position:2;2;True;Mage;2");
    }

    /// The last unready session leaving starts the match for the rest
    #[tokio::test]
    async fn departed_unready_session_starts_match() {
        let addr = start_server(0).await;

        let mut a = joined(addr, "A", "Knight").await;
        let mut b = joined(addr, "B", "Mage").await;
        let c = joined(addr, "C", "Rogue").await;

        a.ready().await.unwrap();
        b.ready().await.unwrap();
        expect_silence(&mut a, Duration::from_millis(100)).await;

        drop(c);

        assert_eq!(expect_line(&mut a).await, "Position:3;0;True;Mage;2");
        assert_eq!(expect_line(&mut a).await, "The game begins!");
        assert_eq!(expect_line(&mut b).await, "Position:0;0;True;Knight;1");
        assert_eq!(expect_line(&mut b).await, "The game begins!");
    }

    /// A session streaming bytes without a terminator is cut off
    #[tokio::test]
    async fn overlong_line_ends_only_that_session() {
        let addr = start_server(0).await;

        let mut a = joined(addr, "A", "Knight").await;
        let mut b = joined(addr, "B", "Mage").await;

        let flood = "x".repeat(shared::DEFAULT_MAX_LINE_LENGTH + 1);
        // The server may close mid-write, so the write result is not checked
        let _ = a.send_raw(&flood).await;

        let closed = timeout(RECEIVE_TIMEOUT, a.next_line())
            .await
            .expect("Timed out waiting for the server to close");
        assert!(matches!(closed, Ok(None) | Err(_)));

        let mut c = joined(addr, "C", "Rogue").await;
        b.send_raw("Position:1;1;True;Mage\n").await.unwrap();
        assert_eq!(expect_line(&mut c).await, "Position:1;1;True;Mage;2");
    }
}
