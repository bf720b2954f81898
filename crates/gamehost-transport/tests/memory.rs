//! Tests for the in-memory transport.

use gamehost_protocol::PlayerId;
use gamehost_transport::{MemoryTransport, OnlinePlayer, Transport, TransportError};

fn player(n: u128, name: &str, endpoint: &str) -> OnlinePlayer {
    OnlinePlayer {
        id: PlayerId(uuid::Uuid::from_u128(n)),
        name: name.into(),
        endpoint: endpoint.into(),
    }
}

#[test]
fn test_send_to_unknown_endpoint_is_not_connected() {
    let transport = MemoryTransport::new();
    let result = transport.send("game0", "minigames", b"{}");
    assert!(matches!(result, Err(TransportError::NotConnected(e)) if e == "game0"));
    assert!(transport.frames().is_empty());
}

#[test]
fn test_send_to_connected_endpoint_records_frame() {
    let transport = MemoryTransport::new();
    transport.connect_endpoint("game0");

    transport.send("game0", "minigames", b"hello").unwrap();

    let frames = transport.frames();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].endpoint.as_deref(), Some("game0"));
    assert_eq!(frames[0].data, b"hello");
}

#[test]
fn test_broadcast_records_frame_without_endpoint() {
    let transport = MemoryTransport::new();
    transport.broadcast("PLAYER_MESSAGE", b"x").unwrap();
    let frames = transport.frames_on("PLAYER_MESSAGE");
    assert_eq!(frames.len(), 1);
    assert!(frames[0].endpoint.is_none());
}

#[test]
fn test_add_player_moves_between_endpoints() {
    let transport = MemoryTransport::new();
    transport.add_player(player(1, "alice", "hub"));
    transport.add_player(player(1, "alice", "game0"));

    let online = transport.online_players();
    assert_eq!(online.len(), 1);
    assert_eq!(online[0].endpoint, "game0");
    assert!(transport.is_connected("hub"));
}

#[test]
fn test_disconnect_endpoint_drops_players() {
    let transport = MemoryTransport::new();
    transport.add_player(player(1, "alice", "hub"));
    transport.disconnect_endpoint("hub");
    assert!(transport.online_players().is_empty());
    assert!(!transport.is_connected("hub"));
}

#[test]
fn test_clones_share_frames_and_take_clears() {
    let transport = MemoryTransport::new();
    let observer = transport.clone();
    transport.broadcast("c", b"1").unwrap();
    assert_eq!(observer.take_frames().len(), 1);
    assert!(transport.frames().is_empty());
}
