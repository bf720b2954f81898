//! Boot, run, crash and end of sessions.

mod common;

use common::Harness;
use gamehost_protocol::WorkerInstruction;
use gamehost_store::{SessionStage, WorkerState, WorkerSlot};
use serde_json::json;

// =========================================================================
// Start
// =========================================================================

#[tokio::test]
async fn test_start_boots_worker_and_moves_members() {
    let mut h = Harness::new();
    let alice = h.player("alice");
    let id = h.create(&alice).await;

    h.start(&alice).await;

    assert_eq!(h.worker_state(0), WorkerState::Run);
    let session = h.engine().store().session(&id).unwrap();
    assert_eq!(session.server_id, WorkerSlot::Assigned(0));
    assert_eq!(h.engine().store().stage_of(session), SessionStage::Running);
    assert_eq!(session.map_id.chosen(), Some("arena"));
    assert_eq!(session.play_mode.chosen(), Some("classic"));

    assert!(h.saw(&alice.id, "Get ready. Your game will start momentarily."));
    assert!(h.saw(&alice.id, "Your game is ready."));
    let moves = h.moves();
    assert_eq!(moves.len(), 1);
    assert_eq!(moves[0].player, alice.id);
    assert_eq!(moves[0].server, "game0");

    let calls = h.runner.state().calls.clone();
    assert_eq!(
        calls,
        vec![
            "base-game.setup colorfall 0 /maps/arena".to_string(),
            "game.start 0 2600".to_string(),
        ]
    );
    h.assert_consistent();
}

#[tokio::test]
async fn test_start_writes_session_config_for_worker() {
    let mut h = Harness::new();
    let alice = h.player("alice");
    let id = h.create(&alice).await;

    h.start(&alice).await;

    let path = h.dir.path().join("run/game0/game_config.json");
    let written: serde_json::Value =
        serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap();
    assert_eq!(written["unique_id"], json!(id.to_string()));
    assert_eq!(written["map_id"], json!("arena"));
    assert_eq!(written["server_id"], json!(0));
}

#[tokio::test]
async fn test_start_setup_failure_discards_session() {
    let mut h = Harness::new();
    let alice = h.player("alice");
    let id = h.create(&alice).await;
    h.runner.state().fail_setup = true;

    h.start(&alice).await;

    assert_eq!(h.worker_state(0), WorkerState::Off);
    assert!(h.engine().store().session(&id).is_none());
    assert_eq!(h.current_game(&alice.id), None);
    assert!(h.saw(&alice.id, "Your game could not be created."));
    assert!(h.moves().is_empty());
    // The start script never ran.
    assert_eq!(h.runner.state().calls.len(), 1);
    h.assert_consistent();
}

#[tokio::test]
async fn test_start_script_failure_discards_session() {
    let mut h = Harness::new();
    let alice = h.player("alice");
    let id = h.create(&alice).await;
    h.runner.state().fail_start = true;

    h.start(&alice).await;

    assert_eq!(h.worker_state(0), WorkerState::Off);
    assert_eq!(h.engine().store().worker(0).unwrap().current_game, None);
    assert!(h.engine().store().session(&id).is_none());
    assert_eq!(h.current_game(&alice.id), None);
    assert!(h.saw(&alice.id, "Your game could not be created."));
    assert!(h.moves().is_empty());
    assert_eq!(h.runner.state().calls.len(), 2);
    h.assert_consistent();
}

#[tokio::test]
async fn test_start_config_write_failure_discards_session() {
    let mut h = Harness::new();
    let alice = h.player("alice");
    let id = h.create(&alice).await;
    // A plain file where the run directory should be.
    std::fs::write(h.dir.path().join("run"), b"").unwrap();

    h.start(&alice).await;

    assert_eq!(h.worker_state(0), WorkerState::Off);
    assert!(h.engine().store().session(&id).is_none());
    assert_eq!(h.current_game(&alice.id), None);
    assert!(h.saw(&alice.id, "Your game could not be created."));
    // Setup ran; the start script did not.
    assert_eq!(h.runner.state().calls, vec!["base-game.setup colorfall 0 /maps/arena".to_string()]);
    h.assert_consistent();
}

#[tokio::test]
async fn test_start_refusals() {
    let mut h = Harness::new();
    let alice = h.player("alice");
    let bob = h.player("bob");
    h.game(&alice, "teams create").await;

    h.game(&alice, "start").await;
    assert!(h.saw(&alice.id, "You need at least 2 players to start."));

    let teams = h.current_game(&alice.id).unwrap();
    h.engine_mut()
        .store_mut()
        .session_mut(&teams)
        .unwrap()
        .min_players = 1;
    h.game(&alice, "start").await;
    assert!(h.saw(&alice.id, "This game has no maps."));

    h.game(&bob, "start").await;
    assert!(h.saw(&bob.id, "Create a game first."));
    assert_eq!(h.worker_state(0), WorkerState::Off);
}

#[tokio::test]
async fn test_start_with_all_workers_busy_is_refused() {
    let mut h = Harness::new();
    let players: Vec<_> = ["a", "b", "c"].iter().map(|n| h.player(n)).collect();
    for p in &players[..2] {
        h.create(p).await;
        h.start(p).await;
    }
    let id = h.create(&players[2]).await;

    h.game(&players[2], "start").await;

    assert!(h.saw(&players[2].id, "Servers are busy right now."));
    assert!(h.engine().store().session(&id).unwrap().is_pending());
    h.assert_consistent();
}

#[tokio::test]
async fn test_started_session_refuses_further_setup() {
    let mut h = Harness::new();
    let alice = h.player("alice");
    h.create(&alice).await;
    h.start(&alice).await;

    h.game(&alice, "map arena").await;

    assert!(h.saw(&alice.id, "Game has already started."));
}

// =========================================================================
// Running sessions
// =========================================================================

#[tokio::test]
async fn test_join_running_session_is_deferred_until_endpoint_connects() {
    let mut h = Harness::new();
    let alice = h.player("alice");
    let bob = h.player("bob");
    let id = h.create(&alice).await;
    h.game(&alice, "public").await;
    h.start(&alice).await;

    h.game(&bob, &format!("{id} join")).await;

    assert!(h.worker_frames("game0").is_empty());
    assert_eq!(h.engine().store().worker(0).unwrap().post_boot_messages.len(), 1);
    // Joining a live game is the worker's call, not ours.
    assert_eq!(h.current_game(&bob.id), None);

    h.transport.connect_endpoint("game0");
    h.handle.endpoint_connected("game0").unwrap();
    h.settle().await;

    assert_eq!(
        h.worker_frames("game0"),
        vec![WorkerInstruction::PlayerJoinGame {
            player: bob.id,
            game: id,
        }]
    );
    assert!(h.engine().store().worker(0).unwrap().post_boot_messages.is_empty());
    h.assert_consistent();
}

#[tokio::test]
async fn test_quit_running_session_tells_worker() {
    let mut h = Harness::new();
    let alice = h.player("alice");
    h.transport.connect_endpoint("game0");
    let id = h.create(&alice).await;
    h.start(&alice).await;

    h.game(&alice, "quit").await;

    assert_eq!(h.current_game(&alice.id), None);
    assert_eq!(
        h.worker_frames("game0"),
        vec![WorkerInstruction::PlayerLeaveGame {
            player: alice.id,
            game: id,
        }]
    );
    h.assert_consistent();
}

#[tokio::test]
async fn test_game_end_releases_worker_and_members() {
    let mut h = Harness::new();
    let alice = h.player("alice");
    let id = h.create(&alice).await;
    h.start(&alice).await;

    h.inbound("game0", json!({ "action": "game_end", "game": id.to_string() }))
        .await;

    assert!(h.engine().store().session(&id).is_none());
    assert_eq!(h.current_game(&alice.id), None);
    assert_eq!(h.worker_state(0), WorkerState::Off);
    h.assert_consistent();
}

#[tokio::test]
async fn test_game_end_after_session_collected_still_releases_worker() {
    let mut h = Harness::new();
    let alice = h.player("alice");
    let id = h.create(&alice).await;
    h.start(&alice).await;
    h.game(&alice, "quit").await;
    h.engine_mut().reconcile().await;
    assert!(h.engine().store().session(&id).is_none());
    assert_eq!(h.worker_state(0), WorkerState::Run);

    h.inbound("game0", json!({ "action": "game_end", "game": id.to_string() }))
        .await;

    assert_eq!(h.worker_state(0), WorkerState::Off);
    assert_eq!(h.engine().store().worker(0).unwrap().current_game, None);
    h.assert_consistent();
}

// =========================================================================
// Crash recovery
// =========================================================================

#[tokio::test]
async fn test_dead_worker_is_recovered_by_reconciliation() {
    let mut h = Harness::new();
    let alice = h.player("alice");
    let id = h.create(&alice).await;
    h.start(&alice).await;

    h.runner.state().dead.insert(0);
    let recovered = h
        .wait_for(|e| e.store().worker(0).unwrap().state == WorkerState::Off)
        .await;

    assert!(recovered);
    assert!(h.engine().store().session(&id).is_none());
    assert_eq!(h.current_game(&alice.id), None);
    h.assert_consistent();
}

#[tokio::test]
async fn test_probe_leaves_live_workers_alone() {
    let mut h = Harness::new();
    let alice = h.player("alice");
    let id = h.create(&alice).await;
    h.start(&alice).await;

    h.engine_mut().reconcile().await;
    h.engine_mut().reconcile().await;

    assert_eq!(h.worker_state(0), WorkerState::Run);
    assert!(h.engine().store().session(&id).is_some());
}
