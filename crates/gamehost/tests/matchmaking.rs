//! Player command scenarios for Pending sessions.

mod common;

use common::Harness;
use gamehost_store::Selection;

// =========================================================================
// Create
// =========================================================================

#[tokio::test]
async fn test_create_makes_owner_sole_member() {
    let mut h = Harness::new();
    let alice = h.player("alice");

    let id = h.create(&alice).await;

    let session = h.engine().store().session(&id).unwrap();
    assert_eq!(session.owner, alice.id);
    assert_eq!(session.members, vec![alice.id]);
    assert!(session.is_pending());
    assert!(!session.public);
    assert!(h.saw(&alice.id, "Colorfall Game Setup"));
}

#[tokio::test]
async fn test_create_while_in_game_is_refused() {
    let mut h = Harness::new();
    let alice = h.player("alice");
    h.create(&alice).await;

    h.game(&alice, "cf create").await;

    assert_eq!(h.engine().store().sessions().count(), 1);
    assert!(h.saw(&alice.id, "You are already in a game."));
}

#[tokio::test]
async fn test_unknown_game_is_refused() {
    let mut h = Harness::new();
    let alice = h.player("alice");

    h.game(&alice, "nosuchgame").await;

    assert!(h.saw(&alice.id, "Unknown game: nosuchgame"));
}

#[tokio::test]
async fn test_menu_lists_templates_when_not_in_game() {
    let mut h = Harness::new();
    let alice = h.player("alice");

    h.game(&alice, "").await;

    assert!(h.saw(&alice.id, "Games Menu"));
    assert!(h.saw(&alice.id, "[CF] Colorfall"));
}

#[tokio::test]
async fn test_other_commands_are_not_routed() {
    let h = Harness::new();
    let alice = h.player("alice");

    let args = vec!["msg".to_string(), "bob".to_string()];
    h.handle
        .handle_remote_command(alice.clone(), &alice.endpoint, &args)
        .unwrap();

    assert_eq!(h.daemon.queued(), 0);
}

// =========================================================================
// Invite / join
// =========================================================================

#[tokio::test]
async fn test_invite_then_accept_moves_invitee_to_members() {
    let mut h = Harness::new();
    let alice = h.player("alice");
    let bob = h.player("bob");
    let id = h.create(&alice).await;

    h.game(&alice, "invite bob").await;

    assert!(h.saw(&bob.id, "alice invited you to a game of Colorfall."));
    assert!(h.saw(&alice.id, "Invited bob to this game."));
    assert!(h.engine().store().session(&id).unwrap().is_invited(&bob.id));

    h.game(&bob, &format!("{id} join")).await;

    let session = h.engine().store().session(&id).unwrap();
    assert_eq!(session.members, vec![alice.id, bob.id]);
    assert!(session.invitees.is_empty());
    assert_eq!(h.current_game(&bob.id), Some(id));
    assert!(h.saw(&alice.id, "bob has joined your game."));
}

#[tokio::test]
async fn test_invite_refusals() {
    let mut h = Harness::new();
    let alice = h.player("alice");
    let bob = h.player("bob");
    let carol = h.player("carol");
    h.create(&alice).await;
    h.create(&carol).await;

    h.game(&alice, "invite zed").await;
    assert!(h.saw(&alice.id, "Player not found: zed"));

    h.game(&alice, "invite carol").await;
    assert!(h.saw(&alice.id, "carol is already in a game."));

    h.game(&alice, "invite bob").await;
    h.game(&alice, "invite bob").await;
    assert!(h.saw(&alice.id, "bob is already invited."));
}

#[tokio::test]
async fn test_private_session_is_hidden_until_invited() {
    let mut h = Harness::new();
    let alice = h.player("alice");
    let bob = h.player("bob");
    let id = h.create(&alice).await;

    h.game(&bob, &format!("{id} info")).await;
    h.game(&bob, &format!("{id} join")).await;

    assert_eq!(
        h.chat(&bob.id)
            .iter()
            .filter(|l| l.contains("Game not found."))
            .count(),
        2
    );
    assert_eq!(h.current_game(&bob.id), None);

    h.game(&alice, "invite bob").await;
    h.game(&bob, &id.to_string()).await;
    assert!(h.saw(&bob.id, "Colorfall Game Setup"));
}

#[tokio::test]
async fn test_modify_commands_require_ownership() {
    let mut h = Harness::new();
    let alice = h.player("alice");
    let bob = h.player("bob");
    let carol = h.player("carol");
    let id = h.create(&alice).await;
    h.game(&alice, "public").await;
    h.game(&bob, &format!("{id} j")).await;

    h.game(&bob, "map arena").await;
    h.game(&carol, "public").await;

    assert!(h.saw(&bob.id, "You cannot modify this game."));
    assert!(h.saw(&carol.id, "Create a game first."));
    assert_eq!(
        h.engine().store().session(&id).unwrap().map_id,
        Selection::RandomAtBoot
    );
}

// =========================================================================
// Public / template join
// =========================================================================

#[tokio::test]
async fn test_public_announces_to_idle_players() {
    let mut h = Harness::new();
    let alice = h.player("alice");
    let bob = h.player("bob");
    let carol = h.player("carol");
    h.create(&carol).await;
    let id = h.create(&alice).await;

    h.game(&alice, "public").await;

    assert!(h.engine().store().session(&id).unwrap().public);
    assert!(h.saw(&bob.id, "alice opened a game of Colorfall."));
    assert!(!h.saw(&carol.id, "opened a game"));

    h.game(&alice, "public").await;
    assert!(h.saw(&alice.id, "Game is already public."));
}

#[tokio::test]
async fn test_join_by_template_prefers_open_public_session() {
    let mut h = Harness::new();
    let alice = h.player("alice");
    let bob = h.player("bob");
    let id = h.create(&alice).await;
    h.game(&alice, "public").await;

    h.game(&bob, "cf join").await;

    assert_eq!(h.current_game(&bob.id), Some(id));
    assert_eq!(h.engine().store().sessions().count(), 1);
}

#[tokio::test]
async fn test_join_by_template_creates_when_nothing_open() {
    let mut h = Harness::new();
    let alice = h.player("alice");
    let bob = h.player("bob");
    h.create(&alice).await;

    h.game(&bob, "colorfall join").await;

    let bobs = h.current_game(&bob.id).unwrap();
    let session = h.engine().store().session(&bobs).unwrap();
    assert_eq!(session.owner, bob.id);
    assert_eq!(h.engine().store().sessions().count(), 2);
}

#[tokio::test]
async fn test_spectate_by_template_with_nothing_open_is_refused() {
    let mut h = Harness::new();
    let bob = h.player("bob");

    h.game(&bob, "colorfall spectate").await;

    assert!(h.saw(&bob.id, "There is no open game to spectate."));
    assert_eq!(h.engine().store().sessions().count(), 0);
}

#[tokio::test]
async fn test_spectate_pending_session_adds_spectator_member() {
    let mut h = Harness::new();
    let alice = h.player("alice");
    let bob = h.player("bob");
    let id = h.create(&alice).await;
    h.game(&alice, "public").await;

    h.game(&bob, &format!("{id} spec")).await;

    let session = h.engine().store().session(&id).unwrap();
    assert!(session.is_member(&bob.id));
    assert!(session.is_spectator(&bob.id));
}

#[tokio::test]
async fn test_join_closed_session_is_refused() {
    let mut h = Harness::new();
    let alice = h.player("alice");
    let bob = h.player("bob");
    let id = h.create(&alice).await;
    h.game(&alice, "public").await;
    h.engine_mut()
        .store_mut()
        .session_mut(&id)
        .unwrap()
        .players_may_join = false;

    h.game(&bob, &format!("{id} join")).await;

    assert!(h.saw(&bob.id, "This game does not accept new players."));
    assert_eq!(h.current_game(&bob.id), None);
}

// =========================================================================
// Map / mode
// =========================================================================

#[tokio::test]
async fn test_select_map_and_mode() {
    let mut h = Harness::new();
    let alice = h.player("alice");
    let id = h.create(&alice).await;

    h.game(&alice, "map").await;
    assert!(h.saw(&alice.id, "Select a map:"));

    h.game(&alice, "map arena").await;
    h.game(&alice, "mode classic").await;
    h.game(&alice, "map no such map").await;

    let session = h.engine().store().session(&id).unwrap();
    assert_eq!(session.map_id, Selection::Chosen("arena".into()));
    assert_eq!(session.play_mode, Selection::Chosen("classic".into()));
    assert!(h.saw(&alice.id, "Map not found: no such map"));
}

// =========================================================================
// Quit
// =========================================================================

#[tokio::test]
async fn test_owner_quit_cancels_pending_session() {
    let mut h = Harness::new();
    let alice = h.player("alice");
    let bob = h.player("bob");
    let id = h.create(&alice).await;
    h.game(&alice, "invite bob").await;
    h.game(&bob, &format!("{id} join")).await;

    h.game(&alice, "quit").await;

    assert!(h.engine().store().session(&id).is_none());
    assert_eq!(h.current_game(&alice.id), None);
    assert_eq!(h.current_game(&bob.id), None);
    assert!(h.saw(&bob.id, "alice cancelled the game."));
}

#[tokio::test]
async fn test_member_quit_leaves_session_open() {
    let mut h = Harness::new();
    let alice = h.player("alice");
    let bob = h.player("bob");
    let id = h.create(&alice).await;
    h.game(&alice, "invite bob").await;
    h.game(&bob, &format!("{id} join")).await;

    h.game(&bob, "leave").await;

    let session = h.engine().store().session(&id).unwrap();
    assert_eq!(session.members, vec![alice.id]);
    assert!(h.saw(&alice.id, "bob left the game."));
}

#[tokio::test]
async fn test_quit_without_game_is_refused() {
    let mut h = Harness::new();
    let alice = h.player("alice");

    h.game(&alice, "quit").await;

    assert!(h.saw(&alice.id, "You are not in a game."));
}
