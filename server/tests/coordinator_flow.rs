use std::sync::Arc;

use holdem_engine::Action;
use holdem_server::config::TableConfig;
use holdem_server::coordinator;
use holdem_server::store::InMemoryStore;

fn heads_up_config() -> TableConfig {
    TableConfig {
        name: "t1".into(),
        max_seats: 2,
        small_blind: 5,
        big_blind: 10,
        min_buy_in: 100,
        max_buy_in: 1000,
        action_timeout_ms: None,
        ready_timeout_ms: 60_000,
        command_queue_capacity: 32,
    }
}

#[tokio::test]
async fn join_table_assigns_seats_and_start_game_deals_cards() {
    let store = Arc::new(InMemoryStore::new());
    let handle = coordinator::spawn("t1".into(), heads_up_config(), store).unwrap();

    let seat0 = handle.join_table("alice".into(), 200).await.unwrap();
    let seat1 = handle.join_table("bob".into(), 200).await.unwrap();
    assert_eq!((seat0, seat1), (0, 1));

    handle.start_game().await.unwrap();
    let snapshot = handle.snapshot(Some(0)).await.unwrap();
    assert_eq!(snapshot.seats[0].hole_cards.len(), 2);
    assert_eq!(snapshot.current_turn_seat, Some(0));
}

#[tokio::test]
async fn snapshot_hides_other_seats_hole_cards_until_showdown() {
    let store = Arc::new(InMemoryStore::new());
    let handle = coordinator::spawn("t1".into(), heads_up_config(), store).unwrap();
    handle.join_table("alice".into(), 200).await.unwrap();
    handle.join_table("bob".into(), 200).await.unwrap();
    handle.start_game().await.unwrap();

    let viewer_zero = handle.snapshot(Some(0)).await.unwrap();
    assert_eq!(viewer_zero.seats[0].hole_cards.len(), 2);
    assert!(viewer_zero.seats[1].hole_cards.is_empty());

    let spectator = handle.snapshot(None).await.unwrap();
    assert!(spectator.seats[0].hole_cards.is_empty());
    assert!(spectator.seats[1].hole_cards.is_empty());
}

#[tokio::test]
async fn acting_out_of_turn_is_rejected_through_the_actor() {
    let store = Arc::new(InMemoryStore::new());
    let handle = coordinator::spawn("t1".into(), heads_up_config(), store).unwrap();
    handle.join_table("alice".into(), 200).await.unwrap();
    handle.join_table("bob".into(), 200).await.unwrap();
    handle.start_game().await.unwrap();

    // heads-up: dealer (seat 0) posts SB and acts first preflop.
    let err = handle.submit_action(1, Action::Call).await.unwrap_err();
    assert_eq!(err.kind, holdem_engine::ErrorKind::NotYourTurn);
}

#[tokio::test]
async fn ready_up_replays_the_same_outcome_on_a_retried_call() {
    let store = Arc::new(InMemoryStore::new());
    let handle = coordinator::spawn("t1".into(), heads_up_config(), store).unwrap();
    handle.join_table("alice".into(), 200).await.unwrap();
    handle.join_table("bob".into(), 200).await.unwrap();

    handle.ready_up(0, true).await.unwrap();
    // a client retry after a dropped response should not error out.
    handle.ready_up(0, true).await.unwrap();
}

#[tokio::test]
async fn cash_out_is_idempotent_and_leave_then_frees_the_seat() {
    let store = Arc::new(InMemoryStore::new());
    let handle = coordinator::spawn("t1".into(), heads_up_config(), store).unwrap();
    handle.join_table("alice".into(), 200).await.unwrap();
    handle.join_table("bob".into(), 200).await.unwrap();
    handle.start_game().await.unwrap();

    // heads-up dealer (seat 0) folding ends the hand via the all-folded fast path.
    handle.submit_action(0, Action::Fold).await.unwrap();

    handle.cash_out(1).await.unwrap();
    handle.cash_out(1).await.unwrap();

    let bankroll = handle.leave(1).await.unwrap();
    assert!(bankroll > 0);

    let snapshot = handle.snapshot(None).await.unwrap();
    assert!(snapshot.seats[1].player_id.is_none());
}

#[tokio::test]
async fn subscribers_receive_the_current_snapshot_then_live_updates() {
    let store = Arc::new(InMemoryStore::new());
    let handle = coordinator::spawn("t1".into(), heads_up_config(), store).unwrap();
    handle.join_table("alice".into(), 200).await.unwrap();
    handle.join_table("bob".into(), 200).await.unwrap();

    let (mut subscription, initial) = handle.subscribe(Some(0)).await.unwrap();
    assert_eq!(initial.hand_count, 0);

    handle.start_game().await.unwrap();

    let event = subscription.recv().await.unwrap();
    match event {
        holdem_server::broadcaster::ServerEvent::GameUpdate { snapshot } => {
            assert_eq!(snapshot.hand_count, 1);
        }
        other => panic!("expected a game update, got {other:?}"),
    }
}
