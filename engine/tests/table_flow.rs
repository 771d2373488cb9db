use holdem_engine::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rstest::rstest;

fn three_handed() -> Game {
    let table = TableConfig {
        name: "main".into(),
        max_seats: 6,
        small_blind: 5,
        big_blind: 10,
        min_buy_in: 100,
        max_buy_in: 1000,
    };
    let mut game = Game::new(table).unwrap();
    game.join_any_seat("alice".into(), 200).unwrap();
    game.join_any_seat("bob".into(), 200).unwrap();
    game.join_any_seat("carol".into(), 200).unwrap();
    game
}

fn heads_up() -> Game {
    let table = TableConfig {
        name: "heads-up".into(),
        max_seats: 2,
        small_blind: 5,
        big_blind: 10,
        min_buy_in: 100,
        max_buy_in: 1000,
    };
    let mut game = Game::new(table).unwrap();
    game.join_any_seat("alice".into(), 200).unwrap();
    game.join_any_seat("bob".into(), 200).unwrap();
    game
}

#[test]
fn start_game_deals_two_hole_cards_and_posts_blinds() {
    let mut game = three_handed();
    let mut rng = StdRng::seed_from_u64(1);
    game.start_game(&mut rng).unwrap();

    assert_eq!(game.phase, Phase::Preflop);
    assert_eq!(game.dealer_seat, Some(0));
    for seat in &game.seats {
        if seat.is_occupied() {
            assert_eq!(seat.hole_cards.len(), 2);
        }
    }
    assert_eq!(game.seats[1].current_bet, 5); // SB left of dealer
    assert_eq!(game.seats[2].current_bet, 10); // BB
    assert_eq!(game.current_bet, 10);
    assert_eq!(game.pot(), 15);
    // Preflop first-to-act is left of the big blind, wrapping to seat 0.
    assert_eq!(game.current_turn_seat, Some(0));
}

#[test]
fn heads_up_dealer_posts_small_blind_and_acts_first_preflop() {
    let mut game = heads_up();
    let mut rng = StdRng::seed_from_u64(2);
    game.start_game(&mut rng).unwrap();

    assert_eq!(game.dealer_seat, Some(0));
    assert_eq!(game.seats[0].current_bet, 5);
    assert_eq!(game.seats[1].current_bet, 10);
    assert_eq!(game.current_turn_seat, Some(0));
}

#[test]
fn fold_ends_hand_via_all_others_folded_fast_path() {
    let mut game = heads_up();
    let mut rng = StdRng::seed_from_u64(3);
    game.start_game(&mut rng).unwrap();

    let outcome = game.apply_action(0, Action::Fold).unwrap();
    assert_eq!(outcome, ActionOutcome::HandEnded);
    assert_eq!(game.phase, Phase::WaitingForPlayers);

    let info = game.winner_info.as_ref().unwrap();
    assert_eq!(info.reason, WinReason::AllOthersFolded);
    assert_eq!(game.seats[1].stack, 200 - 10 + 15); // won the 15-chip pot
}

#[test]
fn big_blind_option_lets_bb_act_even_if_everyone_just_calls() {
    let mut game = three_handed();
    let mut rng = StdRng::seed_from_u64(4);
    game.start_game(&mut rng).unwrap();

    // seat 0 (UTG) calls the big blind.
    let outcome = game.apply_action(0, Action::Call).unwrap();
    assert_eq!(outcome, ActionOutcome::Continue);

    // seat 1 (SB) completes to the big blind.
    let outcome = game.apply_action(1, Action::Call).unwrap();
    assert_eq!(outcome, ActionOutcome::Continue);
    assert_eq!(game.phase, Phase::Preflop, "round must stay open for the BB option");
    assert_eq!(game.current_turn_seat, Some(2));

    // seat 2 (BB) exercises the option by checking; only now does the round close.
    let outcome = game.apply_action(2, Action::Check).unwrap();
    assert_eq!(outcome, ActionOutcome::RoundAdvanced);
    assert_eq!(game.phase, Phase::Flop);
    assert_eq!(game.community_cards.len(), 3);
}

#[test]
fn raise_below_minimum_increment_is_rejected() {
    let mut game = heads_up();
    let mut rng = StdRng::seed_from_u64(5);
    game.start_game(&mut rng).unwrap();

    let err = game.apply_action(0, Action::Raise(12)).unwrap_err();
    assert_eq!(err.kind, ErrorKind::RaiseBelowMin);

    let outcome = game.apply_action(0, Action::Raise(20)).unwrap();
    assert_eq!(outcome, ActionOutcome::Continue);
    assert_eq!(game.current_bet, 20);
    assert_eq!(game.last_raise_increment, 10);

    // BB must now raise by at least another 10 to reopen again.
    let err = game.apply_action(1, Action::Raise(25)).unwrap_err();
    assert_eq!(err.kind, ErrorKind::RaiseBelowMin);
}

#[test]
fn check_when_facing_a_bet_is_rejected() {
    let mut game = heads_up();
    let mut rng = StdRng::seed_from_u64(6);
    game.start_game(&mut rng).unwrap();

    let err = game.apply_action(0, Action::Check).unwrap_err();
    assert_eq!(err.kind, ErrorKind::CheckWhenFacingBet);
}

#[test]
fn acting_out_of_turn_is_rejected() {
    let mut game = heads_up();
    let mut rng = StdRng::seed_from_u64(7);
    game.start_game(&mut rng).unwrap();

    let err = game.apply_action(1, Action::Call).unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotYourTurn);
}

#[test]
fn cash_out_rejected_mid_hand_then_allowed_once_hand_ends() {
    let mut game = heads_up();
    let mut rng = StdRng::seed_from_u64(8);
    game.start_game(&mut rng).unwrap();

    let err = game.cash_out(0).unwrap_err();
    assert_eq!(err.kind, ErrorKind::CashOutDuringHand);

    game.apply_action(0, Action::Fold).unwrap();
    game.cash_out(1).unwrap();
    assert!(game.seats[1].cashed_out);
    assert_eq!(game.seats[1].final_stack, Some(game.seats[1].stack));

    // idempotent: cashing out twice is a no-op, not an error.
    game.cash_out(1).unwrap();
}

#[test]
fn leave_requires_cash_out_and_frees_the_seat() {
    let mut game = heads_up();
    let mut rng = StdRng::seed_from_u64(9);
    game.start_game(&mut rng).unwrap();
    game.apply_action(0, Action::Fold).unwrap();

    let err = game.leave(1).unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotCashedOut);

    game.cash_out(1).unwrap();
    let bankroll = game.leave(1).unwrap();
    assert!(bankroll > 0);
    assert!(!game.seats[1].is_occupied());
}

#[test]
fn buy_back_in_resets_stack_and_requires_ready_up_again() {
    let mut game = heads_up();
    let mut rng = StdRng::seed_from_u64(10);
    game.start_game(&mut rng).unwrap();
    game.apply_action(0, Action::Fold).unwrap();

    game.cash_out(0).unwrap();
    let err = game.buy_back_in(0, 50).unwrap_err(); // below min_buy_in
    assert_eq!(err.kind, ErrorKind::BuyInOutOfRange);

    game.buy_back_in(0, 150).unwrap();
    assert!(!game.seats[0].cashed_out);
    assert_eq!(game.seats[0].stack, 150);
    assert!(!game.seats[0].ready_for_next_hand);
}

#[test]
fn better_hand_wins_pot_at_river_showdown() {
    let mut game = heads_up();
    let mut rng = StdRng::seed_from_u64(11);
    game.start_game(&mut rng).unwrap();

    // Replace the dealt cards with a fixed board to make the outcome deterministic.
    game.phase = Phase::River;
    game.current_bet = 0;
    game.dealer_seat = Some(1);
    game.current_turn_seat = Some(0);
    game.last_aggressor_seat = Some(1);
    game.community_cards = parse_cards(&["KH", "KD", "KC", "QS", "JH"]).unwrap();
    game.seats[0].hole_cards = parse_cards(&["AH", "AD"]).unwrap();
    game.seats[0].current_bet = 0;
    game.seats[0].total_bet_this_hand = 100;
    game.seats[0].has_acted_this_round = false;
    game.seats[1].hole_cards = parse_cards(&["2C", "3D"]).unwrap();
    game.seats[1].current_bet = 0;
    game.seats[1].total_bet_this_hand = 100;
    game.seats[1].has_acted_this_round = false;

    let before_stack_0 = game.seats[0].stack;
    assert_eq!(game.apply_action(0, Action::Check).unwrap(), ActionOutcome::Continue);
    let outcome = game.apply_action(1, Action::Check).unwrap();
    assert_eq!(outcome, ActionOutcome::ShowdownReached);
    assert_eq!(game.phase, Phase::Showdown, "payout hasn't run yet, but SHOWDOWN is already observable");
    assert!(game.winner_info.is_none());

    game.resolve_pending_showdown();
    assert_eq!(game.phase, Phase::WaitingForPlayers);

    let info = game.winner_info.as_ref().unwrap();
    assert_eq!(info.reason, WinReason::Showdown);
    assert_eq!(info.pots.len(), 1);
    assert_eq!(info.pots[0].amount, 200);
    assert_eq!(info.pots[0].winners.len(), 1);
    assert_eq!(info.pots[0].winners[0].seat, 0);
    assert_eq!(info.pots[0].winners[0].hand_category, Some(HandCategory::FullHouse));
    assert_eq!(game.seats[0].stack, before_stack_0 + 200);
}

#[rstest]
#[case(Action::Bet(10), ErrorKind::InvalidAction)] // facing a bet already; must RAISE not BET
#[case(Action::Raise(1000), ErrorKind::InsufficientStack)] // exceeds the seat's stack
fn invalid_preflop_actions_are_rejected(#[case] action: Action, #[case] expected: ErrorKind) {
    let mut game = heads_up();
    let mut rng = StdRng::seed_from_u64(12);
    game.start_game(&mut rng).unwrap();

    let err = game.apply_action(0, action).unwrap_err();
    assert_eq!(err.kind, expected);
}
