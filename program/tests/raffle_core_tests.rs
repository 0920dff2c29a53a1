use solana_program::{clock::UnixTimestamp, program_error::ProgramError, pubkey::Pubkey};
use std::collections::HashMap;

use solraffle::{
    automation::Keeper,
    error::RaffleError,
    events::RaffleEvent,
    oracle::MockCoordinator,
    payout::Payout,
    raffle::Raffle,
    state::{Config, OverpaymentPolicy, RaffleState},
    upkeep::UpkeepDiagnostics,
};

const START: UnixTimestamp = 1_000;

// Wallet balances outside the raffle, credited by payouts
#[derive(Default)]
struct Wallets {
    balances: HashMap<Pubkey, u64>,
    fail_transfers: bool,
}

impl Wallets {
    fn balance(&self, key: &Pubkey) -> u64 {
        self.balances.get(key).copied().unwrap_or(0)
    }
}

impl Payout for Wallets {
    fn transfer(&mut self, winner: &Pubkey, amount: u64) -> Result<(), ProgramError> {
        if self.fail_transfers {
            return Err(ProgramError::InsufficientFunds);
        }
        *self.balances.entry(*winner).or_default() += amount;
        Ok(())
    }
}

fn new_raffle(entrance_fee: u64, interval: u64) -> Raffle {
    Raffle::new(Config::new(entrance_fee, interval), START).unwrap()
}

fn new_players(count: usize) -> Vec<Pubkey> {
    (0..count).map(|_| Pubkey::new_unique()).collect()
}

// Fill a raffle and move it to DRAWING, returning the request id
fn start_draw(
    raffle: &mut Raffle,
    coordinator: &mut MockCoordinator,
    players: &[Pubkey],
) -> u64 {
    let fee = raffle.entrance_fee();
    for player in players {
        raffle.enter(*player, fee).unwrap();
    }
    let now = raffle.latest_timestamp() + raffle.interval() as i64 + 1;
    match raffle.perform_upkeep(now, coordinator).unwrap() {
        RaffleEvent::DrawRequested { request_id, .. } => request_id,
        other => panic!("unexpected event {:?}", other),
    }
}

#[test]
fn test_initializes_open_and_empty() {
    let raffle = new_raffle(10, 30);

    assert_eq!(raffle.raffle_state(), RaffleState::Open);
    assert_eq!(raffle.entrance_fee(), 10);
    assert_eq!(raffle.interval(), 30);
    assert_eq!(raffle.number_of_players(), 0);
    assert_eq!(raffle.balance(), 0);
    assert_eq!(raffle.recent_winner(), None);
    assert_eq!(raffle.latest_timestamp(), START);
    assert_eq!(raffle.pending_request(), None);
    assert_eq!(raffle.current_round(), 1);
}

#[test]
fn test_rejects_invalid_config() {
    assert_eq!(
        Raffle::new(Config::new(0, 30), START),
        Err(RaffleError::InvalidConfig)
    );
    assert_eq!(
        Raffle::new(Config::new(10, 30).with_max_players(0), START),
        Err(RaffleError::InvalidConfig)
    );
}

#[test]
fn test_enter_requires_entrance_fee() {
    let mut raffle = new_raffle(10, 30);
    let player = Pubkey::new_unique();

    for amount in [0, 1, 9] {
        assert_eq!(raffle.enter(player, amount), Err(RaffleError::InsufficientFee));
    }
    assert_eq!(raffle.number_of_players(), 0);
    assert_eq!(raffle.balance(), 0);

    raffle.enter(player, 10).unwrap();
    assert_eq!(raffle.player(0), Ok(player));
}

#[test]
fn test_enter_records_players_in_order() {
    let mut raffle = new_raffle(10, 30);
    let players = new_players(3);

    for player in &players {
        raffle.enter(*player, 10).unwrap();
    }

    assert_eq!(raffle.number_of_players(), 3);
    for (index, player) in players.iter().enumerate() {
        assert_eq!(raffle.player(index), Ok(*player));
    }
    assert_eq!(raffle.player(3), Err(RaffleError::IndexOutOfRange));
    assert_eq!(raffle.balance(), 30);
}

#[test]
fn test_enter_emits_entry_recorded() {
    let mut raffle = new_raffle(10, 30);
    let player = Pubkey::new_unique();

    raffle.enter(player, 10).unwrap();
    let event = raffle.enter(player, 10).unwrap();

    assert_eq!(
        event,
        RaffleEvent::EntryRecorded {
            participant: player,
            credited: 10,
            uncollected: 0,
            balance: 20,
        }
    );
    // repeat entrants hold one slot per entry
    assert_eq!(raffle.number_of_players(), 2);
}

#[test]
fn test_overpayment_policy() {
    let player = Pubkey::new_unique();

    let mut retaining = new_raffle(10, 30);
    retaining.enter(player, 25).unwrap();
    assert_eq!(retaining.balance(), 25);

    let mut refunding = Raffle::new(
        Config::new(10, 30).with_overpayment(OverpaymentPolicy::Refund),
        START,
    )
    .unwrap();
    let event = refunding.enter(player, 25).unwrap();
    assert_eq!(refunding.balance(), 10);
    assert_eq!(
        event,
        RaffleEvent::EntryRecorded {
            participant: player,
            credited: 10,
            uncollected: 15,
            balance: 10,
        }
    );
}

#[test]
fn test_enter_rejected_when_full() {
    let mut raffle = Raffle::new(Config::new(10, 30).with_max_players(2), START).unwrap();
    let players = new_players(3);

    raffle.enter(players[0], 10).unwrap();
    raffle.enter(players[1], 10).unwrap();

    assert_eq!(raffle.enter(players[2], 10), Err(RaffleError::RaffleFull));
    assert_eq!(raffle.number_of_players(), 2);
    assert_eq!(raffle.balance(), 20);
}

#[test]
fn test_enter_rejected_while_drawing() {
    let mut raffle = new_raffle(10, 30);
    let mut coordinator = MockCoordinator::new();
    start_draw(&mut raffle, &mut coordinator, &new_players(1));

    let late = Pubkey::new_unique();
    for amount in [0, 10, 1_000] {
        assert_eq!(raffle.enter(late, amount), Err(RaffleError::NotOpen));
    }
    assert_eq!(raffle.number_of_players(), 1);
    assert_eq!(raffle.balance(), 10);
}

#[test]
fn test_check_upkeep_false_without_players() {
    let raffle = new_raffle(10, 30);

    let (needed, diagnostics) = raffle.check_upkeep(START + 31);
    assert!(!needed);
    assert_eq!(
        diagnostics,
        UpkeepDiagnostics {
            is_open: true,
            time_passed: true,
            has_players: false,
            has_balance: false,
        }
    );
}

#[test]
fn test_check_upkeep_false_before_interval() {
    let mut raffle = new_raffle(10, 30);
    raffle.enter(Pubkey::new_unique(), 10).unwrap();

    let (needed, diagnostics) = raffle.check_upkeep(START + 25);
    assert!(!needed);
    assert!(!diagnostics.time_passed);
}

#[test]
fn test_check_upkeep_true_when_all_conditions_hold() {
    let mut raffle = new_raffle(10, 30);
    raffle.enter(Pubkey::new_unique(), 10).unwrap();
    let before = raffle.clone();

    let (needed, diagnostics) = raffle.check_upkeep(START + 31);
    assert!(needed);
    assert!(diagnostics.is_open && diagnostics.has_players && diagnostics.has_balance);

    // polling leaves the raffle untouched
    raffle.check_upkeep(START + 31);
    assert_eq!(raffle, before);
}

#[test]
fn test_check_upkeep_false_while_drawing() {
    let mut raffle = new_raffle(10, 30);
    let mut coordinator = MockCoordinator::new();
    start_draw(&mut raffle, &mut coordinator, &new_players(2));

    let (needed, diagnostics) = raffle.check_upkeep(START + 1_000);
    assert!(!needed);
    assert!(!diagnostics.is_open);
}

#[test]
fn test_perform_upkeep_reverts_when_not_needed() {
    let mut raffle = new_raffle(10, 30);
    let mut coordinator = MockCoordinator::new();

    let err = raffle.perform_upkeep(START + 31, &mut coordinator).unwrap_err();
    assert_eq!(
        err,
        RaffleError::UpkeepNotNeeded(UpkeepDiagnostics {
            is_open: true,
            time_passed: true,
            has_players: false,
            has_balance: false,
        })
    );

    raffle.enter(Pubkey::new_unique(), 10).unwrap();
    assert!(matches!(
        raffle.perform_upkeep(START + 5, &mut coordinator),
        Err(RaffleError::UpkeepNotNeeded(_))
    ));
    assert_eq!(raffle.raffle_state(), RaffleState::Open);
    assert_eq!(coordinator.pending_requests(), 0);
}

#[test]
fn test_perform_upkeep_requests_randomness() {
    let mut raffle = new_raffle(10, 30);
    let mut coordinator = MockCoordinator::new();
    raffle.enter(Pubkey::new_unique(), 10).unwrap();

    let event = raffle.perform_upkeep(START + 31, &mut coordinator).unwrap();

    assert_eq!(
        event,
        RaffleEvent::DrawRequested {
            request_id: 1,
            round: 1
        }
    );
    assert_eq!(raffle.raffle_state(), RaffleState::Drawing);
    assert_eq!(raffle.pending_request(), Some(1));
    assert!(coordinator.is_pending(1));

    let pending = raffle.round().requests.pending().copied().unwrap();
    assert_eq!(pending.round, 1);
    assert_eq!(pending.requested_at, START + 31);
}

#[test]
fn test_second_perform_upkeep_while_drawing_is_not_needed() {
    let mut raffle = new_raffle(10, 30);
    let mut coordinator = MockCoordinator::new();
    raffle.enter(Pubkey::new_unique(), 10).unwrap();
    raffle.perform_upkeep(START + 31, &mut coordinator).unwrap();

    let err = raffle.perform_upkeep(START + 60, &mut coordinator).unwrap_err();
    assert_eq!(
        err,
        RaffleError::UpkeepNotNeeded(UpkeepDiagnostics {
            is_open: false,
            time_passed: true,
            has_players: true,
            has_balance: true,
        })
    );
    assert_eq!(raffle.pending_request(), Some(1));
    assert_eq!(coordinator.pending_requests(), 1);
}

#[test]
fn test_perform_upkeep_stays_open_when_oracle_unavailable() {
    let mut raffle = new_raffle(10, 30);
    let mut coordinator = MockCoordinator::new();
    coordinator.set_available(false);
    raffle.enter(Pubkey::new_unique(), 10).unwrap();

    assert_eq!(
        raffle.perform_upkeep(START + 31, &mut coordinator),
        Err(RaffleError::OracleUnavailable)
    );
    assert_eq!(raffle.raffle_state(), RaffleState::Open);
    assert_eq!(raffle.pending_request(), None);

    coordinator.set_available(true);
    raffle.perform_upkeep(START + 31, &mut coordinator).unwrap();
    assert_eq!(raffle.raffle_state(), RaffleState::Drawing);
}

#[test]
fn test_fulfill_only_after_perform_upkeep() {
    let mut raffle = new_raffle(10, 30);
    let mut coordinator = MockCoordinator::new();
    let mut wallets = Wallets::default();
    raffle.enter(Pubkey::new_unique(), 10).unwrap();

    for request_id in [0, 1] {
        assert_eq!(
            coordinator.fulfill_random_words(request_id, &mut raffle, 7, START + 31, &mut wallets),
            Err(RaffleError::UnknownRequest)
        );
        assert_eq!(
            raffle.fulfill_randomness(request_id, 7, START + 31, &mut wallets),
            Err(RaffleError::UnknownRequest)
        );
    }
    assert_eq!(raffle.number_of_players(), 1);
    assert_eq!(raffle.balance(), 10);
}

#[test]
fn test_fulfill_rejects_stale_request_id() {
    let mut raffle = new_raffle(10, 30);
    let mut coordinator = MockCoordinator::new();
    let mut wallets = Wallets::default();
    let request_id = start_draw(&mut raffle, &mut coordinator, &new_players(2));

    assert_eq!(
        raffle.fulfill_randomness(request_id + 1, 3, START + 40, &mut wallets),
        Err(RaffleError::UnknownRequest)
    );
    assert_eq!(raffle.raffle_state(), RaffleState::Drawing);
    assert_eq!(raffle.pending_request(), Some(request_id));
}

#[test]
fn test_winner_is_random_value_mod_players() {
    let players = new_players(5);
    let n = players.len() as u64;

    for (random_value, expected_index) in [(0, 0), (n - 1, 4), (n, 0), (42, 2)] {
        let mut raffle = new_raffle(10, 30);
        let mut coordinator = MockCoordinator::new();
        let mut wallets = Wallets::default();
        let request_id = start_draw(&mut raffle, &mut coordinator, &players);

        let event = coordinator
            .fulfill_random_words(request_id, &mut raffle, random_value, START + 40, &mut wallets)
            .unwrap();

        assert_eq!(
            event,
            RaffleEvent::WinnerPicked {
                winner: players[expected_index],
                prize: 50,
                round: 1,
            }
        );
        assert_eq!(raffle.recent_winner(), Some(players[expected_index]));
    }
}

#[test]
fn test_fulfill_resets_round_and_pays_winner() {
    let mut raffle = new_raffle(10, 30);
    let mut coordinator = MockCoordinator::new();
    let mut wallets = Wallets::default();
    let players = new_players(3);
    let request_id = start_draw(&mut raffle, &mut coordinator, &players);
    let completed_at = START + 45;

    coordinator
        .fulfill_random_words(request_id, &mut raffle, 1, completed_at, &mut wallets)
        .unwrap();

    assert_eq!(raffle.raffle_state(), RaffleState::Open);
    assert_eq!(raffle.number_of_players(), 0);
    assert_eq!(raffle.balance(), 0);
    assert_eq!(raffle.pending_request(), None);
    assert_eq!(raffle.latest_timestamp(), completed_at);
    assert_eq!(raffle.current_round(), 2);
    assert_eq!(wallets.balance(&players[1]), 30);
    assert_eq!(wallets.balance(&players[0]), 0);
    assert!(!coordinator.is_pending(request_id));
}

#[test]
fn test_failed_payout_rolls_back_and_can_be_retried() {
    let mut raffle = new_raffle(10, 30);
    let mut coordinator = MockCoordinator::new();
    let mut wallets = Wallets {
        fail_transfers: true,
        ..Wallets::default()
    };
    let players = new_players(2);
    let request_id = start_draw(&mut raffle, &mut coordinator, &players);
    let before = raffle.clone();

    assert_eq!(
        coordinator.fulfill_random_words(request_id, &mut raffle, 0, START + 50, &mut wallets),
        Err(RaffleError::PayoutFailed)
    );
    assert_eq!(raffle, before);
    assert_eq!(raffle.raffle_state(), RaffleState::Drawing);
    assert_eq!(raffle.pending_request(), Some(request_id));
    assert!(coordinator.is_pending(request_id));

    wallets.fail_transfers = false;
    coordinator
        .fulfill_random_words(request_id, &mut raffle, 0, START + 60, &mut wallets)
        .unwrap();
    assert_eq!(wallets.balance(&players[0]), 20);
    assert_eq!(raffle.raffle_state(), RaffleState::Open);
}

#[test]
fn test_duplicate_fulfillment_rejected() {
    let mut raffle = new_raffle(10, 30);
    let mut coordinator = MockCoordinator::new();
    let mut wallets = Wallets::default();
    let players = new_players(2);
    let request_id = start_draw(&mut raffle, &mut coordinator, &players);

    raffle
        .fulfill_randomness(request_id, 0, START + 40, &mut wallets)
        .unwrap();
    assert_eq!(
        raffle.fulfill_randomness(request_id, 0, START + 41, &mut wallets),
        Err(RaffleError::UnknownRequest)
    );
    assert_eq!(wallets.balance(&players[0]), 20);
}

#[test]
fn test_picks_winner_resets_and_sends_money() {
    let mut raffle = new_raffle(1, 10);
    let mut coordinator = MockCoordinator::new();
    let mut wallets = Wallets::default();
    let players = new_players(4);

    for player in &players {
        raffle.enter(*player, 1).unwrap();
    }
    let starting_timestamp = raffle.latest_timestamp();

    let request_id = match raffle.perform_upkeep(START + 11, &mut coordinator).unwrap() {
        RaffleEvent::DrawRequested { request_id, .. } => request_id,
        other => panic!("unexpected event {:?}", other),
    };
    let winner_starting_balance = wallets.balance(&players[2]);

    coordinator
        .fulfill_random_words(request_id, &mut raffle, 42, START + 12, &mut wallets)
        .unwrap();

    assert_eq!(raffle.recent_winner(), Some(players[2]));
    assert_eq!(raffle.number_of_players(), 0);
    assert_eq!(raffle.raffle_state(), RaffleState::Open);
    assert!(raffle.latest_timestamp() > starting_timestamp);
    assert_eq!(wallets.balance(&players[2]), winner_starting_balance + 4);
}

#[test]
fn test_rounds_repeat_with_fresh_request_ids() {
    let mut raffle = new_raffle(5, 10);
    let mut coordinator = MockCoordinator::new();
    let mut wallets = Wallets::default();
    let players = new_players(2);

    let first = start_draw(&mut raffle, &mut coordinator, &players);
    coordinator
        .fulfill_random_words(first, &mut raffle, 0, START + 20, &mut wallets)
        .unwrap();

    let second = start_draw(&mut raffle, &mut coordinator, &players);
    assert_ne!(first, second);
    assert_eq!(raffle.current_round(), 2);

    let event = coordinator
        .fulfill_random_words(second, &mut raffle, 1, START + 40, &mut wallets)
        .unwrap();
    assert_eq!(
        event,
        RaffleEvent::WinnerPicked {
            winner: players[1],
            prize: 10,
            round: 2,
        }
    );
    assert_eq!(wallets.balance(&players[0]), 10);
    assert_eq!(wallets.balance(&players[1]), 10);
}

#[test]
fn test_keeper_triggers_draw_when_due() {
    let mut raffle = new_raffle(1, 10);
    let mut coordinator = MockCoordinator::new();
    let mut keeper = Keeper::new(5);
    raffle.enter(Pubkey::new_unique(), 1).unwrap();

    // due, but the interval has not passed
    assert_eq!(keeper.tick(&mut raffle, &mut coordinator, START), Ok(None));
    assert_eq!(keeper.tick(&mut raffle, &mut coordinator, START + 9), Ok(None));
    // eligible now, but polled less than a cadence ago
    assert_eq!(keeper.tick(&mut raffle, &mut coordinator, START + 12), Ok(None));
    assert_eq!(raffle.raffle_state(), RaffleState::Open);

    assert_eq!(
        keeper.tick(&mut raffle, &mut coordinator, START + 15),
        Ok(Some(RaffleEvent::DrawRequested {
            request_id: 1,
            round: 1
        }))
    );
    assert_eq!(raffle.raffle_state(), RaffleState::Drawing);

    // nothing to do while the draw is in flight
    assert_eq!(keeper.tick(&mut raffle, &mut coordinator, START + 30), Ok(None));
    assert_eq!(coordinator.pending_requests(), 1);
}
