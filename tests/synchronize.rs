#![allow(non_snake_case)]
use fuels::types::U256;
use raffle_client::{
    addresses::AddressBook,
    notify::{
        Notifier,
        NotifyKind,
    },
    sync::{
        PlayerRow,
        Synchronizer,
        synchronizer_for_network,
    },
    test_helpers::{
        ReadCall,
        ScriptedRaffle,
    },
    units,
};

const WINNER: &str = "0x000000000000000000000000000000000000000000000000000000000000cafe";

fn players(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("0x{i:064x}")).collect()
}

fn tenth_of_a_unit() -> U256 {
    U256::from(100_000_000_000_000_000u128)
}

#[tokio::test]
async fn synchronize__publishes_complete_snapshot() {
    // given
    let raffle = ScriptedRaffle::new(tenth_of_a_unit(), WINNER, players(3));
    let reads = raffle.reads.clone();
    let mut sync = Synchronizer::new(raffle);

    // when
    sync.synchronize().await.unwrap();

    // then
    let snap = sync.snapshot();
    assert_eq!(snap.player_count, 3);
    assert_eq!(snap.players.len() as u64, snap.player_count);
    assert_eq!(snap.recent_winner, WINNER);
    assert!(!snap.players_loading);
    let expected: Vec<PlayerRow> = players(3)
        .into_iter()
        .enumerate()
        .map(|(index, address)| PlayerRow {
            index: index as u64,
            address,
        })
        .collect();
    assert_eq!(snap.players, expected);
    // exactly one per-index read for 0, 1, 2
    let player_reads: Vec<ReadCall> = reads
        .lock()
        .unwrap()
        .iter()
        .filter(|call| matches!(call, ReadCall::Player(_)))
        .cloned()
        .collect();
    assert_eq!(
        player_reads,
        vec![ReadCall::Player(0), ReadCall::Player(1), ReadCall::Player(2)]
    );
}

#[tokio::test]
async fn synchronize__fee_renders_as_fixed_point_decimal() {
    // given: 100000000000000000 wei on the wire
    let raffle = ScriptedRaffle::new(tenth_of_a_unit(), WINNER, players(1));
    let mut sync = Synchronizer::new(raffle);

    // when
    sync.synchronize().await.unwrap();

    // then: 18-decimal conversion, never a lossy float
    assert_eq!(units::format_wei(sync.snapshot().entrance_fee_wei), "0.1");
}

#[tokio::test(start_paused = true)]
async fn synchronize__publishes_players_in_index_order_despite_completion_order() {
    // given: later indices resolve first
    let mut raffle = ScriptedRaffle::new(tenth_of_a_unit(), WINNER, players(3));
    raffle.stagger_players = true;
    let completions = raffle.player_completions.clone();
    let mut sync = Synchronizer::new(raffle);

    // when
    sync.synchronize().await.unwrap();

    // then: completion order was inverted, published order ascends
    assert_eq!(*completions.lock().unwrap(), vec![2, 1, 0]);
    let indices: Vec<u64> = sync.snapshot().players.iter().map(|p| p.index).collect();
    assert_eq!(indices, vec![0, 1, 2]);
}

#[tokio::test]
async fn synchronize__player_read_failure_retains_previous_snapshot() {
    // given: a successful pass first
    let raffle = ScriptedRaffle::new(tenth_of_a_unit(), WINNER, players(2));
    let mut sync = Synchronizer::new(raffle);
    sync.synchronize().await.unwrap();
    let published = sync.snapshot().clone();

    // when: the contract grows a player but its read fails
    sync.contract_mut().players.push(format!("0x{:064x}", 99));
    sync.contract_mut().fail_player_at = Some(2);
    let result = sync.synchronize().await;

    // then: pass aborted, stale snapshot unchanged, loading flag reset
    assert!(result.is_err());
    assert_eq!(sync.snapshot(), &published);
    assert!(!sync.snapshot().players_loading);
}

#[tokio::test]
async fn synchronize__count_read_failure_leaves_snapshot_untouched() {
    // given
    let mut raffle = ScriptedRaffle::new(tenth_of_a_unit(), WINNER, players(2));
    raffle.fail_count_read = true;
    let reads = raffle.reads.clone();
    let mut sync = Synchronizer::new(raffle);

    // when
    let result = sync.synchronize().await;

    // then: no partial publish, no player read ever issued
    assert!(result.is_err());
    assert_eq!(sync.snapshot().players.len(), 0);
    assert_eq!(sync.snapshot().player_count, 0);
    assert!(
        !reads
            .lock()
            .unwrap()
            .iter()
            .any(|call| matches!(call, ReadCall::Player(_)))
    );
}

#[tokio::test]
async fn synchronizer_for_network__unknown_network_never_binds_a_contract() {
    // given
    let mut book = AddressBook::new();
    book.register(1, "0xAbC0000000000000000000000000000000000001");
    let raffle = ScriptedRaffle::new(tenth_of_a_unit(), WINNER, players(2));
    let reads = raffle.reads.clone();
    let mut bound_calls = 0;

    // when: the active network has no deployment
    let bound = synchronizer_for_network(&book, 31337, |_| {
        bound_calls += 1;
        Ok(raffle)
    })
    .unwrap();

    // then: no synchronizer, no contract value, no read ever issued
    assert!(bound.is_none());
    assert_eq!(bound_calls, 0);
    assert_eq!(reads.lock().unwrap().len(), 0);
}

#[tokio::test]
async fn synchronizer_for_network__known_network_binds_first_address() {
    // given
    let mut book = AddressBook::new();
    book.register(31337, "0xdead");
    book.register(31337, "0xbeef");
    let raffle = ScriptedRaffle::new(tenth_of_a_unit(), WINNER, players(1));

    // when
    let bound = synchronizer_for_network(&book, 31337, |address| {
        assert_eq!(address, "0xdead");
        Ok(raffle)
    })
    .unwrap();

    // then
    let (address, mut sync) = bound.unwrap();
    assert_eq!(address, "0xdead");
    sync.synchronize().await.unwrap();
    assert_eq!(sync.snapshot().player_count, 1);
}

#[tokio::test]
async fn submit_entry__success_notifies_once_and_resynchronizes_once() {
    // given
    let fee = tenth_of_a_unit();
    let raffle = ScriptedRaffle::new(fee, WINNER, players(2));
    let entered = raffle.entered_amounts.clone();
    let mut sync = Synchronizer::new(raffle);
    let mut notifier = Notifier::new();
    sync.synchronize().await.unwrap();
    sync.contract().clear_reads();

    // when
    sync.submit_entry(fee, &mut notifier).await.unwrap();

    // then: one success toast, one fresh pass, fee attached as value
    assert_eq!(notifier.len(), 1);
    let toast = &notifier.recent(1)[0];
    assert_eq!(toast.kind, NotifyKind::Success);
    assert_eq!(sync.contract().full_pass_count(), 1);
    assert_eq!(*entered.lock().unwrap(), vec![fee]);
    assert!(!sync.is_submitting());
}

#[tokio::test]
async fn submit_entry__broadcast_failure_notifies_error_without_resync() {
    // given
    let mut raffle = ScriptedRaffle::new(tenth_of_a_unit(), WINNER, players(2));
    raffle.fail_enter_broadcast = true;
    let mut sync = Synchronizer::new(raffle);
    let mut notifier = Notifier::new();

    // when
    sync.submit_entry(tenth_of_a_unit(), &mut notifier)
        .await
        .unwrap();

    // then: provider message surfaced, no synchronization pass started
    assert_eq!(notifier.len(), 1);
    let toast = &notifier.recent(1)[0];
    assert_eq!(toast.kind, NotifyKind::Error);
    assert!(toast.message.contains("insufficient funds"));
    assert_eq!(sync.contract().full_pass_count(), 0);
    assert!(!sync.is_submitting());
}

#[tokio::test]
async fn submit_entry__confirmation_failure_notifies_error_without_resync() {
    // given: broadcast accepted, confirmation reverts
    let mut raffle = ScriptedRaffle::new(tenth_of_a_unit(), WINNER, players(2));
    raffle.fail_enter_confirmation = true;
    let mut sync = Synchronizer::new(raffle);
    let mut notifier = Notifier::new();

    // when
    sync.submit_entry(tenth_of_a_unit(), &mut notifier)
        .await
        .unwrap();

    // then
    let toast = &notifier.recent(1)[0];
    assert_eq!(toast.kind, NotifyKind::Error);
    assert!(toast.message.contains("reverted"));
    assert_eq!(sync.contract().full_pass_count(), 0);
}
