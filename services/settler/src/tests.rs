use std::time::Duration;

use banca_protocol::bet::{Bet, BetStatus, LedgerKind};
use banca_protocol::drawing::{Drawing, House, Lottery, Prize};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone};
use rust_decimal_macros::dec;

use crate::config::Config;
use crate::mock_store::MockStore;
use crate::scheduler::brasilia_offset;
use crate::settlement::{decide_bet, settle_date, Decision, RunSummary};
use crate::state::{Deadline, DrawingBoard};
use crate::store::Store;

pub const USER: &str = "user-1";

fn play_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()
}

/// Run clock pinned to 21:00 in Brasília on the play date.
fn run_clock() -> DateTime<FixedOffset> {
    brasilia_offset()
        .with_ymd_and_hms(2026, 1, 15, 21, 0, 0)
        .unwrap()
}

fn test_config() -> Config {
    Config {
        supabase_url: "http://localhost".to_string(),
        supabase_key: "test-key".to_string(),
        scraperapi_key: None,
        alert_webhook_url: None,
        notify_webhook_url: None,
        job_budget: Duration::from_secs(600),
    }
}

fn drawing(house: House, lottery: Lottery, time: (u32, u32), numbers: &[&str]) -> Drawing {
    Drawing {
        date: play_date(),
        time: NaiveTime::from_hms_opt(time.0, time.1, 0).unwrap(),
        house,
        lottery,
        prizes: numbers.iter().map(|n| Prize::new(*n)).collect(),
    }
}

/// The 14:20 PT drawing the `rj_pt_14` token resolves to.
fn pt_drawing(numbers: &[&str]) -> Drawing {
    drawing(House::RioFederal, Lottery::Pt, (14, 20), numbers)
}

fn bet(id: i64, modality: &str, guesses: &[&str], placement: &str, tokens: &[&str]) -> Bet {
    Bet {
        id,
        user_id: USER.to_string(),
        platform_id: None,
        date_of_play: play_date(),
        modality: modality.to_string(),
        placement: placement.to_string(),
        guesses: guesses.iter().map(|g| g.to_string()).collect(),
        lottery_tokens: tokens.iter().map(|t| t.to_string()).collect(),
        unit_value: dec!(2.00),
        valor_total: dec!(10.00),
        multiplier: None,
        status: BetStatus::Pending,
        prize_value: None,
    }
}

async fn settle(store: &MockStore) -> RunSummary {
    settle_date(
        store,
        &test_config(),
        play_date(),
        run_clock(),
        &Deadline::new(Duration::from_secs(600)),
    )
    .await
    .expect("settlement run")
}

#[tokio::test]
async fn milhar_exact_hit_pays_the_stored_multiplier() {
    let mut winner = bet(1, "milhar", &["1234"], "1_premio", &["rj_pt_14"]);
    winner.multiplier = Some(dec!(4000));
    let store = MockStore::new()
        .with_drawing(pt_drawing(&["1234", "5678", "9012", "3456", "7890"]))
        .with_bet(winner);

    let summary = settle(&store).await;
    assert_eq!(summary.won, 1);

    let settled = store.bet(1);
    assert_eq!(settled.status, BetStatus::Won);
    assert_eq!(settled.prize_value, Some(dec!(8000.00)));

    let ledger = store.ledger();
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].kind, LedgerKind::Prize);
    assert_eq!(ledger[0].amount, dec!(8000.00));
    assert_eq!(ledger[0].reference_id, 1);
    assert_eq!(store.transactions().len(), 1);
}

#[tokio::test]
async fn fully_resolved_miss_is_marked_lost_without_money() {
    let store = MockStore::new()
        .with_drawing(pt_drawing(&["1234", "5678", "9012", "3456", "7890"]))
        .with_bet(bet(2, "milhar", &["9999"], "geral", &["rj_pt_14"]));

    let summary = settle(&store).await;
    assert_eq!(summary.lost, 1);
    assert_eq!(store.bet(2).status, BetStatus::Lost);
    assert!(store.ledger().is_empty());
    assert!(store.transactions().is_empty());
}

#[tokio::test]
async fn missing_drawing_past_the_grace_window_refunds_the_stake() {
    // rn_08 is scheduled at 08:30; the run clock is 21:00, 12.5 h later.
    let store = MockStore::new().with_bet(bet(3, "milhar", &["1234"], "1_premio", &["rn_08"]));

    let summary = settle(&store).await;
    assert_eq!(summary.refunded, 1);

    let settled = store.bet(3);
    assert_eq!(settled.status, BetStatus::Refunded);

    let ledger = store.ledger();
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].kind, LedgerKind::Refund);
    assert_eq!(ledger[0].amount, dec!(10.00));
}

#[tokio::test]
async fn refund_waits_for_the_grace_window() {
    // rj_coruja_21 runs at 21:20, which is still in the future at 21:00.
    let store = MockStore::new().with_bet(bet(4, "milhar", &["1234"], "1_premio", &["rj_coruja_21"]));

    let summary = settle(&store).await;
    assert_eq!(summary.pending, 1);
    assert_eq!(store.bet(4).status, BetStatus::Pending);
    assert!(store.ledger().is_empty());
}

#[tokio::test]
async fn milhar_ct_consolation_pays_the_centena_rate() {
    // Milhar misses on 5234 but the right-hand centena matches, so the
    // centena rate applies even though the bet stored its own multiplier.
    let mut consolation = bet(5, "milhar_ct", &["1234"], "1_premio", &["rj_pt_14"]);
    consolation.multiplier = Some(dec!(4000));
    let store = MockStore::new()
        .with_drawing(pt_drawing(&["5234", "5678", "9012", "3456", "7890"]))
        .with_bet(consolation)
        .with_global_odds("milhar_ct", dec!(3000))
        .with_global_odds("centena", dec!(600));

    let summary = settle(&store).await;
    assert_eq!(summary.won, 1);
    assert_eq!(store.bet(5).prize_value, Some(dec!(1200.00)));
}

#[tokio::test]
async fn quina_gp_needs_five_of_eight_groups_in_the_first_five() {
    // Dezenas 01, 05, 10, 15, 18 map to groups 1..5.
    let store = MockStore::new()
        .with_drawing(pt_drawing(&["1601", "1205", "0110", "4915", "1118"]))
        .with_bet(bet(
            6,
            "quina_gp",
            &["01", "02", "03", "04", "05", "06", "07", "08"],
            "1_ao_5",
            &["rj_pt_14"],
        ))
        .with_global_odds("quina_gp", dec!(150));

    let summary = settle(&store).await;
    assert_eq!(summary.won, 1);
    assert_eq!(store.bet(6).prize_value, Some(dec!(300.00)));
}

#[tokio::test]
async fn lotinha_settles_against_the_caixa_drawing() {
    let caixa = drawing(
        House::Caixa,
        Lottery::LotoFacil,
        (20, 0),
        &["02,05,06,08,09,11,14,16,17,18,19,20,22,23,25"],
    );
    let store = MockStore::new()
        .with_drawing(caixa)
        .with_bet(bet(7, "lotinha_15", &["02-05-06-08-99"], "geral", &[]))
        .with_global_odds("lotinha_15", dec!(12));

    let summary = settle(&store).await;
    assert_eq!(summary.won, 1);
    assert_eq!(store.bet(7).prize_value, Some(dec!(24.00)));
}

#[tokio::test]
async fn lotinha_stays_pending_until_caixa_publishes() {
    let store = MockStore::new().with_bet(bet(8, "lotinha_15", &["02-05-06-08-99"], "geral", &[]));
    let summary = settle(&store).await;
    assert_eq!(summary.pending, 1);
    assert_eq!(store.bet(8).status, BetStatus::Pending);
}

#[tokio::test]
async fn rerunning_settlement_changes_nothing() {
    let mut winner = bet(9, "milhar", &["1234"], "1_premio", &["rj_pt_14"]);
    winner.multiplier = Some(dec!(4000));
    let store = MockStore::new()
        .with_drawing(pt_drawing(&["1234", "5678", "9012", "3456", "7890"]))
        .with_bet(winner)
        .with_bet(bet(10, "milhar", &["9999"], "geral", &["rj_pt_14"]))
        .with_bet(bet(11, "milhar", &["1234"], "1_premio", &["rn_08"]));

    let first = settle(&store).await;
    assert_eq!((first.won, first.lost, first.refunded), (1, 1, 1));
    let ledger_after_first = store.ledger();

    let second = settle(&store).await;
    assert_eq!(second.evaluated, 0);
    assert_eq!(store.ledger(), ledger_after_first);
    assert_eq!(store.bet(9).status, BetStatus::Won);
    assert_eq!(store.bet(10).status, BetStatus::Lost);
    assert_eq!(store.bet(11).status, BetStatus::Refunded);
}

#[tokio::test]
async fn every_won_bet_has_exactly_one_prize_entry() {
    let mut first = bet(12, "milhar", &["1234"], "1_premio", &["rj_pt_14"]);
    first.multiplier = Some(dec!(4000));
    let mut second = bet(13, "centena", &["234"], "1_premio", &["rj_pt_14"]);
    second.multiplier = Some(dec!(600));
    let store = MockStore::new()
        .with_drawing(pt_drawing(&["1234", "5678", "9012", "3456", "7890"]))
        .with_bet(first)
        .with_bet(second)
        .with_bet(bet(14, "milhar", &["9999"], "geral", &["rj_pt_14"]));

    settle(&store).await;

    for bet_id in [12i64, 13] {
        let settled = store.bet(bet_id);
        assert_eq!(settled.status, BetStatus::Won);
        let entries: Vec<_> = store
            .ledger()
            .into_iter()
            .filter(|entry| entry.reference_id == bet_id && entry.kind == LedgerKind::Prize)
            .collect();
        assert_eq!(entries.len(), 1, "bet {bet_id}");
        assert_eq!(Some(entries[0].amount), settled.prize_value);
    }
    // The lost bet never touched the ledger.
    assert!(store
        .ledger()
        .iter()
        .all(|entry| entry.reference_id != 14));
}

#[tokio::test]
async fn odds_chain_picks_the_earliest_nonzero_layer() {
    let drawing_numbers: &[&str] = &["1234", "5678", "9012", "3456", "7890"];

    // Layer 1: the bet's own multiplier.
    let mut own = bet(20, "milhar", &["1234"], "1_premio", &["rj_pt_14"]);
    own.multiplier = Some(dec!(100));
    own.platform_id = Some("p1".to_string());
    let store = MockStore::new()
        .with_drawing(pt_drawing(drawing_numbers))
        .with_bet(own)
        .with_platform_odds("p1", "milhar", dec!(200), true)
        .with_rpc_multiplier("milhar", dec!(300))
        .with_global_odds("milhar", dec!(400));
    settle(&store).await;
    assert_eq!(store.bet(20).prize_value, Some(dec!(200.00)));

    // Layer 2: the platform override table.
    let mut platform = bet(21, "milhar", &["1234"], "1_premio", &["rj_pt_14"]);
    platform.platform_id = Some("p1".to_string());
    let store = MockStore::new()
        .with_drawing(pt_drawing(drawing_numbers))
        .with_bet(platform)
        .with_platform_odds("p1", "milhar", dec!(200), true)
        .with_rpc_multiplier("milhar", dec!(300))
        .with_global_odds("milhar", dec!(400));
    settle(&store).await;
    assert_eq!(store.bet(21).prize_value, Some(dec!(400.00)));

    // Layer 3: the server-side RPC, once the table row is inactive.
    let mut rpc = bet(22, "milhar", &["1234"], "1_premio", &["rj_pt_14"]);
    rpc.platform_id = Some("p1".to_string());
    let store = MockStore::new()
        .with_drawing(pt_drawing(drawing_numbers))
        .with_bet(rpc)
        .with_platform_odds("p1", "milhar", dec!(200), false)
        .with_rpc_multiplier("milhar", dec!(300))
        .with_global_odds("milhar", dec!(400));
    settle(&store).await;
    assert_eq!(store.bet(22).prize_value, Some(dec!(600.00)));

    // Layer 4: the global defaults.
    let store = MockStore::new()
        .with_drawing(pt_drawing(drawing_numbers))
        .with_bet(bet(23, "milhar", &["1234"], "1_premio", &["rj_pt_14"]))
        .with_global_odds("milhar", dec!(400));
    settle(&store).await;
    assert_eq!(store.bet(23).prize_value, Some(dec!(800.00)));

    // Chain exhausted: payout collapses to zero instead of blocking.
    let store = MockStore::new()
        .with_drawing(pt_drawing(drawing_numbers))
        .with_bet(bet(24, "milhar", &["1234"], "1_premio", &["rj_pt_14"]));
    settle(&store).await;
    assert_eq!(store.bet(24).prize_value, Some(dec!(0.00)));
}

#[tokio::test]
async fn bulk_loss_failure_falls_back_to_per_bet_updates() {
    let store = MockStore::new()
        .with_drawing(pt_drawing(&["1234", "5678", "9012", "3456", "7890"]))
        .with_bet(bet(30, "milhar", &["9999"], "geral", &["rj_pt_14"]))
        .with_bet(bet(31, "milhar", &["8888"], "geral", &["rj_pt_14"]))
        .failing_mark_lost();

    let summary = settle(&store).await;
    assert_eq!(summary.lost, 2);
    assert_eq!(store.bet(30).status, BetStatus::Lost);
    assert_eq!(store.bet(31).status, BetStatus::Lost);
}

#[tokio::test]
async fn ledger_failure_leaves_the_bet_untouched() {
    let mut winner = bet(40, "milhar", &["1234"], "1_premio", &["rj_pt_14"]);
    winner.multiplier = Some(dec!(4000));
    let store = MockStore::new()
        .with_drawing(pt_drawing(&["1234", "5678", "9012", "3456", "7890"]))
        .with_bet(winner)
        .failing_change_balance();

    let summary = settle(&store).await;
    assert_eq!(summary.errors, 1);
    let untouched = store.bet(40);
    assert_eq!(untouched.status, BetStatus::Pending);
    assert_eq!(untouched.prize_value, None);
    assert!(store.ledger().is_empty());
}

#[tokio::test]
async fn maluca_token_plays_against_the_reversed_drawing() {
    let mut maluca = bet(50, "milhar", &["4321"], "1_premio", &["ce_14_maluca"]);
    maluca.multiplier = Some(dec!(4000));
    let store = MockStore::new()
        .with_drawing(drawing(
            House::Lotece,
            Lottery::Geral,
            (14, 0),
            &["1234", "5678", "9012", "3456", "7890"],
        ))
        .with_bet(maluca);

    let summary = settle(&store).await;
    assert_eq!(summary.won, 1);
    assert_eq!(store.bet(50).status, BetStatus::Won);
}

#[tokio::test]
async fn drawing_upserts_replace_on_the_natural_key() {
    let store = MockStore::new();
    let short = pt_drawing(&["1234", "5678", "9012", "3456", "7890"]);
    let mut long = short.clone();
    long.prizes.push(Prize::new("1111"));
    long.prizes.push(Prize::new("2222"));

    store.upsert_drawing(&short).await.unwrap();
    store.upsert_drawing(&long).await.unwrap();

    let stored = store.stored_drawings();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].prizes.len(), 7);
}

#[test]
fn unresolvable_tokens_keep_the_bet_pending() {
    let board = DrawingBoard::load(vec![]);
    let decision = decide_bet(
        &bet(60, "milhar", &["1234"], "1_premio", &["zz_99"]),
        &board,
        run_clock(),
    );
    assert!(matches!(decision, Decision::Pending(_)));
}

#[test]
fn unknown_modalities_evaluate_as_milhar() {
    let board = DrawingBoard::load(vec![pt_drawing(&["1234", "5678", "9012", "3456", "7890"])]);
    let decision = decide_bet(
        &bet(61, "modalidade_nova", &["1234"], "1_premio", &["rj_pt_14"]),
        &board,
        run_clock(),
    );
    assert!(matches!(decision, Decision::Win(_)));
}
