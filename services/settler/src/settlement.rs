use std::collections::HashMap;

use banca_protocol::bet::{Bet, BetStatus, LedgerKind, Transaction};
use banca_protocol::drawing::House;
use banca_protocol::evaluate::{evaluate, Hit};
use banca_protocol::modality::Modality;
use banca_protocol::odds::OddsTables;
use banca_protocol::placement::parse_placements;
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

use crate::alert;
use crate::config::Config;
use crate::error::SettleError;
use crate::lottery_ids;
use crate::sources::http_client;
use crate::state::{Deadline, DrawingBoard};
use crate::store::{BalanceChange, Store};

/// Hard cap on the pending bets pulled into one run.
pub const MAX_BETS_PER_RUN: usize = 50_000;

/// Hours after the latest missing drawing's scheduled time before the stake
/// goes back to the bettor.
pub const REFUND_GRACE_HOURS: i64 = 12;

/// CAIXA publishes its accumulated-dezena results in the evening slot.
const CAIXA_DRAW_TIME: (u32, u32) = (20, 0);

/// What the decision loop concluded for one bet. Money only moves in the
/// commit layer, after the decision is final.
#[derive(Clone, Debug, PartialEq)]
pub enum Decision {
    Win(Hit),
    Lose,
    Refund,
    Pending(&'static str),
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub evaluated: usize,
    pub won: usize,
    pub lost: usize,
    pub refunded: usize,
    pub pending: usize,
    pub errors: usize,
}

/// Decides a bet against the day's drawings. Pure over its inputs; `now` is
/// the run's pinned Brasília clock.
pub fn decide_bet(bet: &Bet, board: &DrawingBoard, now: DateTime<FixedOffset>) -> Decision {
    let (modality, known) = Modality::parse(&bet.modality);
    if !known {
        warn!(
            bet_id = bet.id,
            modality = %bet.modality,
            "unknown modality, evaluating as milhar"
        );
    }
    let placements = parse_placements(&bet.placement);

    // Accumulated-dezena games bypass the token list entirely and verify
    // against the day's CAIXA drawing.
    if let Modality::Federal(game) = modality {
        let time = NaiveTime::from_hms_opt(CAIXA_DRAW_TIME.0, CAIXA_DRAW_TIME.1, 0).unwrap();
        let drawings = board.drawings_at(time, House::Caixa, game.lottery());
        if drawings.is_empty() {
            return Decision::Pending("awaiting CAIXA result");
        }
        for drawing in drawings {
            if let Some(hit) = evaluate(&modality, &bet.guesses, &placements, drawing) {
                return Decision::Win(hit);
            }
        }
        return Decision::Lose;
    }

    let mut missing: Vec<NaiveTime> = Vec::new();
    let mut resolved_any = false;
    for token in &bet.lottery_tokens {
        let resolved = match lottery_ids::resolve(token) {
            Ok(resolved) => resolved,
            Err(resolution_error) => {
                // Per-token and non-fatal: the token is ignored and the bet
                // waits on whatever the other tokens produce.
                warn!(bet_id = bet.id, %resolution_error, "token ignored");
                continue;
            }
        };
        let drawings = board.drawings_at(resolved.time, resolved.house, resolved.lottery);
        if drawings.is_empty() {
            missing.push(resolved.time);
            continue;
        }
        resolved_any = true;
        for drawing in drawings {
            let verdict = if resolved.maluca {
                evaluate(&modality, &bet.guesses, &placements, &drawing.maluca_view())
            } else {
                evaluate(&modality, &bet.guesses, &placements, drawing)
            };
            if let Some(hit) = verdict {
                return Decision::Win(hit);
            }
        }
    }

    if missing.is_empty() {
        if resolved_any {
            Decision::Lose
        } else {
            // Nothing resolvable: the bet stays pending until a registered
            // token can produce a verdict.
            Decision::Pending("no resolvable tokens")
        }
    } else {
        let all_expired = missing.iter().all(|time| {
            let scheduled = bet.date_of_play.and_time(*time);
            now.naive_local() - scheduled > Duration::hours(REFUND_GRACE_HOURS)
        });
        if all_expired {
            Decision::Refund
        } else {
            Decision::Pending("awaiting drawings")
        }
    }
}

/// Loads the day's drawings and settles every pending bet for `date`.
pub async fn settle_date(
    store: &dyn Store,
    config: &Config,
    date: NaiveDate,
    now: DateTime<FixedOffset>,
    deadline: &Deadline,
) -> Result<RunSummary, SettleError> {
    let drawings = store
        .list_drawings(date)
        .await
        .map_err(|error| SettleError::DrawingsLoadFailed {
            date: date.to_string(),
            message: error.to_string(),
        })?;
    let board = DrawingBoard::load(drawings);
    settle_with_board(store, config, &board, date, now, deadline).await
}

/// The per-bet decision loop over an already-built drawing board.
pub async fn settle_with_board(
    store: &dyn Store,
    config: &Config,
    board: &DrawingBoard,
    date: NaiveDate,
    now: DateTime<FixedOffset>,
    deadline: &Deadline,
) -> Result<RunSummary, SettleError> {
    let bets = store
        .list_pending_bets(date, MAX_BETS_PER_RUN)
        .await
        .map_err(|error| SettleError::BetsLoadFailed {
            date: date.to_string(),
            message: error.to_string(),
        })?;
    let global_odds = OddsTables::new(vec![], store.list_global_odds().await?);

    let mut settler = Settler {
        store,
        config,
        client: http_client(),
        global_odds,
        platform_odds: HashMap::new(),
    };
    let mut summary = RunSummary::default();
    let mut lost_batch: Vec<i64> = Vec::new();

    info!(%date, bets = bets.len(), "settlement run starting");
    for bet in &bets {
        if deadline.soft_expired() {
            info!(
                remaining = ?deadline.remaining(),
                decided = summary.evaluated,
                "wall-clock budget nearly burned, committing what we have"
            );
            break;
        }
        summary.evaluated += 1;
        let decision = decide_bet(bet, board, now);
        match settler.commit(bet, decision, &mut lost_batch).await {
            Ok(Resolution::Won) => summary.won += 1,
            Ok(Resolution::Lost) => summary.lost += 1,
            Ok(Resolution::Refunded) => summary.refunded += 1,
            Ok(Resolution::Pending) => summary.pending += 1,
            Err(error) => {
                // Scoped to this bet: status untouched, money untouched.
                summary.errors += 1;
                error!(bet_id = bet.id, %error, "bet settlement failed");
            }
        }
    }

    settler.flush_lost(&mut lost_batch).await;
    info!(
        %date,
        won = summary.won,
        lost = summary.lost,
        refunded = summary.refunded,
        pending = summary.pending,
        errors = summary.errors,
        "settlement run finished"
    );
    Ok(summary)
}

enum Resolution {
    Won,
    Lost,
    Refunded,
    Pending,
}

struct Settler<'a> {
    store: &'a dyn Store,
    config: &'a Config,
    client: reqwest::Client,
    global_odds: OddsTables,
    platform_odds: HashMap<String, OddsTables>,
}

impl<'a> Settler<'a> {
    async fn commit(
        &mut self,
        bet: &Bet,
        decision: Decision,
        lost_batch: &mut Vec<i64>,
    ) -> Result<Resolution, SettleError> {
        match decision {
            Decision::Pending(reason) => {
                debug!(bet_id = bet.id, reason, "bet stays pending");
                Ok(Resolution::Pending)
            }
            Decision::Lose => {
                lost_batch.push(bet.id);
                Ok(Resolution::Lost)
            }
            Decision::Win(hit) => self.commit_win(bet, hit).await,
            Decision::Refund => self.commit_refund(bet).await,
        }
    }

    /// Credit first, mark second. A crash between the two leaves a paid
    /// pending bet that the next run settles as a no-op, never an unpaid won
    /// bet.
    async fn commit_win(&mut self, bet: &Bet, hit: Hit) -> Result<Resolution, SettleError> {
        let multiplier = self.resolve_multiplier(bet, &hit).await;
        if multiplier.is_zero() {
            alert::report(
                &self.client,
                self.config,
                "multiplier_zero",
                &format!(
                    "bet {} won at code {} but no odds layer answered",
                    bet.id,
                    hit.odds_code.unwrap_or(bet.modality.as_str())
                ),
                "settlement",
                "odds precedence chain exhausted",
            )
            .await;
        }
        let payout = bet.unit_value * multiplier;
        let description = format!(
            "Premio {} {} aposta #{}",
            bet.modality,
            bet.lottery_tokens.join(","),
            bet.id
        );

        let change = BalanceChange::new(
            bet.user_id.clone(),
            payout,
            LedgerKind::Prize,
            bet.id,
            description.clone(),
        );
        self.store.change_balance(&change).await?;

        if let Err(stale_status) = self.mark_terminal(bet.id, BetStatus::Won, Some(payout)).await {
            error!(%stale_status, "wallet is settled, status is stale");
        }

        let transaction = Transaction::completed(
            bet.user_id.clone(),
            payout,
            LedgerKind::Prize,
            bet.id,
            description,
        );
        if let Err(audit_error) = self.store.insert_transaction(&transaction).await {
            warn!(bet_id = bet.id, %audit_error, "audit transaction not recorded");
        }

        alert::notify_win(&self.client, self.config, bet.id, &bet.user_id, payout).await;
        info!(bet_id = bet.id, %payout, %multiplier, "bet won");
        Ok(Resolution::Won)
    }

    async fn commit_refund(&mut self, bet: &Bet) -> Result<Resolution, SettleError> {
        let description = format!("Reembolso aposta #{} sem resultado", bet.id);
        let change = BalanceChange::new(
            bet.user_id.clone(),
            bet.valor_total,
            LedgerKind::Refund,
            bet.id,
            description.clone(),
        );
        self.store.change_balance(&change).await?;

        let transaction = Transaction::completed(
            bet.user_id.clone(),
            bet.valor_total,
            LedgerKind::Refund,
            bet.id,
            description,
        );
        if let Err(audit_error) = self.store.insert_transaction(&transaction).await {
            warn!(bet_id = bet.id, %audit_error, "audit transaction not recorded");
        }

        if let Err(stale_status) = self.mark_terminal(bet.id, BetStatus::Refunded, None).await {
            error!(%stale_status, "wallet is settled, status is stale");
        }
        info!(bet_id = bet.id, amount = %bet.valor_total, "bet refunded");
        Ok(Resolution::Refunded)
    }

    /// Terminal status write after the money already moved: retried once,
    /// then reported as a stale-status error and left to reconciliation. The
    /// wallet is correct either way.
    async fn mark_terminal(
        &self,
        bet_id: i64,
        status: BetStatus,
        prize_value: Option<Decimal>,
    ) -> Result<(), SettleError> {
        let mut last_failure = String::new();
        for attempt in 0..2 {
            match self.store.update_bet_status(bet_id, status, prize_value).await {
                Ok(true) => return Ok(()),
                Ok(false) => {
                    info!(bet_id, status = status.as_str(), "bet already terminal, no-op");
                    return Ok(());
                }
                Err(error) => {
                    if attempt == 0 {
                        warn!(bet_id, %error, "terminal update failed, retrying");
                    }
                    last_failure = error.to_string();
                }
            }
        }
        Err(SettleError::TerminalUpdate {
            bet_id,
            message: last_failure,
        })
    }

    /// The payout-rate precedence chain, first non-zero wins: the bet's own
    /// stored multiplier, the platform override table, the platform RPC, the
    /// global defaults, then zero. A consolation hit carries its own odds
    /// code and skips the stored multiplier, which was quoted for the full
    /// modality.
    async fn resolve_multiplier(&mut self, bet: &Bet, hit: &Hit) -> Decimal {
        let code: &str = match hit.odds_code {
            Some(consolation) => consolation,
            None => &bet.modality,
        };

        if hit.odds_code.is_none() {
            if let Some(own) = bet.multiplier {
                if own > Decimal::ZERO {
                    return own;
                }
            }
        }

        if let Some(platform_id) = bet.platform_id.clone() {
            if let Some(multiplier) = self.platform_multiplier(&platform_id, code).await {
                return multiplier;
            }
        }

        match self
            .store
            .get_multiplier(bet.platform_id.as_deref(), code)
            .await
        {
            Ok(multiplier) if multiplier > Decimal::ZERO => return multiplier,
            Ok(_) => {}
            Err(rpc_error) => {
                warn!(bet_id = bet.id, code, %rpc_error, "multiplier RPC failed, falling back");
            }
        }

        if let Some(multiplier) = self.global_odds.global_multiplier(code) {
            return multiplier;
        }
        Decimal::ZERO
    }

    async fn platform_multiplier(&mut self, platform_id: &str, code: &str) -> Option<Decimal> {
        if !self.platform_odds.contains_key(platform_id) {
            let tables = match self.store.list_platform_odds(platform_id).await {
                Ok(rows) => OddsTables::new(rows, vec![]),
                Err(error) => {
                    warn!(platform_id, %error, "platform odds unavailable");
                    OddsTables::default()
                }
            };
            self.platform_odds.insert(platform_id.to_string(), tables);
        }
        self.platform_odds
            .get(platform_id)
            .and_then(|tables| tables.platform_multiplier(platform_id, code))
    }

    /// One bulk terminal transition for everything that simply lost. Falls
    /// back to per-id conditional updates when the RPC is down.
    async fn flush_lost(&self, lost_batch: &mut Vec<i64>) {
        if lost_batch.is_empty() {
            return;
        }
        info!(count = lost_batch.len(), "committing loss batch");
        if let Err(batch_error) = self.store.mark_bets_lost(lost_batch).await {
            warn!(%batch_error, "bulk loss update failed, falling back to per-bet updates");
            for bet_id in lost_batch.iter() {
                if let Err(error) = self
                    .store
                    .update_bet_status(*bet_id, BetStatus::Lost, None)
                    .await
                {
                    error!(bet_id, %error, "could not mark bet lost");
                }
            }
        }
        lost_batch.clear();
    }
}
