use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use banca_protocol::bet::{Bet, BetStatus, Transaction};
use banca_protocol::drawing::Drawing;
use banca_protocol::odds::{GlobalOdds, PlatformOdds};
use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::SettleError;
use crate::store::{BalanceChange, Store};

/// In-memory stand-in for the Supabase project. Records every ledger call so
/// the suite can assert on the exact monetary effects, and enforces the same
/// pending-only conditions the real RPCs enforce.
#[derive(Default)]
pub struct MockStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    drawings: Vec<Drawing>,
    bets: Vec<Bet>,
    ledger: Vec<BalanceChange>,
    transactions: Vec<Transaction>,
    platform_odds: Vec<PlatformOdds>,
    global_odds: Vec<GlobalOdds>,
    rpc_multipliers: HashMap<String, Decimal>,
    fail_mark_lost: bool,
    fail_change_balance: bool,
}

impl MockStore {
    pub fn new() -> Self {
        MockStore::default()
    }

    pub fn with_drawing(self, drawing: Drawing) -> Self {
        self.inner.lock().unwrap().drawings.push(drawing);
        self
    }

    pub fn with_bet(self, bet: Bet) -> Self {
        self.inner.lock().unwrap().bets.push(bet);
        self
    }

    pub fn with_global_odds(self, code: &str, multiplier: Decimal) -> Self {
        self.inner.lock().unwrap().global_odds.push(GlobalOdds {
            code: code.to_string(),
            multiplier,
        });
        self
    }

    pub fn with_platform_odds(
        self,
        platform_id: &str,
        code: &str,
        multiplier: Decimal,
        active: bool,
    ) -> Self {
        self.inner.lock().unwrap().platform_odds.push(PlatformOdds {
            platform_id: platform_id.to_string(),
            code: code.to_string(),
            multiplier,
            active,
        });
        self
    }

    pub fn with_rpc_multiplier(self, code: &str, multiplier: Decimal) -> Self {
        self.inner
            .lock()
            .unwrap()
            .rpc_multipliers
            .insert(code.to_string(), multiplier);
        self
    }

    pub fn failing_mark_lost(self) -> Self {
        self.inner.lock().unwrap().fail_mark_lost = true;
        self
    }

    pub fn failing_change_balance(self) -> Self {
        self.inner.lock().unwrap().fail_change_balance = true;
        self
    }

    pub fn ledger(&self) -> Vec<BalanceChange> {
        self.inner.lock().unwrap().ledger.clone()
    }

    pub fn transactions(&self) -> Vec<Transaction> {
        self.inner.lock().unwrap().transactions.clone()
    }

    pub fn bet(&self, bet_id: i64) -> Bet {
        self.inner
            .lock()
            .unwrap()
            .bets
            .iter()
            .find(|bet| bet.id == bet_id)
            .cloned()
            .expect("bet registered in mock")
    }

    pub fn stored_drawings(&self) -> Vec<Drawing> {
        self.inner.lock().unwrap().drawings.clone()
    }
}

#[async_trait]
impl Store for MockStore {
    async fn upsert_drawing(&self, drawing: &Drawing) -> Result<(), SettleError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(existing) = inner
            .drawings
            .iter_mut()
            .find(|candidate| candidate.key() == drawing.key())
        {
            *existing = drawing.clone();
        } else {
            inner.drawings.push(drawing.clone());
        }
        Ok(())
    }

    async fn list_drawings(&self, date: NaiveDate) -> Result<Vec<Drawing>, SettleError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .drawings
            .iter()
            .filter(|drawing| drawing.date == date)
            .cloned()
            .collect())
    }

    async fn list_pending_bets(
        &self,
        date: NaiveDate,
        limit: usize,
    ) -> Result<Vec<Bet>, SettleError> {
        let mut bets: Vec<Bet> = self
            .inner
            .lock()
            .unwrap()
            .bets
            .iter()
            .filter(|bet| bet.status == BetStatus::Pending && bet.date_of_play == date)
            .cloned()
            .collect();
        bets.sort_by_key(|bet| bet.id);
        bets.truncate(limit);
        Ok(bets)
    }

    async fn change_balance(&self, change: &BalanceChange) -> Result<Decimal, SettleError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_change_balance {
            return Err(SettleError::Ledger {
                bet_id: change.reference_id,
                message: "rpc_error".to_string(),
            });
        }
        // Same guard as the real RPC: only a pending bet can move money.
        if let Some(bet) = inner
            .bets
            .iter()
            .find(|bet| bet.id == change.reference_id)
        {
            if bet.status != BetStatus::Pending {
                return Err(SettleError::Ledger {
                    bet_id: change.reference_id,
                    message: "bet is not pending".to_string(),
                });
            }
        }
        inner.ledger.push(change.clone());
        let balance: Decimal = inner
            .ledger
            .iter()
            .filter(|entry| entry.user_id == change.user_id)
            .map(|entry| entry.amount)
            .sum();
        Ok(balance)
    }

    async fn get_multiplier(
        &self,
        _platform_id: Option<&str>,
        code: &str,
    ) -> Result<Decimal, SettleError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .rpc_multipliers
            .get(code)
            .copied()
            .unwrap_or(Decimal::ZERO))
    }

    async fn mark_bets_lost(&self, bet_ids: &[i64]) -> Result<(), SettleError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_mark_lost {
            return Err(SettleError::store("fn_mark_bets_lost", "rpc down"));
        }
        for bet in inner.bets.iter_mut() {
            if bet_ids.contains(&bet.id) && bet.status == BetStatus::Pending {
                bet.status = BetStatus::Lost;
            }
        }
        Ok(())
    }

    async fn list_platform_odds(
        &self,
        platform_id: &str,
    ) -> Result<Vec<PlatformOdds>, SettleError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .platform_odds
            .iter()
            .filter(|row| row.platform_id == platform_id)
            .cloned()
            .collect())
    }

    async fn list_global_odds(&self) -> Result<Vec<GlobalOdds>, SettleError> {
        Ok(self.inner.lock().unwrap().global_odds.clone())
    }

    async fn insert_transaction(&self, transaction: &Transaction) -> Result<(), SettleError> {
        self.inner
            .lock()
            .unwrap()
            .transactions
            .push(transaction.clone());
        Ok(())
    }

    async fn update_bet_status(
        &self,
        bet_id: i64,
        status: BetStatus,
        prize_value: Option<Decimal>,
    ) -> Result<bool, SettleError> {
        let mut inner = self.inner.lock().unwrap();
        let Some(bet) = inner.bets.iter_mut().find(|bet| bet.id == bet_id) else {
            return Ok(false);
        };
        if bet.status != BetStatus::Pending {
            return Ok(false);
        }
        bet.status = status;
        if prize_value.is_some() {
            bet.prize_value = prize_value;
        }
        Ok(true)
    }
}
