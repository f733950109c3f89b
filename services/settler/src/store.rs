use async_trait::async_trait;
use banca_protocol::bet::{Bet, BetStatus, LedgerKind, Transaction};
use banca_protocol::drawing::Drawing;
use banca_protocol::odds::{GlobalOdds, PlatformOdds};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use crate::config::Config;
use crate::error::SettleError;

/// One atomic wallet credit: row-locked balance update plus the appended
/// ledger entry, refused server-side unless the referenced bet is still
/// pending.
#[derive(Clone, Debug, PartialEq)]
pub struct BalanceChange {
    pub user_id: String,
    pub amount: Decimal,
    pub kind: LedgerKind,
    pub wallet: &'static str,
    pub reference_id: i64,
    pub description: String,
}

impl BalanceChange {
    pub fn new(
        user_id: impl Into<String>,
        amount: Decimal,
        kind: LedgerKind,
        reference_id: i64,
        description: impl Into<String>,
    ) -> Self {
        BalanceChange {
            user_id: user_id.into(),
            amount,
            kind,
            wallet: "saldo",
            reference_id,
            description: description.into(),
        }
    }
}

/// Everything the engine relies on from the relational store. The settlement
/// suite swaps in an in-memory implementation of this trait.
#[async_trait]
pub trait Store: Send + Sync {
    async fn upsert_drawing(&self, drawing: &Drawing) -> Result<(), SettleError>;

    async fn list_drawings(&self, date: NaiveDate) -> Result<Vec<Drawing>, SettleError>;

    async fn list_pending_bets(&self, date: NaiveDate, limit: usize)
        -> Result<Vec<Bet>, SettleError>;

    /// Returns the wallet balance after the change.
    async fn change_balance(&self, change: &BalanceChange) -> Result<Decimal, SettleError>;

    /// Server-side fallback logic for a platform's effective multiplier;
    /// zero means "no answer".
    async fn get_multiplier(
        &self,
        platform_id: Option<&str>,
        code: &str,
    ) -> Result<Decimal, SettleError>;

    async fn mark_bets_lost(&self, bet_ids: &[i64]) -> Result<(), SettleError>;

    async fn list_platform_odds(&self, platform_id: &str)
        -> Result<Vec<PlatformOdds>, SettleError>;

    async fn list_global_odds(&self) -> Result<Vec<GlobalOdds>, SettleError>;

    async fn insert_transaction(&self, transaction: &Transaction) -> Result<(), SettleError>;

    /// Conditional terminal transition; reports whether a pending row was
    /// actually updated.
    async fn update_bet_status(
        &self,
        bet_id: i64,
        status: BetStatus,
        prize_value: Option<Decimal>,
    ) -> Result<bool, SettleError>;
}

/// PostgREST gateway against the platform's Supabase project.
pub struct SupabaseStore {
    client: reqwest::Client,
    base_url: String,
    key: String,
}

impl SupabaseStore {
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        SupabaseStore {
            client,
            base_url: config.supabase_url.clone(),
            key: config.supabase_key.clone(),
        }
    }

    fn rest(&self, path: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, path)
    }

    fn request(&self, method: reqwest::Method, url: String) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
    }

    async fn expect_success(
        response: reqwest::Response,
        op: &'static str,
    ) -> Result<reqwest::Response, SettleError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(SettleError::store(op, format!("{status}: {body}")))
    }
}

#[async_trait]
impl Store for SupabaseStore {
    async fn upsert_drawing(&self, drawing: &Drawing) -> Result<(), SettleError> {
        let url = self.rest("resultados?on_conflict=data,hora,banca,loteria");
        let response = self
            .request(reqwest::Method::POST, url)
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(drawing)
            .send()
            .await?;
        Self::expect_success(response, "upsert_drawing").await?;
        Ok(())
    }

    async fn list_drawings(&self, date: NaiveDate) -> Result<Vec<Drawing>, SettleError> {
        let url = self.rest(&format!("resultados?data=eq.{date}&select=*"));
        let response = self.request(reqwest::Method::GET, url).send().await?;
        let response = Self::expect_success(response, "list_drawings").await?;
        Ok(response.json().await?)
    }

    async fn list_pending_bets(
        &self,
        date: NaiveDate,
        limit: usize,
    ) -> Result<Vec<Bet>, SettleError> {
        let url = self.rest(&format!(
            "apostas?data_jogo=eq.{date}&status=eq.pendente&order=id.asc&limit={limit}"
        ));
        let response = self.request(reqwest::Method::GET, url).send().await?;
        let response = Self::expect_success(response, "list_pending_bets").await?;
        Ok(response.json().await?)
    }

    async fn change_balance(&self, change: &BalanceChange) -> Result<Decimal, SettleError> {
        let url = self.rest("rpc/fn_change_balance");
        let response = self
            .request(reqwest::Method::POST, url)
            .json(&json!({
                "p_user_id": change.user_id,
                "p_valor": change.amount,
                "p_tipo": change.kind.as_str(),
                "p_carteira": change.wallet,
                "p_referencia": change.reference_id,
                "p_descricao": change.description,
            }))
            .send()
            .await?;
        let response = Self::expect_success(response, "fn_change_balance").await?;
        let body: Value = response.json().await?;
        if let Some(error) = body.get("error").and_then(Value::as_str) {
            return Err(SettleError::Ledger {
                bet_id: change.reference_id,
                message: error.to_string(),
            });
        }
        body.get("saldo_apos")
            .and_then(|value| value.as_str().map(str::to_string).or_else(|| Some(value.to_string())))
            .and_then(|raw| raw.parse::<Decimal>().ok())
            .ok_or(SettleError::Ledger {
                bet_id: change.reference_id,
                message: "missing saldo_apos in RPC response".to_string(),
            })
    }

    async fn get_multiplier(
        &self,
        platform_id: Option<&str>,
        code: &str,
    ) -> Result<Decimal, SettleError> {
        let url = self.rest("rpc/fn_get_multiplicador");
        let response = self
            .request(reqwest::Method::POST, url)
            .json(&json!({
                "p_platform_id": platform_id,
                "p_modalidade": code,
            }))
            .send()
            .await?;
        let response = Self::expect_success(response, "fn_get_multiplicador").await?;
        let body: Value = response.json().await?;
        let raw = match &body {
            Value::Number(number) => number.to_string(),
            Value::String(text) => text.clone(),
            _ => return Ok(Decimal::ZERO),
        };
        Ok(raw.parse::<Decimal>().unwrap_or(Decimal::ZERO))
    }

    async fn mark_bets_lost(&self, bet_ids: &[i64]) -> Result<(), SettleError> {
        let url = self.rest("rpc/fn_mark_bets_lost");
        let response = self
            .request(reqwest::Method::POST, url)
            .json(&json!({ "p_aposta_ids": bet_ids }))
            .send()
            .await?;
        Self::expect_success(response, "fn_mark_bets_lost").await?;
        Ok(())
    }

    async fn list_platform_odds(
        &self,
        platform_id: &str,
    ) -> Result<Vec<PlatformOdds>, SettleError> {
        let url = self.rest(&format!(
            "platform_modalidades?platform_id=eq.{platform_id}&select=*"
        ));
        let response = self.request(reqwest::Method::GET, url).send().await?;
        let response = Self::expect_success(response, "list_platform_odds").await?;
        Ok(response.json().await?)
    }

    async fn list_global_odds(&self) -> Result<Vec<GlobalOdds>, SettleError> {
        let url = self.rest("modalidades_config?select=modalidade,multiplicador");
        let response = self.request(reqwest::Method::GET, url).send().await?;
        let response = Self::expect_success(response, "list_global_odds").await?;
        Ok(response.json().await?)
    }

    async fn insert_transaction(&self, transaction: &Transaction) -> Result<(), SettleError> {
        let url = self.rest("transacoes");
        let response = self
            .request(reqwest::Method::POST, url)
            .header("Prefer", "return=minimal")
            .json(transaction)
            .send()
            .await?;
        Self::expect_success(response, "insert_transaction").await?;
        Ok(())
    }

    async fn update_bet_status(
        &self,
        bet_id: i64,
        status: BetStatus,
        prize_value: Option<Decimal>,
    ) -> Result<bool, SettleError> {
        // The pending filter makes the transition conditional server-side:
        // a replayed or concurrently settled bet matches zero rows.
        let url = self.rest(&format!("apostas?id=eq.{bet_id}&status=eq.pendente"));
        let mut patch = json!({ "status": status.as_str() });
        if let Some(prize) = prize_value {
            patch["premio"] = json!(prize);
        }
        let response = self
            .request(reqwest::Method::PATCH, url)
            .header("Prefer", "return=representation")
            .json(&patch)
            .send()
            .await?;
        let response = Self::expect_success(response, "update_bet_status").await?;
        let rows: Vec<Value> = response.json().await?;
        Ok(!rows.is_empty())
    }
}
