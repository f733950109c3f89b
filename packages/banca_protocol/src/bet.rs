use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Terminal transitions only: a bet leaves `Pending` exactly once.
#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq)]
pub enum BetStatus {
    #[serde(rename = "pendente")]
    Pending,
    #[serde(rename = "ganha")]
    Won,
    #[serde(rename = "perdida")]
    Lost,
    #[serde(rename = "reembolsada")]
    Refunded,
}

impl BetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BetStatus::Pending => "pendente",
            BetStatus::Won => "ganha",
            BetStatus::Lost => "perdida",
            BetStatus::Refunded => "reembolsada",
        }
    }
}

/// A wager as stored by the platform. Field names follow the store columns.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Bet {
    pub id: i64,
    pub user_id: String,
    #[serde(default)]
    pub platform_id: Option<String>,
    #[serde(rename = "data_jogo")]
    pub date_of_play: NaiveDate,
    #[serde(rename = "modalidade")]
    pub modality: String,
    #[serde(rename = "colocacao")]
    pub placement: String,
    #[serde(rename = "palpites")]
    pub guesses: Vec<String>,
    #[serde(rename = "loterias")]
    pub lottery_tokens: Vec<String>,
    #[serde(rename = "valor_unitario")]
    pub unit_value: Decimal,
    pub valor_total: Decimal,
    #[serde(rename = "multiplicador", default)]
    pub multiplier: Option<Decimal>,
    pub status: BetStatus,
    #[serde(rename = "premio", default)]
    pub prize_value: Option<Decimal>,
}

/// Monetary effect recorded by the atomic balance-change operation.
#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq)]
pub enum LedgerKind {
    #[serde(rename = "premio")]
    Prize,
    #[serde(rename = "reembolso")]
    Refund,
}

impl LedgerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerKind::Prize => "premio",
            LedgerKind::Refund => "reembolso",
        }
    }
}

/// Audit row inserted after a payout or refund. Not atomic with the ledger;
/// reconciliation treats the ledger as the source of truth.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Transaction {
    pub user_id: String,
    #[serde(rename = "valor")]
    pub amount: Decimal,
    #[serde(rename = "tipo")]
    pub kind: LedgerKind,
    #[serde(rename = "referencia")]
    pub reference_id: i64,
    #[serde(rename = "descricao")]
    pub description: String,
    pub status: String,
}

impl Transaction {
    pub fn completed(
        user_id: impl Into<String>,
        amount: Decimal,
        kind: LedgerKind,
        reference_id: i64,
        description: impl Into<String>,
    ) -> Self {
        Transaction {
            user_id: user_id.into(),
            amount,
            kind,
            reference_id,
            description: description.into(),
            status: "concluida".to_string(),
        }
    }
}
