use banca_protocol::ProtocolError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettleError {
    #[error("Missing required environment variable: {0}")]
    MissingConfig(&'static str),

    #[error("{0}")]
    Protocol(#[from] ProtocolError),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Malformed response body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Store operation {op} failed: {message}")]
    Store { op: &'static str, message: String },

    #[error("Could not load drawings for {date}: {message}")]
    DrawingsLoadFailed { date: String, message: String },

    #[error("Could not load pending bets for {date}: {message}")]
    BetsLoadFailed { date: String, message: String },

    #[error("Balance change rejected for bet {bet_id}: {message}")]
    Ledger { bet_id: i64, message: String },

    #[error("Terminal update failed for bet {bet_id}: {message}")]
    TerminalUpdate { bet_id: i64, message: String },

    #[error("Unknown lottery token: {0}")]
    UnknownToken(String),
}

impl SettleError {
    pub fn store(op: &'static str, message: impl Into<String>) -> Self {
        SettleError::Store {
            op,
            message: message.into(),
        }
    }
}
