use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ProtocolError {
    #[error("Drawing for {lottery} has only {found} prizes, at least {min} are required")]
    TooFewPrizes {
        lottery: String,
        found: usize,
        min: usize,
    },

    #[error("Federal drawing must carry exactly one prize with the dezenas CSV, found {0}")]
    MalformedFederalDrawing(usize),

    #[error("Prize number must contain digits only: {0}")]
    InvalidPrizeNumber(String),

    #[error("Invalid drawing time: {0}")]
    InvalidTime(String),
}
