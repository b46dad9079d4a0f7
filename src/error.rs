//! Error taxonomy for the exchange core (spec §7).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unknown symbol: {0}")]
    UnknownSymbol(String),

    #[error("insufficient balance")]
    InsufficientBalance,

    #[error("insufficient market-maker inventory")]
    InsufficientMarketInventory,

    #[error("limit price equals the reference price; use a market order instead")]
    UseMarketOrderInstead,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ExchangeResult<T> = Result<T, ExchangeError>;
