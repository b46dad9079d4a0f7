//! Single-venue spot exchange backend: fixed-point matching, market-maker
//! backstop liquidity, simulated price distribution, and a paginated query
//! surface, built for in-process embedding rather than as a network service.

pub mod config;
pub mod error;
pub mod event;
pub mod exchange;
pub mod matching;
pub mod models;
pub mod price;
pub mod query;
pub mod registry;
pub mod store;
pub mod subscription;

pub use config::ExchangeConfig;
pub use error::{ExchangeError, ExchangeResult};
pub use exchange::Exchange;
