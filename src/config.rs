//! Configuration surface (spec §6, §10.3). A single structure threaded into
//! component constructors, loaded from the environment via `dotenvy`, in place
//! of ambient environment lookups scattered across modules.

use std::time::Duration;

use crate::models::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceSource {
    Simulator,
    External,
}

#[derive(Debug, Clone)]
pub struct ExchangeConfig {
    pub price_source: PriceSource,
    pub tick_interval_ms: u64,
    pub market_maker_user_id: UserId,
    pub broadcast_capacity: usize,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            price_source: PriceSource::Simulator,
            tick_interval_ms: 1_000,
            market_maker_user_id: UserId::MARKET_MAKER,
            broadcast_capacity: 64,
        }
    }
}

impl ExchangeConfig {
    /// Loads configuration from the process environment, falling back to
    /// `.env` via `dotenvy` and then to defaults for anything unset.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let price_source = match std::env::var("PRICE_SOURCE").as_deref() {
            Ok("external") => PriceSource::External,
            Ok("simulator") | Err(_) => PriceSource::Simulator,
            Ok(other) => {
                tracing::warn!(value = other, "unrecognized PRICE_SOURCE, defaulting to simulator");
                PriceSource::Simulator
            }
        };

        let tick_interval_ms = std::env::var("TICK_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.tick_interval_ms);

        let market_maker_user_id = std::env::var("MARKET_MAKER_USER_ID")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(UserId)
            .unwrap_or(defaults.market_maker_user_id);

        let broadcast_capacity = std::env::var("BROADCAST_CAPACITY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.broadcast_capacity);

        Self {
            price_source,
            tick_interval_ms,
            market_maker_user_id,
            broadcast_capacity,
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let config = ExchangeConfig::default();
        assert_eq!(config.price_source, PriceSource::Simulator);
        assert_eq!(config.tick_interval_ms, 1_000);
        assert!(config.market_maker_user_id.is_market_maker());
    }
}
