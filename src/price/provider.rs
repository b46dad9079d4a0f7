//! Quote providers (spec §4.7). Two are supported: a pluggable external
//! interface, and a built-in simulator used whenever the external provider is
//! absent or disabled.

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::Symbol;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("quote provider failed for {0}")]
    Failed(String),
}

#[async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn quote(&self, symbol: &Symbol, previous: Decimal) -> Result<Decimal, ProviderError>;
}

/// Draws a uniform random delta in `[-2%, +2%]` of the previous price and
/// rounds to two decimals, per the source's reference behavior.
pub struct Simulator {
    rng: Mutex<StdRng>,
}

impl Simulator {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QuoteProvider for Simulator {
    async fn quote(&self, _symbol: &Symbol, previous: Decimal) -> Result<Decimal, ProviderError> {
        let pct = {
            let mut rng = self.rng.lock();
            rng.gen_range(-0.02f64..=0.02f64)
        };
        let delta_factor = Decimal::try_from(pct).unwrap_or(Decimal::ZERO);
        let new_price = (previous + previous * delta_factor).round_dp(2);
        Ok(new_price.max(Decimal::ZERO))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn simulator_stays_within_two_percent_band() {
        let simulator = Simulator::new();
        let symbol = Symbol {
            ticker: "BTC-USD".to_string(),
            display_name: "Bitcoin / US Dollar".to_string(),
            seed_price: dec!(64321.55),
            market_cap_hint: dec!(0),
        };
        let previous = dec!(50000);
        for _ in 0..20 {
            let quote = simulator.quote(&symbol, previous).await.unwrap();
            let lower = previous * dec!(0.98);
            let upper = previous * dec!(1.02);
            assert!(quote >= lower && quote <= upper, "quote {quote} out of band");
        }
    }
}
