use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One symbol's entry in the current-price table. Held in memory only; never
/// persisted. Replaced wholesale on each price-service tick, which is what
/// gives readers an atomic per-entry swap (see `crate::price::table`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSnapshot {
    pub ticker: String,
    pub price: Decimal,
    pub prev_price: Option<Decimal>,
    pub change: Decimal,
    pub change_percent: Decimal,
    pub market_cap: Decimal,
    pub updated_at: DateTime<Utc>,
}
