use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Immutable trading pair record. Identity is `ticker`. The set of supported
/// tickers is closed at process start (see `crate::registry::SymbolRegistry`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub ticker: String,
    pub display_name: String,
    pub seed_price: Decimal,
    pub market_cap_hint: Decimal,
}
