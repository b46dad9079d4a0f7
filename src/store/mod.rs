//! The three persistent stores consulted and mutated by the matching engine
//! (spec §2): balances, orders, and trades. Each is shared, concurrent, and
//! only ever mutated under a matcher transaction (spec §5).

mod balance_store;
mod order_store;
mod trade_store;

pub use balance_store::BalanceStore;
pub use order_store::{OrderStore, UserOrderFilters};
pub use trade_store::TradeStore;
