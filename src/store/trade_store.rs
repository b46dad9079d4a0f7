//! Trade store (spec §4.4). Append-only log of executed trades, indexed by
//! participant for user-scoped history queries.

use parking_lot::RwLock;

use crate::models::{Trade, UserId};

pub struct TradeStore {
    trades: RwLock<Vec<Trade>>,
}

impl TradeStore {
    pub fn new() -> Self {
        Self {
            trades: RwLock::new(Vec::new()),
        }
    }

    pub fn append(&self, trade: Trade) {
        self.trades.write().push(trade);
    }

    /// Ordered by `executed_at` descending.
    pub fn list_all(&self) -> Vec<Trade> {
        let mut trades: Vec<Trade> = self.trades.read().clone();
        trades.sort_by(|a, b| b.executed_at.cmp(&a.executed_at));
        trades
    }

    /// Trades where `user` is buyer or seller, ordered by `executed_at` descending.
    pub fn list_for_user(&self, user: UserId) -> Vec<Trade> {
        let mut trades: Vec<Trade> = self
            .trades
            .read()
            .iter()
            .filter(|trade| trade.involves(user))
            .cloned()
            .collect();
        trades.sort_by(|a, b| b.executed_at.cmp(&a.executed_at));
        trades
    }
}

impl Default for TradeStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TradeCounterparty;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn sample_trade(buyer: u64, seller: u64) -> Trade {
        Trade {
            id: Uuid::new_v4(),
            symbol: "BTC-USD".to_string(),
            buy_side: TradeCounterparty::Order {
                order_id: Uuid::new_v4(),
                user_id: UserId(buyer),
            },
            sell_side: TradeCounterparty::Order {
                order_id: Uuid::new_v4(),
                user_id: UserId(seller),
            },
            price: dec!(50000),
            quantity: dec!(1),
            executed_at: Utc::now(),
        }
    }

    #[test]
    fn list_for_user_matches_either_side() {
        let store = TradeStore::new();
        store.append(sample_trade(1, 2));
        store.append(sample_trade(3, 1));
        store.append(sample_trade(3, 4));

        assert_eq!(store.list_for_user(UserId(1)).len(), 2);
        assert_eq!(store.list_for_user(UserId(4)).len(), 1);
        assert_eq!(store.list_all().len(), 3);
    }
}
