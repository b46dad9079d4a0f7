//! Per-symbol resting-order index. Holds only order ids, ordered by price
//! level then FIFO within a level; the orders themselves live in the
//! `OrderStore`. Guarded by the per-symbol mutex in `MatchingEngine`, which is
//! the mutual-exclusion region that stands in for the source's database
//! transaction (spec §9).

use std::collections::{BTreeMap, HashMap, VecDeque};

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::{Order, Side};

use super::types::PriceLevel;

#[derive(Default)]
pub struct SymbolBook {
    bids: BTreeMap<PriceLevel, VecDeque<Uuid>>,
    asks: BTreeMap<PriceLevel, VecDeque<Uuid>>,
    index: HashMap<Uuid, (Side, PriceLevel)>,
}

impl SymbolBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_resting(&mut self, order: &Order) {
        let level = PriceLevel::from_decimal(order.price);
        let side_map = match order.side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        side_map.entry(level).or_default().push_back(order.id);
        self.index.insert(order.id, (order.side, level));
    }

    pub fn remove(&mut self, order_id: Uuid) {
        if let Some((side, level)) = self.index.remove(&order_id) {
            let side_map = match side {
                Side::Buy => &mut self.bids,
                Side::Sell => &mut self.asks,
            };
            if let Some(queue) = side_map.get_mut(&level) {
                queue.retain(|id| *id != order_id);
                if queue.is_empty() {
                    side_map.remove(&level);
                }
            }
        }
    }

    /// Candidate resting-order ids for a taker on `taker_side`, in walk order:
    /// best price first (lowest ask for a buy taker, highest bid for a sell
    /// taker), then FIFO within a price level.
    pub fn candidate_ids(&self, taker_side: Side, limit_price: Decimal) -> Vec<Uuid> {
        let limit_level = PriceLevel::from_decimal(limit_price);
        match taker_side {
            Side::Buy => self
                .asks
                .range(..=limit_level)
                .flat_map(|(_, queue)| queue.iter().copied())
                .collect(),
            Side::Sell => self
                .bids
                .range(limit_level..)
                .rev()
                .flat_map(|(_, queue)| queue.iter().copied())
                .collect(),
        }
    }

    pub fn best_bid(&self) -> Option<Decimal> {
        self.bids.keys().next_back().map(|level| level.to_decimal())
    }

    pub fn best_ask(&self) -> Option<Decimal> {
        self.asks.keys().next().map(|level| level.to_decimal())
    }
}
