use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::UserId;

/// One side of a trade. Replaces the source's nullable `*_order_id` columns
/// with a tagged structure, so "the counterparty is the market-maker" is
/// statically distinguishable from "the counterparty is a real order" rather
/// than being inferred from a null check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum TradeCounterparty {
    Order { order_id: Uuid, user_id: UserId },
    MarketMaker { user_id: UserId },
}

impl TradeCounterparty {
    pub fn user_id(&self) -> UserId {
        match self {
            TradeCounterparty::Order { user_id, .. } => *user_id,
            TradeCounterparty::MarketMaker { user_id } => *user_id,
        }
    }

    pub fn order_id(&self) -> Option<Uuid> {
        match self {
            TradeCounterparty::Order { order_id, .. } => Some(*order_id),
            TradeCounterparty::MarketMaker { .. } => None,
        }
    }
}

/// An executed, append-only fill. `quantity` is the asset amount transferred;
/// `price` is always the maker's resting price, never the taker's submitted price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub id: Uuid,
    pub symbol: String,
    pub buy_side: TradeCounterparty,
    pub sell_side: TradeCounterparty,
    pub price: Decimal,
    pub quantity: Decimal,
    pub executed_at: DateTime<Utc>,
}

impl Trade {
    pub fn buyer(&self) -> UserId {
        self.buy_side.user_id()
    }

    pub fn seller(&self) -> UserId {
        self.sell_side.user_id()
    }

    pub fn involves(&self, user: UserId) -> bool {
        self.buyer() == user || self.seller() == user
    }
}
