//! Order store (spec §4.3). Mapping `order_id -> Order`, with indexed reads
//! ordered by price then creation time. Candidate lookup for matching itself
//! goes through `crate::matching::book::SymbolBook`'s per-symbol price-level
//! index, not this store: the book index is already held under the matcher's
//! per-symbol mutex and gives the same best-price-then-oldest ordering
//! without a second, independently-maintained copy of the sort rule.

use dashmap::DashMap;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::{ExchangeError, ExchangeResult};
use crate::models::{Order, OrderStatus, Side, UserId};

#[derive(Debug, Clone, Default)]
pub struct UserOrderFilters {
    pub symbol: Option<String>,
    pub side: Option<Side>,
    pub status: Option<OrderStatus>,
}

pub struct OrderStore {
    orders: DashMap<Uuid, Order>,
}

impl OrderStore {
    pub fn new() -> Self {
        Self {
            orders: DashMap::new(),
        }
    }

    /// Assigns no new id: the caller (matching engine) constructs the order
    /// with its final id, price, and initial `open` status before commit, so
    /// that the id is stable across trade records created in the same
    /// transaction. `insert` simply makes it visible.
    pub fn insert(&self, order: Order) -> Order {
        self.orders.insert(order.id, order.clone());
        order
    }

    pub fn get(&self, id: Uuid) -> ExchangeResult<Order> {
        self.orders
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ExchangeError::NotFound(format!("order {id}")))
    }

    /// Monotonic with respect to `filled_quantity`: callers are expected to
    /// only ever pass a value greater than or equal to the current one.
    pub fn update_status(
        &self,
        id: Uuid,
        status: OrderStatus,
        filled_quantity: Decimal,
    ) -> ExchangeResult<Order> {
        let mut entry = self
            .orders
            .get_mut(&id)
            .ok_or_else(|| ExchangeError::NotFound(format!("order {id}")))?;
        entry.status = status;
        entry.filled_quantity = filled_quantity;
        entry.updated_at = chrono::Utc::now();
        Ok(entry.clone())
    }

    /// Resting orders for the public book view, one side at a time.
    pub fn list_book_side(&self, symbol: Option<&str>, side: Side) -> Vec<Order> {
        let mut orders: Vec<Order> = self
            .orders
            .iter()
            .map(|entry| entry.value().clone())
            .filter(|order| order.side == side && order.is_resting())
            .filter(|order| symbol.map(|s| order.symbol == s).unwrap_or(true))
            .collect();
        sort_book_side(&mut orders, side);
        orders
    }

    /// Most recent first, after applying the caller's filters.
    pub fn list_by_user(&self, user: UserId, filters: &UserOrderFilters) -> Vec<Order> {
        let mut orders: Vec<Order> = self
            .orders
            .iter()
            .map(|entry| entry.value().clone())
            .filter(|order| order.user_id == user)
            .filter(|order| filters.symbol.as_deref().map(|s| order.symbol == s).unwrap_or(true))
            .filter(|order| filters.side.map(|s| order.side == s).unwrap_or(true))
            .filter(|order| filters.status.map(|s| order.status == s).unwrap_or(true))
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders
    }
}

/// Best price first (descending for buys, ascending for sells), ties broken
/// by earliest `created_at`.
fn sort_book_side(orders: &mut [Order], side: Side) {
    orders.sort_by(|a, b| {
        let price_order = match side {
            Side::Buy => b.price.cmp(&a.price),
            Side::Sell => a.price.cmp(&b.price),
        };
        price_order.then_with(|| a.created_at.cmp(&b.created_at))
    });
}

impl Default for OrderStore {
    fn default() -> Self {
        Self::new()
    }
}
