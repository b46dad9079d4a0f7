//! Read-side query surface (spec §4.6). Combines the order book, user order
//! history, trade history, and balances into paginated views. Purely
//! read-only: nothing here touches the matcher's transaction boundary.

use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::{ExchangeError, ExchangeResult};
use crate::models::{
    clamp_limit, clamp_page, paginate, Balance, Order, Page, Pagination, Side, Trade, UserId,
};
use crate::registry::SymbolRegistry;
use crate::store::{BalanceStore, OrderStore, TradeStore, UserOrderFilters};

/// One side of a symbol's resting order book, with its own pagination window.
#[derive(Debug, Clone)]
pub struct BookSide {
    pub side: Side,
    pub page: Page<Order>,
}

#[derive(Debug, Clone)]
pub struct BookView {
    pub symbol: Option<String>,
    pub bids: BookSide,
    pub asks: BookSide,
}

pub struct QuerySurface {
    registry: Arc<SymbolRegistry>,
    balances: Arc<BalanceStore>,
    orders: Arc<OrderStore>,
    trades: Arc<TradeStore>,
}

impl QuerySurface {
    pub fn new(
        registry: Arc<SymbolRegistry>,
        balances: Arc<BalanceStore>,
        orders: Arc<OrderStore>,
        trades: Arc<TradeStore>,
    ) -> Self {
        Self {
            registry,
            balances,
            orders,
            trades,
        }
    }

    /// `symbol` is optional, per the book query contract: `None` returns the
    /// unscoped book across every registered symbol. Both sides are
    /// paginated independently against the same `page`/`limit` window;
    /// `total_items`/`total_pages` are reported per side rather than
    /// combined, since bids and asks are logically separate lists.
    pub fn get_book(&self, symbol: Option<&str>, page: usize, limit: usize) -> ExchangeResult<BookView> {
        if let Some(symbol) = symbol {
            if self.registry.get(symbol).is_none() {
                return Err(ExchangeError::UnknownSymbol(symbol.to_string()));
            }
        }
        let page = clamp_page(page);
        let limit = clamp_limit(limit);

        let bids = self.orders.list_book_side(symbol, Side::Buy);
        let asks = self.orders.list_book_side(symbol, Side::Sell);

        Ok(BookView {
            symbol: symbol.map(|s| s.to_string()),
            bids: BookSide {
                side: Side::Buy,
                page: Page {
                    items: paginate(&bids, page, limit),
                    pagination: Pagination::new(page, limit, bids.len()),
                },
            },
            asks: BookSide {
                side: Side::Sell,
                page: Page {
                    items: paginate(&asks, page, limit),
                    pagination: Pagination::new(page, limit, asks.len()),
                },
            },
        })
    }

    pub fn get_user_orders(
        &self,
        user: UserId,
        filters: &UserOrderFilters,
        page: usize,
        limit: usize,
    ) -> Page<Order> {
        let page = clamp_page(page);
        let limit = clamp_limit(limit);
        let orders = self.orders.list_by_user(user, filters);
        Page {
            items: paginate(&orders, page, limit),
            pagination: Pagination::new(page, limit, orders.len()),
        }
    }

    pub fn get_order(&self, order_id: Uuid) -> ExchangeResult<Order> {
        self.orders.get(order_id)
    }

    pub fn get_trades(&self, user: Option<UserId>, page: usize, limit: usize) -> Page<Trade> {
        let page = clamp_page(page);
        let limit = clamp_limit(limit);
        let trades = match user {
            Some(user) => self.trades.list_for_user(user),
            None => self.trades.list_all(),
        };
        Page {
            items: paginate(&trades, page, limit),
            pagination: Pagination::new(page, limit, trades.len()),
        }
    }

    pub fn get_balance(&self, user: UserId, asset: &str) -> Balance {
        self.balances.get(user, asset)
    }

    pub fn get_balances(&self, user: UserId) -> Vec<Balance> {
        self.balances.snapshot(user)
    }

    pub fn available(&self, user: UserId, asset: &str) -> Decimal {
        self.balances.get(user, asset).available()
    }
}
