//! Composition root. Wires the registry, stores, matching engine, price
//! service, and query surface into one handle a host process can hold.

use std::sync::Arc;

use uuid::Uuid;

use crate::config::ExchangeConfig;
use crate::error::ExchangeResult;
use crate::event::EventPublisher;
use crate::matching::MatchingEngine;
use crate::models::{Balance, Order, Page, Side, Trade, UserId};
use crate::price::{PriceService, PriceTable, QuoteProvider};
use crate::query::{BookView, QuerySurface};
use crate::registry::SymbolRegistry;
use crate::store::{BalanceStore, OrderStore, TradeStore, UserOrderFilters};
use crate::subscription::SubscriptionHub;
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub struct Exchange {
    config: ExchangeConfig,
    registry: Arc<SymbolRegistry>,
    balances: Arc<BalanceStore>,
    orders: Arc<OrderStore>,
    trades: Arc<TradeStore>,
    engine: MatchingEngine,
    price_table: Arc<PriceTable>,
    hub: Arc<SubscriptionHub>,
    price_service: Arc<PriceService>,
    query: QuerySurface,
}

impl Exchange {
    pub fn new(
        config: ExchangeConfig,
        symbols: Option<Vec<crate::models::Symbol>>,
        external_quotes: Option<Arc<dyn QuoteProvider>>,
        publisher: Option<Arc<dyn EventPublisher>>,
    ) -> Self {
        let registry = Arc::new(SymbolRegistry::new(
            symbols.unwrap_or_else(SymbolRegistry::default_symbols),
        ));
        let balances = Arc::new(BalanceStore::new());
        let orders = Arc::new(OrderStore::new());
        let trades = Arc::new(TradeStore::new());
        let price_table = Arc::new(PriceTable::new());
        let hub = Arc::new(SubscriptionHub::new(config.broadcast_capacity));

        let engine = MatchingEngine::new(
            config.clone(),
            registry.clone(),
            balances.clone(),
            orders.clone(),
            trades.clone(),
            publisher.clone(),
        );
        let price_service = Arc::new(PriceService::new(
            config.clone(),
            registry.clone(),
            price_table.clone(),
            hub.clone(),
            external_quotes,
            publisher,
        ));
        let query = QuerySurface::new(registry.clone(), balances.clone(), orders.clone(), trades.clone());

        Self {
            config,
            registry,
            balances,
            orders,
            trades,
            engine,
            price_table,
            hub,
            price_service,
            query,
        }
    }

    /// Seeds the market-maker account so market orders have inventory to
    /// trade against. Intended to be called once at startup.
    pub fn seed_market_maker(&self, asset: &str, amount: rust_decimal::Decimal) {
        self.balances.credit(self.config.market_maker_user_id, asset, amount);
    }

    pub fn credit_balance(&self, user: UserId, asset: &str, amount: rust_decimal::Decimal) {
        self.balances.credit(user, asset, amount);
    }

    pub fn place_order(
        &self,
        user: UserId,
        side: Side,
        symbol: &str,
        price: rust_decimal::Decimal,
        quantity: rust_decimal::Decimal,
        market: bool,
    ) -> ExchangeResult<Order> {
        self.engine.place_order(user, side, symbol, price, quantity, market)
    }

    pub fn cancel_order(&self, user: UserId, order_id: Uuid) -> ExchangeResult<Order> {
        self.engine.cancel_order(user, order_id)
    }

    pub fn get_book(&self, symbol: Option<&str>, page: usize, limit: usize) -> ExchangeResult<BookView> {
        self.query.get_book(symbol, page, limit)
    }

    pub fn get_user_orders(
        &self,
        user: UserId,
        filters: &UserOrderFilters,
        page: usize,
        limit: usize,
    ) -> Page<Order> {
        self.query.get_user_orders(user, filters, page, limit)
    }

    pub fn get_order(&self, order_id: Uuid) -> ExchangeResult<Order> {
        self.query.get_order(order_id)
    }

    pub fn get_trades(&self, user: Option<UserId>, page: usize, limit: usize) -> Page<Trade> {
        self.query.get_trades(user, page, limit)
    }

    pub fn get_balances(&self, user: UserId) -> Vec<Balance> {
        self.query.get_balances(user)
    }

    pub fn registry(&self) -> &SymbolRegistry {
        &self.registry
    }

    pub fn price_table(&self) -> &PriceTable {
        &self.price_table
    }

    pub fn subscribe_prices(&self) -> crate::subscription::PriceSubscription {
        self.hub.subscribe(&self.price_table)
    }

    /// Spawns the background price-tick loop, returning its join handle and a
    /// shutdown sender the host process owns.
    pub fn spawn_price_service(&self) -> (JoinHandle<()>, watch::Sender<bool>) {
        self.price_service.clone().spawn()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn place_order_rejects_unknown_symbol() {
        let exchange = Exchange::new(ExchangeConfig::default(), None, None, None);
        let err = exchange
            .place_order(UserId(1), Side::Buy, "DOGE-USD", dec!(1), dec!(1), false)
            .unwrap_err();
        assert!(matches!(err, crate::error::ExchangeError::UnknownSymbol(_)));
    }

    #[test]
    fn seeded_market_maker_inventory_fills_market_orders() {
        let exchange = Exchange::new(ExchangeConfig::default(), None, None, None);
        exchange.seed_market_maker("BTC-USD", dec!(5));
        let order = exchange
            .place_order(UserId(1), Side::Buy, "BTC-USD", dec!(64321.55), dec!(1), true)
            .unwrap();
        assert_eq!(order.status, crate::models::OrderStatus::Filled);
    }
}
