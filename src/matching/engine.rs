//! Matching engine (spec §4.5). The single non-trivial algorithmic component:
//! validates an order, matches it against the resting book or the
//! market-maker account, and commits balance/order/trade changes as one unit.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::config::ExchangeConfig;
use crate::error::{ExchangeError, ExchangeResult};
use crate::event::EventPublisher;
use crate::models::{Order, OrderStatus, Side, Symbol, Trade, TradeCounterparty, UserId};
use crate::registry::SymbolRegistry;
use crate::store::{BalanceStore, OrderStore, TradeStore};

use super::book::SymbolBook;

/// A staged, in-memory ledger of balance deltas for a single matcher
/// transaction. Nothing here is visible in `BalanceStore` until `commit`.
/// Staging (rather than calling `BalanceStore::reserve_or_fail` directly on
/// each transfer) is what lets a reserve failure partway through a
/// multi-candidate limit-order walk abort the whole transaction instead of
/// leaving earlier transfers committed.
struct StagedLedger<'a> {
    balances: &'a BalanceStore,
    deltas: HashMap<(UserId, String), Decimal>,
}

impl<'a> StagedLedger<'a> {
    fn new(balances: &'a BalanceStore) -> Self {
        Self {
            balances,
            deltas: HashMap::new(),
        }
    }

    fn available(&self, user: UserId, asset: &str) -> Decimal {
        let live = self.balances.get(user, asset).amount;
        let staged = self.deltas.get(&(user, asset.to_string())).copied().unwrap_or(Decimal::ZERO);
        live + staged
    }

    fn reserve_or_fail(&mut self, user: UserId, asset: &str, amount: Decimal) -> ExchangeResult<()> {
        if amount > self.available(user, asset) {
            return Err(ExchangeError::InsufficientBalance);
        }
        *self.deltas.entry((user, asset.to_string())).or_insert(Decimal::ZERO) -= amount;
        Ok(())
    }

    fn credit(&mut self, user: UserId, asset: &str, amount: Decimal) {
        *self.deltas.entry((user, asset.to_string())).or_insert(Decimal::ZERO) += amount;
    }

    fn commit(self) {
        for ((user, asset), delta) in self.deltas {
            self.balances.apply_delta(user, &asset, delta);
        }
    }
}

/// The outcome of a successful staged match, ready to commit.
struct MatchOutcome<'a> {
    ledger: StagedLedger<'a>,
    trades: Vec<Trade>,
    /// Candidate order id -> (new filled_quantity, new status).
    candidate_fills: HashMap<Uuid, (Decimal, OrderStatus)>,
}

pub struct MatchingEngine {
    config: ExchangeConfig,
    registry: Arc<SymbolRegistry>,
    balances: Arc<BalanceStore>,
    orders: Arc<OrderStore>,
    trades: Arc<TradeStore>,
    books: dashmap::DashMap<String, Mutex<SymbolBook>>,
    publisher: Option<Arc<dyn EventPublisher>>,
}

impl MatchingEngine {
    pub fn new(
        config: ExchangeConfig,
        registry: Arc<SymbolRegistry>,
        balances: Arc<BalanceStore>,
        orders: Arc<OrderStore>,
        trades: Arc<TradeStore>,
        publisher: Option<Arc<dyn EventPublisher>>,
    ) -> Self {
        let books = dashmap::DashMap::new();
        for symbol in registry.list() {
            books.insert(symbol.ticker, Mutex::new(SymbolBook::new()));
        }
        Self {
            config,
            registry,
            balances,
            orders,
            trades,
            books,
            publisher,
        }
    }

    pub fn place_order(
        &self,
        user: UserId,
        side: Side,
        symbol: &str,
        price: Decimal,
        quantity: Decimal,
        market: bool,
    ) -> ExchangeResult<Order> {
        if price <= Decimal::ZERO || quantity <= Decimal::ZERO {
            return Err(ExchangeError::BadRequest(
                "price and quantity must be positive".to_string(),
            ));
        }
        let symbol_meta = self
            .registry
            .get(symbol)
            .ok_or_else(|| ExchangeError::UnknownSymbol(symbol.to_string()))?;
        let book_lock = self
            .books
            .get(symbol)
            .ok_or_else(|| ExchangeError::UnknownSymbol(symbol.to_string()))?;
        let mut book = book_lock.lock();

        let now = Utc::now();
        let mut incoming = Order {
            id: Uuid::new_v4(),
            user_id: user,
            side,
            symbol: symbol.to_string(),
            price,
            quantity,
            filled_quantity: Decimal::ZERO,
            market,
            status: OrderStatus::Open,
            created_at: now,
            updated_at: now,
        };

        let outcome = if market {
            self.match_market(&symbol_meta, &mut incoming)?
        } else {
            self.match_limit(&book, &symbol_meta, &mut incoming)?
        };

        // Commit: every mutation below is infallible now that the whole
        // transaction validated; nothing was visible to readers before this
        // point.
        outcome.ledger.commit();
        for (candidate_id, (filled_quantity, status)) in &outcome.candidate_fills {
            self.orders.update_status(*candidate_id, *status, *filled_quantity)?;
            if *status == OrderStatus::Filled {
                book.remove(*candidate_id);
            }
        }
        for trade in &outcome.trades {
            self.trades.append(trade.clone());
        }
        let committed = self.orders.insert(incoming);
        if !market && committed.status == OrderStatus::Open {
            book.insert_resting(&committed);
        }
        drop(book);

        tracing::debug!(
            order_id = %committed.id,
            status = ?committed.status,
            trades = outcome.trades.len(),
            "order placed"
        );
        for trade in outcome.trades {
            self.publish_trade(trade);
        }

        Ok(committed)
    }

    pub fn cancel_order(&self, user: UserId, order_id: Uuid) -> ExchangeResult<Order> {
        // Ownership and symbol are immutable once an order is created, so
        // this first read only needs to resolve which symbol's mutex to
        // take; the status/filled_quantity read-check-write below happens
        // entirely under that lock, the same transaction boundary
        // `place_order` uses, so a concurrently-committing match against this
        // order can never be overwritten by a stale cancel.
        let order = self.orders.get(order_id)?;
        if order.user_id != user {
            return Err(ExchangeError::NotFound(format!("order {order_id}")));
        }
        let book_lock = self
            .books
            .get(&order.symbol)
            .ok_or_else(|| ExchangeError::UnknownSymbol(order.symbol.clone()))?;
        let mut book = book_lock.lock();

        let order = self.orders.get(order_id)?;
        if !matches!(order.status, OrderStatus::Open) {
            // Cancelling an already-terminal order is a no-op.
            return Ok(order);
        }
        let updated = self
            .orders
            .update_status(order_id, OrderStatus::Cancelled, order.filled_quantity)?;
        book.remove(order_id);
        Ok(updated)
    }

    fn match_market<'a>(
        &'a self,
        symbol: &Symbol,
        incoming: &mut Order,
    ) -> ExchangeResult<MatchOutcome<'a>> {
        let mut ledger = StagedLedger::new(&self.balances);
        let mm = self.config.market_maker_user_id;

        let (buyer, seller, insufficient_err) = match incoming.side {
            Side::Sell => (mm, incoming.user_id, ExchangeError::InsufficientBalance),
            Side::Buy => (incoming.user_id, mm, ExchangeError::InsufficientMarketInventory),
        };
        ledger
            .reserve_or_fail(seller, &symbol.ticker, incoming.quantity)
            .map_err(|_| insufficient_err)?;
        ledger.credit(buyer, &symbol.ticker, incoming.quantity);

        let (buy_side, sell_side) = match incoming.side {
            Side::Sell => (
                TradeCounterparty::MarketMaker { user_id: mm },
                TradeCounterparty::Order {
                    order_id: incoming.id,
                    user_id: incoming.user_id,
                },
            ),
            Side::Buy => (
                TradeCounterparty::Order {
                    order_id: incoming.id,
                    user_id: incoming.user_id,
                },
                TradeCounterparty::MarketMaker { user_id: mm },
            ),
        };
        let trade = Trade {
            id: Uuid::new_v4(),
            symbol: symbol.ticker.clone(),
            buy_side,
            sell_side,
            price: incoming.price,
            quantity: incoming.quantity,
            executed_at: Utc::now(),
        };

        incoming.filled_quantity = incoming.quantity;
        incoming.status = OrderStatus::Filled;

        Ok(MatchOutcome {
            ledger,
            trades: vec![trade],
            candidate_fills: HashMap::new(),
        })
    }

    fn match_limit<'a>(
        &'a self,
        book: &SymbolBook,
        symbol: &Symbol,
        incoming: &mut Order,
    ) -> ExchangeResult<MatchOutcome<'a>> {
        if incoming.price == symbol.seed_price {
            return Err(ExchangeError::UseMarketOrderInstead);
        }

        let mut ledger = StagedLedger::new(&self.balances);
        let mut trades = Vec::new();
        let mut candidate_fills: HashMap<Uuid, (Decimal, OrderStatus)> = HashMap::new();
        let mut remaining = incoming.quantity;

        let candidate_ids = book.candidate_ids(incoming.side, incoming.price);
        for candidate_id in candidate_ids {
            if remaining <= Decimal::ZERO {
                break;
            }
            let candidate = self.orders.get(candidate_id)?;
            let already_filled = candidate_fills
                .get(&candidate_id)
                .map(|(filled, _)| *filled)
                .unwrap_or(candidate.filled_quantity);
            let available = candidate.quantity - already_filled;
            if available <= Decimal::ZERO {
                continue;
            }

            let trade_qty = remaining.min(available);
            let trade_price = candidate.price;

            let (buyer, seller) = match incoming.side {
                Side::Buy => (incoming.user_id, candidate.user_id),
                Side::Sell => (candidate.user_id, incoming.user_id),
            };
            ledger.reserve_or_fail(seller, &symbol.ticker, trade_qty)?;
            ledger.credit(buyer, &symbol.ticker, trade_qty);

            let new_filled = already_filled + trade_qty;
            let new_status = if new_filled >= candidate.quantity {
                OrderStatus::Filled
            } else {
                OrderStatus::Open
            };
            candidate_fills.insert(candidate_id, (new_filled, new_status));

            let (buy_side, sell_side) = match incoming.side {
                Side::Buy => (
                    TradeCounterparty::Order {
                        order_id: incoming.id,
                        user_id: incoming.user_id,
                    },
                    TradeCounterparty::Order {
                        order_id: candidate_id,
                        user_id: candidate.user_id,
                    },
                ),
                Side::Sell => (
                    TradeCounterparty::Order {
                        order_id: candidate_id,
                        user_id: candidate.user_id,
                    },
                    TradeCounterparty::Order {
                        order_id: incoming.id,
                        user_id: incoming.user_id,
                    },
                ),
            };
            trades.push(Trade {
                id: Uuid::new_v4(),
                symbol: symbol.ticker.clone(),
                buy_side,
                sell_side,
                price: trade_price,
                quantity: trade_qty,
                executed_at: Utc::now(),
            });

            remaining -= trade_qty;
        }

        incoming.filled_quantity = incoming.quantity - remaining;
        incoming.status = if remaining <= Decimal::ZERO {
            OrderStatus::Filled
        } else {
            OrderStatus::Open
        };

        Ok(MatchOutcome {
            ledger,
            trades,
            candidate_fills,
        })
    }

    /// Best-effort, fire-and-forget publish. Never observed by the caller of
    /// `place_order`: failures are logged and swallowed (spec §4.9).
    fn publish_trade(&self, trade: Trade) {
        let Some(publisher) = self.publisher.clone() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(error) = publisher.publish_trade(&trade).await {
                        tracing::warn!(%error, "trade event publisher failed");
                    }
                });
            }
            Err(_) => {
                tracing::trace!("no tokio runtime available, skipping trade event publish");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn engine_with_symbol() -> (MatchingEngine, Symbol) {
        let symbol = Symbol {
            ticker: "BTC-USD".to_string(),
            display_name: "Bitcoin / US Dollar".to_string(),
            seed_price: dec!(64321.55),
            market_cap_hint: dec!(1260000000000),
        };
        let registry = Arc::new(SymbolRegistry::new(vec![symbol.clone()]));
        let balances = Arc::new(BalanceStore::new());
        let orders = Arc::new(OrderStore::new());
        let trades = Arc::new(TradeStore::new());
        let engine = MatchingEngine::new(
            ExchangeConfig::default(),
            registry,
            balances,
            orders,
            trades,
            None,
        );
        (engine, symbol)
    }

    #[test]
    fn exact_match_at_price_transfers_balance_and_fills_both_orders() {
        let (engine, _symbol) = engine_with_symbol();
        let a = UserId(1);
        let b = UserId(2);
        engine.balances.credit(a, "BTC-USD", dec!(10));

        let sell = engine
            .place_order(a, Side::Sell, "BTC-USD", dec!(50000), dec!(1), false)
            .unwrap();
        let buy = engine
            .place_order(b, Side::Buy, "BTC-USD", dec!(50000), dec!(1), false)
            .unwrap();

        assert_eq!(sell.status, OrderStatus::Filled);
        assert_eq!(buy.status, OrderStatus::Filled);
        assert_eq!(engine.balances.get(a, "BTC-USD").amount, dec!(9));
        assert_eq!(engine.balances.get(b, "BTC-USD").amount, dec!(1));
        assert_eq!(engine.trades.list_all().len(), 1);
    }

    #[test]
    fn partial_fill_leaves_maker_open_with_accumulated_fill() {
        let (engine, _symbol) = engine_with_symbol();
        let a = UserId(1);
        let b = UserId(2);
        engine.balances.credit(a, "BTC-USD", dec!(10));

        let sell = engine
            .place_order(a, Side::Sell, "BTC-USD", dec!(50000), dec!(5), false)
            .unwrap();
        let buy = engine
            .place_order(b, Side::Buy, "BTC-USD", dec!(50000), dec!(3), false)
            .unwrap();

        let sell_after = engine.orders.get(sell.id).unwrap();
        assert_eq!(buy.status, OrderStatus::Filled);
        assert_eq!(buy.filled_quantity, dec!(3));
        assert_eq!(sell_after.status, OrderStatus::Open);
        assert_eq!(sell_after.filled_quantity, dec!(3));
        assert_eq!(engine.balances.get(a, "BTC-USD").amount, dec!(7));
        assert_eq!(engine.balances.get(b, "BTC-USD").amount, dec!(3));
    }

    #[test]
    fn no_match_at_different_prices_leaves_both_orders_open() {
        let (engine, _symbol) = engine_with_symbol();
        let a = UserId(1);
        let b = UserId(2);
        engine.balances.credit(a, "BTC-USD", dec!(10));

        let sell = engine
            .place_order(a, Side::Sell, "BTC-USD", dec!(50000), dec!(1), false)
            .unwrap();
        let buy = engine
            .place_order(b, Side::Buy, "BTC-USD", dec!(49000), dec!(1), false)
            .unwrap();

        assert_eq!(sell.status, OrderStatus::Open);
        assert_eq!(buy.status, OrderStatus::Open);
        assert_eq!(engine.trades.list_all().len(), 0);
    }

    #[test]
    fn market_buy_against_market_maker_inventory() {
        let (engine, _symbol) = engine_with_symbol();
        let mm = UserId::MARKET_MAKER;
        let c = UserId(3);
        engine.balances.credit(mm, "BTC-USD", dec!(10));

        let buy = engine
            .place_order(c, Side::Buy, "BTC-USD", dec!(50000), dec!(2), true)
            .unwrap();

        assert_eq!(buy.status, OrderStatus::Filled);
        assert_eq!(engine.balances.get(mm, "BTC-USD").amount, dec!(8));
        assert_eq!(engine.balances.get(c, "BTC-USD").amount, dec!(2));
    }

    #[test]
    fn market_buy_with_no_inventory_fails_and_leaves_no_trace() {
        let (engine, _symbol) = engine_with_symbol();
        let c = UserId(3);

        let err = engine
            .place_order(c, Side::Buy, "BTC-USD", dec!(50000), dec!(2), true)
            .unwrap_err();

        assert!(matches!(err, ExchangeError::InsufficientMarketInventory));
        assert_eq!(engine.balances.get(UserId::MARKET_MAKER, "BTC-USD").amount, Decimal::ZERO);
        assert_eq!(engine.trades.list_all().len(), 0);
        assert_eq!(engine.orders.list_by_user(c, &Default::default()).len(), 0);
    }

    #[test]
    fn multi_candidate_price_priority_fills_best_price_first() {
        let (engine, _symbol) = engine_with_symbol();
        let a = UserId(1);
        let b = UserId(2);
        engine.balances.credit(a, "BTC-USD", dec!(10));

        let cheap = engine
            .place_order(a, Side::Sell, "BTC-USD", dec!(50000), dec!(2), false)
            .unwrap();
        let pricey = engine
            .place_order(a, Side::Sell, "BTC-USD", dec!(51000), dec!(2), false)
            .unwrap();
        engine
            .place_order(b, Side::Buy, "BTC-USD", dec!(50000), dec!(2), false)
            .unwrap();

        let cheap_after = engine.orders.get(cheap.id).unwrap();
        let pricey_after = engine.orders.get(pricey.id).unwrap();
        assert_eq!(cheap_after.status, OrderStatus::Filled);
        assert_eq!(pricey_after.status, OrderStatus::Open);
        assert_eq!(pricey_after.filled_quantity, Decimal::ZERO);
        assert_eq!(engine.trades.list_all().len(), 1);
    }

    #[test]
    fn insufficient_balance_aborts_transaction_entirely() {
        let (engine, _symbol) = engine_with_symbol();
        let a = UserId(1);
        engine.balances.credit(a, "BTC-USD", dec!(0.5));

        let err = engine
            .place_order(a, Side::Sell, "BTC-USD", dec!(50000), dec!(1), false)
            .unwrap_err();

        assert!(matches!(err, ExchangeError::InsufficientBalance));
        assert_eq!(engine.balances.get(a, "BTC-USD").amount, dec!(0.5));
        assert_eq!(engine.orders.list_by_user(a, &Default::default()).len(), 0);
    }

    #[test]
    fn limit_order_at_seed_price_requires_market_order() {
        let (engine, symbol) = engine_with_symbol();
        let a = UserId(1);
        engine.balances.credit(a, "BTC-USD", dec!(10));

        let err = engine
            .place_order(a, Side::Sell, "BTC-USD", symbol.seed_price, dec!(1), false)
            .unwrap_err();

        assert!(matches!(err, ExchangeError::UseMarketOrderInstead));
    }

    #[test]
    fn cancelling_an_already_cancelled_order_is_a_no_op() {
        let (engine, _symbol) = engine_with_symbol();
        let a = UserId(1);
        engine.balances.credit(a, "BTC-USD", dec!(10));
        let order = engine
            .place_order(a, Side::Sell, "BTC-USD", dec!(50000), dec!(1), false)
            .unwrap();

        let first = engine.cancel_order(a, order.id).unwrap();
        let second = engine.cancel_order(a, order.id).unwrap();
        assert_eq!(first.status, OrderStatus::Cancelled);
        assert_eq!(second.status, OrderStatus::Cancelled);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_sell_orders_never_oversell_or_go_negative() {
        let (engine, _symbol) = engine_with_symbol();
        let engine = Arc::new(engine);
        let seller = UserId(1);
        engine.balances.credit(seller, "BTC-USD", dec!(10));

        let mut handles = Vec::new();
        for _ in 0..20 {
            let engine = engine.clone();
            handles.push(tokio::spawn(async move {
                engine.place_order(seller, Side::Sell, "BTC-USD", dec!(50000), dec!(1), false)
            }));
        }

        let mut succeeded = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                succeeded += 1;
            }
        }

        // Exactly 10 of the 20 concurrent sells can be covered by a 10 BTC
        // balance; the rest must fail with InsufficientBalance rather than
        // driving the balance negative.
        assert_eq!(succeeded, 10);
        assert_eq!(engine.balances.get(seller, "BTC-USD").amount, Decimal::ZERO);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_matching_orders_conserve_total_quantity() {
        let (engine, _symbol) = engine_with_symbol();
        let engine = Arc::new(engine);
        let seller = UserId(1);
        engine.balances.credit(seller, "BTC-USD", dec!(20));

        let mut handles = Vec::new();
        for buyer_id in 2..12u64 {
            let engine = engine.clone();
            handles.push(tokio::spawn(async move {
                engine.place_order(
                    UserId(buyer_id),
                    Side::Buy,
                    "BTC-USD",
                    dec!(50000),
                    dec!(2),
                    false,
                )
            }));
        }
        handles.push({
            let engine = engine.clone();
            tokio::spawn(async move {
                engine.place_order(seller, Side::Sell, "BTC-USD", dec!(50000), dec!(20), false)
            })
        });

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert!(engine.balances.get(seller, "BTC-USD").amount >= Decimal::ZERO);
        let mut total = engine.balances.get(seller, "BTC-USD").amount;
        for buyer_id in 2..12u64 {
            let balance = engine.balances.get(UserId(buyer_id), "BTC-USD").amount;
            assert!(balance >= Decimal::ZERO);
            total += balance;
        }
        assert_eq!(total, dec!(20));
    }

    #[test]
    fn trade_price_is_always_the_maker_price() {
        let (engine, _symbol) = engine_with_symbol();
        let a = UserId(1);
        let b = UserId(2);
        engine.balances.credit(a, "BTC-USD", dec!(10));

        engine
            .place_order(a, Side::Sell, "BTC-USD", dec!(49500), dec!(1), false)
            .unwrap();
        engine
            .place_order(b, Side::Buy, "BTC-USD", dec!(50500), dec!(1), false)
            .unwrap();

        let trade = engine.trades.list_all().into_iter().next().unwrap();
        assert_eq!(trade.price, dec!(49500));
    }
}
