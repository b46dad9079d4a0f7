//! Demonstration entry point. Boots an `Exchange`, starts its price-tick
//! loop, runs a small scripted sequence of orders, and logs what happens.
//! There is no network transport here: wiring this up behind a protocol is
//! left to whatever process embeds this crate.

use std::time::Duration;

use meridian_exchange::config::ExchangeConfig;
use meridian_exchange::models::{Side, UserId};
use meridian_exchange::subscription::PriceMessage;
use meridian_exchange::Exchange;
use rust_decimal_macros::dec;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ExchangeConfig::from_env();
    let exchange = Exchange::new(config, None, None, None);

    for symbol in exchange.registry().list() {
        exchange.seed_market_maker(&symbol.ticker, dec!(1000));
    }

    let (price_handle, shutdown) = exchange.spawn_price_service();
    let mut ticks = exchange.subscribe_prices();

    let alice = UserId(1);
    let bob = UserId(2);
    exchange.credit_balance(alice, "BTC-USD", dec!(5));

    let resting = exchange.place_order(alice, Side::Sell, "BTC-USD", dec!(64000), dec!(1), false)?;
    tracing::info!(order_id = %resting.id, "placed resting sell order");

    let taker = exchange.place_order(bob, Side::Buy, "BTC-USD", dec!(64000), dec!(1), false)?;
    tracing::info!(order_id = %taker.id, status = ?taker.status, "placed matching buy order");

    let market_buy = exchange.place_order(bob, Side::Buy, "ETH-USD", dec!(3456.78), dec!(1), true)?;
    tracing::info!(order_id = %market_buy.id, "filled market order against market-maker inventory");

    // The first message on any subscription is always the current snapshot,
    // delivered synchronously at subscribe time; subsequent messages are
    // ticks from the price service's own cadence.
    if let Ok(PriceMessage::Snapshot(batch)) = ticks.recv().await {
        for snapshot in batch.iter() {
            tracing::info!(ticker = %snapshot.ticker, price = %snapshot.price, "initial price snapshot");
        }
    }

    tokio::select! {
        message = ticks.recv() => {
            if let Ok(PriceMessage::Tick(batch)) = message {
                for snapshot in batch.iter() {
                    tracing::info!(ticker = %snapshot.ticker, price = %snapshot.price, "price tick");
                }
            }
        }
        _ = tokio::time::sleep(Duration::from_secs(2)) => {
            tracing::warn!("timed out waiting for a price tick");
        }
    }

    let book = exchange.get_book(Some("BTC-USD"), 1, 10)?;
    tracing::info!(bids = book.bids.page.items.len(), asks = book.asks.page.items.len(), "book snapshot");

    shutdown.send(true).ok();
    price_handle.await.ok();

    Ok(())
}
