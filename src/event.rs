//! Event publisher interface (spec §4.9). An optional, best-effort sink for
//! committed trades and price ticks. No implementation is wired by default;
//! a host process supplies one at construction time. Absence or failure of
//! the sink must never affect the matcher or the price service.

use async_trait::async_trait;

use crate::models::{PriceSnapshot, Trade};

#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish_trade(&self, trade: &Trade) -> anyhow::Result<()>;
    async fn publish_price_tick(&self, snapshot: &[PriceSnapshot]) -> anyhow::Result<()>;
}

/// A minimal reference implementation that logs events instead of forwarding
/// them anywhere. Useful for local development and as a template for a real
/// sink (a message queue, a webhook, an append-only file).
pub struct LoggingEventPublisher;

#[async_trait]
impl EventPublisher for LoggingEventPublisher {
    async fn publish_trade(&self, trade: &Trade) -> anyhow::Result<()> {
        tracing::info!(
            trade_id = %trade.id,
            symbol = %trade.symbol,
            price = %trade.price,
            quantity = %trade.quantity,
            "trade event"
        );
        Ok(())
    }

    async fn publish_price_tick(&self, snapshot: &[PriceSnapshot]) -> anyhow::Result<()> {
        tracing::info!(symbols = snapshot.len(), "price tick event");
        Ok(())
    }
}
