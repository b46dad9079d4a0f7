//! Background price-tick loop (spec §4.7, §5). Ticks on a fixed interval,
//! pulls a new quote for every registered symbol, writes it into the shared
//! `PriceTable`, and fans the resulting snapshot batch out to subscribers.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration};

use crate::config::{ExchangeConfig, PriceSource};
use crate::event::EventPublisher;
use crate::models::PriceSnapshot;
use crate::price::provider::{QuoteProvider, Simulator};
use crate::price::table::PriceTable;
use crate::registry::SymbolRegistry;
use crate::subscription::SubscriptionHub;

pub struct PriceService {
    config: ExchangeConfig,
    registry: Arc<SymbolRegistry>,
    table: Arc<PriceTable>,
    hub: Arc<SubscriptionHub>,
    simulator: Simulator,
    external: Option<Arc<dyn QuoteProvider>>,
    publisher: Option<Arc<dyn EventPublisher>>,
}

impl PriceService {
    pub fn new(
        config: ExchangeConfig,
        registry: Arc<SymbolRegistry>,
        table: Arc<PriceTable>,
        hub: Arc<SubscriptionHub>,
        external: Option<Arc<dyn QuoteProvider>>,
        publisher: Option<Arc<dyn EventPublisher>>,
    ) -> Self {
        for symbol in registry.list() {
            table.set(PriceSnapshot {
                ticker: symbol.ticker.clone(),
                price: symbol.seed_price,
                prev_price: None,
                change: Decimal::ZERO,
                change_percent: Decimal::ZERO,
                market_cap: symbol.market_cap_hint,
                updated_at: Utc::now(),
            });
        }
        Self {
            config,
            registry,
            table,
            hub,
            simulator: Simulator::new(),
            external,
            publisher,
        }
    }

    fn provider(&self) -> Option<&Arc<dyn QuoteProvider>> {
        if self.config.price_source == PriceSource::External {
            self.external.as_ref()
        } else {
            None
        }
    }

    /// Refreshes every symbol's quote once and publishes the resulting batch.
    pub async fn tick(&self) {
        let mut batch = Vec::with_capacity(self.registry.list().len());
        for symbol in self.registry.list() {
            let previous = self
                .table
                .get(&symbol.ticker)
                .map(|snapshot| snapshot.price)
                .unwrap_or(symbol.seed_price);

            let quote = match self.provider() {
                Some(provider) => provider.quote(&symbol, previous).await,
                None => self.simulator.quote(&symbol, previous).await,
            };

            let new_price = match quote {
                Ok(price) => price,
                Err(err) => {
                    tracing::warn!(ticker = %symbol.ticker, error = %err, "quote provider failed, holding price");
                    previous
                }
            };

            let change = new_price - previous;
            let change_percent = if previous.is_zero() {
                Decimal::ZERO
            } else {
                (change / previous * Decimal::ONE_HUNDRED).round_dp(4)
            };

            let snapshot = PriceSnapshot {
                ticker: symbol.ticker.clone(),
                price: new_price,
                prev_price: Some(previous),
                change,
                change_percent,
                market_cap: symbol.market_cap_hint,
                updated_at: Utc::now(),
            };
            self.table.set(snapshot.clone());
            batch.push(snapshot);
        }

        self.hub.broadcast(&batch);

        if let Some(publisher) = self.publisher.clone() {
            let batch = batch.clone();
            tokio::spawn(async move {
                if let Err(err) = publisher.publish_price_tick(&batch).await {
                    tracing::warn!(error = %err, "price tick publish failed");
                }
            });
        }
    }

    /// Runs one synchronous tick up front (so the table is populated before
    /// any reader can observe it), then alternates on the configured
    /// interval until `shutdown` reports `true`.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        self.tick().await;
        let mut ticker = interval(Duration::from_millis(self.config.tick_interval_ms.max(1)));
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick().await;
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        tracing::info!("price service shutting down");
                        break;
                    }
                }
            }
        }
    }

    /// Spawns the loop on the current tokio runtime, returning a handle and a
    /// sender the caller can use to request shutdown.
    pub fn spawn(self: Arc<Self>) -> (JoinHandle<()>, watch::Sender<bool>) {
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(self.run(rx));
        (handle, tx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::SymbolRegistry;

    #[tokio::test]
    async fn tick_populates_table_and_broadcasts() {
        let registry = Arc::new(SymbolRegistry::default_symbols());
        let table = Arc::new(PriceTable::new());
        let hub = Arc::new(SubscriptionHub::new(8));
        let service = Arc::new(PriceService::new(
            ExchangeConfig::default(),
            registry.clone(),
            table.clone(),
            hub,
            None,
            None,
        ));

        service.tick().await;

        for symbol in registry.list() {
            assert!(table.get(&symbol.ticker).is_some());
        }
    }
}
