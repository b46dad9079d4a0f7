//! Subscriber fan-out for price ticks (spec §4.7, §5, §6, §9). A `broadcast`
//! channel gives every subscriber the latest tick with drop-to-latest
//! backpressure: a slow subscriber loses intermediate ticks
//! (`RecvError::Lagged`) rather than stalling the producer. Subscribing also
//! synchronously captures the table's current contents, delivered once as a
//! `Snapshot` ahead of any `Tick`, per the channel's two-message-kind contract.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::models::PriceSnapshot;
use crate::price::PriceTable;

/// The two message kinds the price channel promises: one `Snapshot` of the
/// full table delivered synchronously on subscribe, then a `Tick` of the
/// full table on every subsequent price-service tick.
#[derive(Debug, Clone)]
pub enum PriceMessage {
    Snapshot(Arc<Vec<PriceSnapshot>>),
    Tick(Arc<Vec<PriceSnapshot>>),
}

impl PriceMessage {
    pub fn snapshot(&self) -> &[PriceSnapshot] {
        match self {
            PriceMessage::Snapshot(batch) | PriceMessage::Tick(batch) => batch,
        }
    }
}

/// A single subscriber's view of the price channel. Yields exactly one
/// `Snapshot` (captured at subscribe time) before deferring to the shared
/// broadcast channel for subsequent `Tick` messages.
pub struct PriceSubscription {
    pending_snapshot: Option<Arc<Vec<PriceSnapshot>>>,
    receiver: broadcast::Receiver<Arc<Vec<PriceSnapshot>>>,
}

impl PriceSubscription {
    pub async fn recv(&mut self) -> Result<PriceMessage, broadcast::error::RecvError> {
        if let Some(snapshot) = self.pending_snapshot.take() {
            return Ok(PriceMessage::Snapshot(snapshot));
        }
        self.receiver.recv().await.map(PriceMessage::Tick)
    }
}

pub struct SubscriptionHub {
    sender: broadcast::Sender<Arc<Vec<PriceSnapshot>>>,
}

impl SubscriptionHub {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Adds a subscriber to the set and hands back a `PriceSubscription`
    /// primed with the table's current contents, so the caller observes a
    /// `Snapshot` immediately without waiting for the next tick.
    pub fn subscribe(&self, table: &PriceTable) -> PriceSubscription {
        PriceSubscription {
            pending_snapshot: Some(Arc::new(table.list())),
            receiver: self.sender.subscribe(),
        }
    }

    pub fn broadcast(&self, batch: &[PriceSnapshot]) {
        // No subscribers is not an error; the send result is only an error
        // when the channel has zero receivers, which is the common idle case.
        let _ = self.sender.send(Arc::new(batch.to_vec()));
    }
}
