//! Current-price table (spec §4.7, §5). Single writer (the price service),
//! many readers (subscribers, the subscription hub). `DashMap::insert`
//! replaces a whole entry atomically under its shard lock, which is what
//! gives readers a per-entry atomic swap without a torn read for one symbol.

use dashmap::DashMap;

use crate::models::PriceSnapshot;

#[derive(Default)]
pub struct PriceTable(DashMap<String, PriceSnapshot>);

impl PriceTable {
    pub fn new() -> Self {
        Self(DashMap::new())
    }

    pub fn get(&self, ticker: &str) -> Option<PriceSnapshot> {
        self.0.get(ticker).map(|entry| entry.value().clone())
    }

    pub fn list(&self) -> Vec<PriceSnapshot> {
        self.0.iter().map(|entry| entry.value().clone()).collect()
    }

    pub(crate) fn set(&self, snapshot: PriceSnapshot) {
        self.0.insert(snapshot.ticker.clone(), snapshot);
    }
}
