//! Balance store (spec §4.2). Mapping `(user_id, asset) -> {amount, locked}`.
//! `reserve_or_fail` / `credit` are exposed here for direct, non-transactional
//! use (e.g. seeding balances, or testing the store in isolation); the
//! matching engine does not call them mid-walk (see `crate::matching::engine`
//! and DESIGN.md) because doing so would commit a partial transfer before the
//! whole matcher transaction is known to succeed. Instead it reads via `get`
//! and commits via `apply_delta` through its own staged ledger.

use dashmap::DashMap;
use rust_decimal::Decimal;

use crate::error::{ExchangeError, ExchangeResult};
use crate::models::{Balance, UserId};

pub struct BalanceStore {
    rows: DashMap<(UserId, String), Balance>,
}

impl BalanceStore {
    pub fn new() -> Self {
        Self {
            rows: DashMap::new(),
        }
    }

    pub fn get(&self, user: UserId, asset: &str) -> Balance {
        self.rows
            .get(&(user, asset.to_string()))
            .map(|entry| entry.value().clone())
            .unwrap_or_else(|| Balance::zero(user, asset))
    }

    pub fn reserve_or_fail(&self, user: UserId, asset: &str, amount: Decimal) -> ExchangeResult<()> {
        let mut entry = self
            .rows
            .entry((user, asset.to_string()))
            .or_insert_with(|| Balance::zero(user, asset));
        if amount > entry.amount {
            return Err(ExchangeError::InsufficientBalance);
        }
        entry.amount -= amount;
        Ok(())
    }

    pub fn credit(&self, user: UserId, asset: &str, amount: Decimal) {
        let mut entry = self
            .rows
            .entry((user, asset.to_string()))
            .or_insert_with(|| Balance::zero(user, asset));
        entry.amount += amount;
    }

    /// Applies a net delta (positive or negative) computed by a staged
    /// transaction. Callers must have already validated feasibility; this
    /// never fails.
    pub fn apply_delta(&self, user: UserId, asset: &str, delta: Decimal) {
        let mut entry = self
            .rows
            .entry((user, asset.to_string()))
            .or_insert_with(|| Balance::zero(user, asset));
        entry.amount += delta;
    }

    /// Read-only view used by the query surface; does not participate in
    /// matcher transactions.
    pub fn snapshot(&self, user: UserId) -> Vec<Balance> {
        self.rows
            .iter()
            .filter(|entry| entry.key().0 == user)
            .map(|entry| entry.value().clone())
            .collect()
    }
}

impl Default for BalanceStore {
    fn default() -> Self {
        Self::new()
    }
}
