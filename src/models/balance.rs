use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::user::UserId;

/// `(user_id, asset)` keyed balance row. A missing row is semantically `amount=0,
/// locked=0`; rows are created implicitly on first credit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Balance {
    pub user_id: UserId,
    pub asset: String,
    pub amount: Decimal,
    pub locked: Decimal,
}

impl Balance {
    pub fn zero(user_id: UserId, asset: &str) -> Self {
        Self {
            user_id,
            asset: asset.to_string(),
            amount: Decimal::ZERO,
            locked: Decimal::ZERO,
        }
    }

    pub fn available(&self) -> Decimal {
        self.amount - self.locked
    }
}
