//! Scaled fixed-point key used to order price levels in the resting book.
//! `Decimal` does not implement `Ord` over a `BTreeMap` key position as
//! cheaply as a scaled integer does, so price levels are stored this way
//! internally; the public API always deals in `Decimal`.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

const SCALE: i64 = 100_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PriceLevel(i64);

impl PriceLevel {
    pub fn from_decimal(price: Decimal) -> Self {
        let scaled = (price * Decimal::from(SCALE)).round();
        PriceLevel(scaled.to_i64().unwrap_or(i64::MAX))
    }

    pub fn to_decimal(self) -> Decimal {
        Decimal::from(self.0) / Decimal::from(SCALE)
    }
}
