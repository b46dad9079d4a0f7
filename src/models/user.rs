use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a participant in the exchange. `0` is reserved for the market-maker
/// pseudo-account: a process-wide inventory used to fill market orders when no
/// counterparty exists. Registration of real users lives outside this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl UserId {
    pub const MARKET_MAKER: UserId = UserId(0);

    pub fn is_market_maker(self) -> bool {
        self == Self::MARKET_MAKER
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for UserId {
    fn from(id: u64) -> Self {
        UserId(id)
    }
}
