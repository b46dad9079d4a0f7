//! Price simulation and distribution (spec §4.7).

mod provider;
mod service;
mod table;

pub use provider::{ProviderError, QuoteProvider, Simulator};
pub use service::PriceService;
pub use table::PriceTable;
