//! Symbol registry (spec §4.1): a static, process-lifetime table of supported
//! trading symbols.

use std::collections::HashMap;

use rust_decimal_macros::dec;

use crate::models::Symbol;

pub struct SymbolRegistry {
    by_ticker: HashMap<String, Symbol>,
    order: Vec<String>,
}

impl SymbolRegistry {
    pub fn new(symbols: Vec<Symbol>) -> Self {
        let mut by_ticker = HashMap::with_capacity(symbols.len());
        let mut order = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            order.push(symbol.ticker.clone());
            by_ticker.insert(symbol.ticker.clone(), symbol);
        }
        Self { by_ticker, order }
    }

    /// Built-in default symbol set, used unless overridden by the
    /// `supported_symbols` configuration option.
    pub fn default_symbols() -> Vec<Symbol> {
        vec![
            Symbol {
                ticker: "BTC-USD".to_string(),
                display_name: "Bitcoin / US Dollar".to_string(),
                seed_price: dec!(64321.55),
                market_cap_hint: dec!(1260000000000),
            },
            Symbol {
                ticker: "ETH-USD".to_string(),
                display_name: "Ethereum / US Dollar".to_string(),
                seed_price: dec!(3456.78),
                market_cap_hint: dec!(415000000000),
            },
            Symbol {
                ticker: "SOL-USD".to_string(),
                display_name: "Solana / US Dollar".to_string(),
                seed_price: dec!(142.30),
                market_cap_hint: dec!(66000000000),
            },
        ]
    }

    pub fn exists(&self, ticker: &str) -> bool {
        self.by_ticker.contains_key(ticker)
    }

    pub fn get(&self, ticker: &str) -> Option<Symbol> {
        self.by_ticker.get(ticker).cloned()
    }

    pub fn list(&self) -> Vec<Symbol> {
        self.order
            .iter()
            .filter_map(|ticker| self.by_ticker.get(ticker).cloned())
            .collect()
    }
}

impl Default for SymbolRegistry {
    fn default() -> Self {
        Self::new(Self::default_symbols())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_contains_btc_usd() {
        let registry = SymbolRegistry::default();
        assert!(registry.exists("BTC-USD"));
        assert_eq!(registry.get("BTC-USD").unwrap().seed_price, dec!(64321.55));
        assert!(!registry.exists("DOGE-USD"));
    }

    #[test]
    fn list_preserves_construction_order() {
        let registry = SymbolRegistry::default();
        let tickers: Vec<String> = registry.list().into_iter().map(|s| s.ticker).collect();
        assert_eq!(tickers, vec!["BTC-USD", "ETH-USD", "SOL-USD"]);
    }
}
