use std::collections::{BTreeMap, HashMap};

use super::{OptionDataProvider, RawContract, RawOptionChain};
use crate::chain::OptionSide;
use crate::error::{SurfaceError, SurfaceResult};

/// Provider backed by chains held in memory.
///
/// Tickers are matched case-insensitively. Expirations are listed in ascending
/// order, which for ISO dates is chronological order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProvider {
    chains: BTreeMap<String, BTreeMap<String, RawOptionChain>>,
    spots: HashMap<String, f64>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the chain for one ticker and expiration.
    pub fn with_chain(
        mut self,
        ticker: &str,
        expiration: &str,
        chain: RawOptionChain,
    ) -> Self {
        self.insert_chain(ticker, expiration, chain);
        self
    }

    pub fn with_spot(mut self, ticker: &str, spot: f64) -> Self {
        self.set_spot(ticker, spot);
        self
    }

    pub fn insert_chain(&mut self, ticker: &str, expiration: &str, chain: RawOptionChain) {
        self.chains
            .entry(ticker.to_uppercase())
            .or_default()
            .insert(expiration.to_string(), chain);
    }

    /// Append a single contract to the chain for `ticker`/`expiration`.
    pub fn push_contract(
        &mut self,
        ticker: &str,
        expiration: &str,
        side: OptionSide,
        contract: RawContract,
    ) {
        self.chains
            .entry(ticker.to_uppercase())
            .or_default()
            .entry(expiration.to_string())
            .or_default()
            .side_mut(side)
            .push(contract);
    }

    pub fn set_spot(&mut self, ticker: &str, spot: f64) {
        self.spots.insert(ticker.to_uppercase(), spot);
    }

    pub fn tickers(&self) -> impl Iterator<Item = &str> {
        self.chains.keys().map(String::as_str)
    }
}

impl OptionDataProvider for InMemoryProvider {
    fn list_expirations(&self, ticker: &str) -> SurfaceResult<Vec<String>> {
        Ok(self
            .chains
            .get(&ticker.to_uppercase())
            .map(|by_exp| by_exp.keys().cloned().collect())
            .unwrap_or_default())
    }

    fn option_chain(&self, ticker: &str, expiration: &str) -> SurfaceResult<RawOptionChain> {
        self.chains
            .get(&ticker.to_uppercase())
            .and_then(|by_exp| by_exp.get(expiration))
            .cloned()
            .ok_or_else(|| {
                SurfaceError::provider(format!(
                    "no option chain for {} expiring {}",
                    ticker.to_uppercase(),
                    expiration
                ))
            })
    }

    fn spot_price(&self, ticker: &str) -> SurfaceResult<Option<f64>> {
        Ok(self.spots.get(&ticker.to_uppercase()).copied())
    }
}
