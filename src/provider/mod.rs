//! Market data providers
//!
//! The core never talks to a market data service directly. It reads through
//! [`OptionDataProvider`], whose shape mirrors what listed-options feeds expose:
//! a list of expiration dates per ticker, and a calls/puts chain per expiration.
//!
//! Two implementations ship with the crate:
//! - [`InMemoryProvider`] for tests, demos and embedding callers that already
//!   hold the chain
//! - [`CsvChainProvider`] for offline snapshot files

pub mod csv_provider;
pub mod memory;

pub use csv_provider::*;
pub use memory::*;

use serde::{Deserialize, Serialize};

use crate::chain::OptionSide;
use crate::error::SurfaceResult;

/// A raw contract as returned by the provider, before normalization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawContract {
    pub strike: f64,
    pub implied_volatility: f64,
}

impl RawContract {
    pub fn new(strike: f64, implied_volatility: f64) -> Self {
        Self {
            strike,
            implied_volatility,
        }
    }
}

/// Calls and puts listed for one expiration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawOptionChain {
    pub calls: Vec<RawContract>,
    pub puts: Vec<RawContract>,
}

impl RawOptionChain {
    pub fn side(&self, side: OptionSide) -> &[RawContract] {
        match side {
            OptionSide::Call => &self.calls,
            OptionSide::Put => &self.puts,
        }
    }

    pub(crate) fn side_mut(&mut self, side: OptionSide) -> &mut Vec<RawContract> {
        match side {
            OptionSide::Call => &mut self.calls,
            OptionSide::Put => &mut self.puts,
        }
    }
}

/// Source of option chain data.
///
/// Calls are blocking. Implementations report unreachable services and
/// malformed payloads as [`crate::SurfaceError::Provider`]; the core does not
/// retry.
pub trait OptionDataProvider {
    /// Expiration dates (ISO `YYYY-MM-DD`) offered for `ticker`.
    fn list_expirations(&self, ticker: &str) -> SurfaceResult<Vec<String>>;

    /// Calls and puts for one expiration.
    fn option_chain(&self, ticker: &str, expiration: &str) -> SurfaceResult<RawOptionChain>;

    /// Last traded price of the underlying, if the provider knows it.
    fn spot_price(&self, _ticker: &str) -> SurfaceResult<Option<f64>> {
        Ok(None)
    }
}

impl<P: OptionDataProvider + ?Sized> OptionDataProvider for &P {
    fn list_expirations(&self, ticker: &str) -> SurfaceResult<Vec<String>> {
        (**self).list_expirations(ticker)
    }

    fn option_chain(&self, ticker: &str, expiration: &str) -> SurfaceResult<RawOptionChain> {
        (**self).option_chain(ticker, expiration)
    }

    fn spot_price(&self, ticker: &str) -> SurfaceResult<Option<f64>> {
        (**self).spot_price(ticker)
    }
}
