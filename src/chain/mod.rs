//! Option chain observations
//!
//! Turns raw provider records into an [`ObservationSet`]: one
//! (strike, maturity in days, implied volatility) triple per listed contract on
//! the chosen side, across all expirations.

pub mod normalize;
pub mod types;

pub use normalize::*;
pub use types::*;
