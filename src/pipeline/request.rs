use serde::{Deserialize, Serialize};

use super::config::SurfaceConfig;
use crate::chain::OptionSide;
use crate::error::{SurfaceError, SurfaceResult};
use crate::render::SurfaceLabels;
use crate::surface::{EmitMode, MoneynessBounds};

/// One user request for a surface: what to fetch, which filters to apply and
/// how to emit the result.
///
/// `None` for a filter means the filter is not applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceRequest {
    /// Upper-cased ticker symbol
    pub ticker: String,
    pub side: OptionSide,
    pub moneyness: Option<MoneynessBounds>,
    pub min_days: Option<u32>,
    pub mode: EmitMode,
}

impl SurfaceRequest {
    /// Request with no filters and surface output.
    pub fn new(ticker: &str, side: OptionSide) -> SurfaceResult<Self> {
        let request = Self {
            ticker: normalize_ticker(ticker)?,
            side,
            moneyness: None,
            min_days: None,
            mode: EmitMode::default(),
        };
        Ok(request)
    }

    /// Request with the filters and output mode of `config`.
    pub fn from_config(
        ticker: &str,
        side: OptionSide,
        config: &SurfaceConfig,
    ) -> SurfaceResult<Self> {
        config.validate()?;
        Ok(Self {
            moneyness: config.moneyness(),
            min_days: config.min_days(),
            mode: config.output.mode,
            ..Self::new(ticker, side)?
        })
    }

    pub fn with_moneyness(self, lower_pct: f64, upper_pct: f64) -> SurfaceResult<Self> {
        self.with_moneyness_bounds(MoneynessBounds::new(lower_pct, upper_pct)?)
    }

    pub fn with_moneyness_bounds(mut self, bounds: MoneynessBounds) -> SurfaceResult<Self> {
        bounds.validate()?;
        self.moneyness = Some(bounds);
        Ok(self)
    }

    pub fn without_moneyness(mut self) -> Self {
        self.moneyness = None;
        self
    }

    pub fn with_min_days(mut self, min_days: u32) -> Self {
        self.min_days = Some(min_days);
        self
    }

    pub fn without_min_days(mut self) -> Self {
        self.min_days = None;
        self
    }

    pub fn with_mode(mut self, mode: EmitMode) -> Self {
        self.mode = mode;
        self
    }

    /// Check the request before any provider call.
    pub fn validate(&self) -> SurfaceResult<()> {
        normalize_ticker(&self.ticker)?;
        if let Some(bounds) = &self.moneyness {
            bounds.validate()?;
        }
        Ok(())
    }

    /// Validated copy with the ticker trimmed and upper-cased.
    ///
    /// The fields are public, so a request may hold a ticker that never went
    /// through [`normalize_ticker`]; builds run on this copy instead.
    pub fn normalized(&self) -> SurfaceResult<Self> {
        self.validate()?;
        Ok(Self {
            ticker: normalize_ticker(&self.ticker)?,
            ..self.clone()
        })
    }

    pub fn labels(&self) -> SurfaceLabels {
        SurfaceLabels::new(&self.ticker, self.side)
    }
}

/// Trim and upper-case a ticker, rejecting blank input.
pub fn normalize_ticker(ticker: &str) -> SurfaceResult<String> {
    let ticker = ticker.trim();
    if ticker.is_empty() {
        return Err(SurfaceError::invalid_input("ticker must not be blank"));
    }
    Ok(ticker.to_uppercase())
}
