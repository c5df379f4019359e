//! # iv-surface: Implied Volatility Surfaces from Listed Option Chains
//!
//! `iv-surface` turns the option chain of a single underlying into an implied
//! volatility surface on a strike × maturity grid, ready to draw.
//!
//! ## Pipeline
//!
//! 1. **Normalize**: every contract on the chosen side (calls or puts), across
//!    every listed expiration, becomes an `(strike, maturity_days, iv)`
//!    observation. Maturity is whole days from "now" to the expiration date.
//! 2. **Filter** (optional, order-independent):
//!    - moneyness band: keep strikes within `[spot * lower, spot * upper]`
//!    - short maturity: keep contracts with at least `min_days` to expiry
//! 3. **Aggregate**: build the sorted distinct strike and maturity axes; each
//!    cell is the mean IV of the observations at exactly that pair, `0.0`
//!    otherwise.
//! 4. **Emit**: hand the grid (or the raw point cloud) to a [`SurfaceSink`].
//!    Empty input is reported as [`SurfaceError::NoData`] and never reaches the
//!    sink.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use iv_surface::{
//!     default_configs, local_now, CsvChainProvider, OptionSide, SurfacePipeline,
//!     SurfaceRequest, SvgRenderer,
//! };
//!
//! let provider = CsvChainProvider::from_path("snapshots/aapl.csv")?;
//! let config = default_configs::standard();
//! let request = SurfaceRequest::from_config("aapl", OptionSide::Call, &config)?;
//!
//! let pipeline = SurfacePipeline::new(provider);
//! let mut svg = SvgRenderer::new("aapl_calls.svg");
//! match pipeline.run(&request, local_now(), &mut svg) {
//!     Ok(emission) => println!("drew {} points", emission.points),
//!     Err(e) if e.is_no_data() => println!("No data available."),
//!     Err(e) => return Err(e.into()),
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Configuration Presets
//!
//! - `standard()`: 50%-150% of spot, at least one day to expiry
//! - `near_the_money()`: 90%-110% of spot, at least one week
//! - `unfiltered()`: everything the provider returns
//! - `long_dated()`: 70%-130% of spot, 90 days and out, scatter output

// ================================================================================================
// MODULES
// ================================================================================================

pub mod chain;
pub mod error;
pub mod pipeline;
pub mod provider;
pub mod render;
pub mod surface;

// ================================================================================================
// IMPORTS
// ================================================================================================

use chrono::NaiveDateTime;

// ================================================================================================
// PUBLIC RE-EXPORTS
// ================================================================================================

// Observations and normalization
pub use chain::{
    maturity_days, normalize_chain, parse_expiration, Observation, ObservationSet, OptionSide,
};

// Errors
pub use error::{DataStage, SurfaceError, SurfaceResult};

// Providers
pub use provider::{
    CsvChainProvider, InMemoryProvider, OptionDataProvider, RawContract, RawOptionChain,
};

// Filters, aggregation and emission
pub use surface::{
    aggregate, emit, emit_scatter, emit_surface, exclude_short_maturity, filter_by_moneyness,
    filter_by_moneyness_bounds, EmitMode, Emission, MoneynessBounds, SurfaceGrid, EMPTY_CELL,
};

// Pipeline orchestration and configuration
pub use pipeline::{
    config::{default_config_template, FilterConfig, OutputConfig, SurfaceConfig},
    process::{apply_filters, build_surface, local_now, FilterReport, SurfaceBuild, SurfacePipeline},
    request::{normalize_ticker, SurfaceRequest},
};

// Rendering sinks
pub use render::{CsvGridWriter, SurfaceLabels, SurfaceSink, SvgRenderer};

// ================================================================================================
// DEFAULT CONFIGURATIONS
// ================================================================================================

/// Pre-configured filter and output settings.
///
/// # Available Configurations
///
/// - [`standard()`]: the interactive defaults
/// - [`near_the_money()`]: tight band, skip the first week
/// - [`unfiltered()`]: no filtering at all
/// - [`long_dated()`]: longer expiries as a point cloud
pub mod default_configs {
    use crate::pipeline::config::SurfaceConfig;

    /// Both filters on: strikes within 50%-150% of spot, at least one day to
    /// expiry, surface output.
    ///
    /// # Example
    ///
    /// ```rust
    /// use iv_surface::default_configs;
    ///
    /// let config = default_configs::standard();
    /// assert_eq!(config.filters.min_days, 1);
    /// ```
    pub fn standard() -> SurfaceConfig {
        SurfaceConfig::standard()
    }

    /// Strikes within 90%-110% of spot and at least seven days to expiry.
    ///
    /// Useful when short-dated wings dominate the colour scale.
    pub fn near_the_money() -> SurfaceConfig {
        SurfaceConfig::near_the_money()
    }

    /// No filtering; expired and same-day contracts included.
    pub fn unfiltered() -> SurfaceConfig {
        SurfaceConfig::unfiltered()
    }

    /// Strikes within 70%-130% of spot, 90 days and out, drawn as raw points.
    pub fn long_dated() -> SurfaceConfig {
        SurfaceConfig::long_dated()
    }
}

/// Build a surface for `ticker`/`side` with the filters and output mode of
/// `config`.
///
/// Shorthand for [`SurfaceRequest::from_config`] followed by
/// [`build_surface`].
///
/// # Example
///
/// ```rust
/// use chrono::NaiveDate;
/// use iv_surface::{build_with_config, default_configs, InMemoryProvider, OptionSide, RawContract, RawOptionChain};
///
/// let provider = InMemoryProvider::new()
///     .with_spot("XYZ", 100.0)
///     .with_chain("XYZ", "2025-01-31", RawOptionChain {
///         calls: vec![RawContract::new(95.0, 0.24), RawContract::new(105.0, 0.21)],
///         puts: vec![],
///     });
/// let now = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
///
/// let build = build_with_config(&provider, "xyz", OptionSide::Call, &default_configs::standard(), now)?;
/// assert_eq!(build.grid.strike_axis(), &[95.0, 105.0]);
/// assert_eq!(build.grid.maturity_axis(), &[30]);
/// # Ok::<(), iv_surface::SurfaceError>(())
/// ```
pub fn build_with_config<P: OptionDataProvider>(
    provider: &P,
    ticker: &str,
    side: OptionSide,
    config: &SurfaceConfig,
    now: NaiveDateTime,
) -> SurfaceResult<SurfaceBuild> {
    let request = SurfaceRequest::from_config(ticker, side, config)?;
    build_surface(provider, &request, now)
}
