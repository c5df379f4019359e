use chrono::NaiveDateTime;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::request::SurfaceRequest;
use crate::chain::{normalize_chain, ObservationSet};
use crate::error::{DataStage, SurfaceError, SurfaceResult};
use crate::provider::OptionDataProvider;
use crate::render::{SurfaceLabels, SurfaceSink};
use crate::surface::{
    aggregate, emit_scatter, emit_surface, exclude_short_maturity, filter_by_moneyness_bounds,
    EmitMode, Emission, SurfaceGrid,
};

/// Which filters actually ran during a build.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FilterReport {
    /// Spot used for the moneyness band, when that filter ran
    pub spot: Option<f64>,
    pub moneyness_applied: bool,
    /// Set when the moneyness filter was requested but no usable spot existed
    pub moneyness_skipped: bool,
    pub maturity_applied: bool,
    pub before: usize,
    pub after: usize,
}

/// Result of one surface build, ready to emit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceBuild {
    pub request: SurfaceRequest,
    /// Observations that survived the filters
    pub observations: ObservationSet,
    pub grid: SurfaceGrid,
    pub filters: FilterReport,
}

impl SurfaceBuild {
    pub fn labels(&self) -> SurfaceLabels {
        self.request.labels()
    }

    /// Hand the build to `sink` in the requested output mode.
    pub fn emit<S>(&self, sink: &mut S) -> SurfaceResult<Emission>
    where
        S: SurfaceSink + ?Sized,
    {
        let labels = self.labels();
        match self.request.mode {
            EmitMode::Surface => emit_surface(&self.grid, &labels, sink),
            EmitMode::Scatter => emit_scatter(&self.observations, &labels, sink),
        }
    }
}

/// Apply the filters named in `request` to `set`.
///
/// The moneyness band needs a spot; with `spot` missing, zero, negative or not
/// finite the band is skipped and the report says so. The two filters are
/// independent masks, so the order they run in does not matter.
pub fn apply_filters(
    set: &ObservationSet,
    spot: Option<f64>,
    request: &SurfaceRequest,
) -> SurfaceResult<(ObservationSet, FilterReport)> {
    let mut report = FilterReport {
        before: set.len(),
        ..FilterReport::default()
    };
    let mut current = set.clone();

    if let Some(bounds) = &request.moneyness {
        match spot.filter(|s| s.is_finite() && *s > 0.0) {
            Some(spot) => {
                current = filter_by_moneyness_bounds(&current, spot, bounds)?;
                report.spot = Some(spot);
                report.moneyness_applied = true;
            }
            None => {
                warn!(
                    "{}: no usable spot price ({:?}), skipping moneyness filter",
                    set.ticker(),
                    spot
                );
                report.moneyness_skipped = true;
            }
        }
    }

    if let Some(min_days) = request.min_days {
        current = exclude_short_maturity(&current, min_days);
        report.maturity_applied = true;
    }

    report.after = current.len();
    Ok((current, report))
}

/// Runs surface builds against one provider.
///
/// Holds no state between builds; each call is a function of the provider's
/// data, the request and `now`.
pub struct SurfacePipeline<P> {
    provider: P,
}

impl<P: OptionDataProvider> SurfacePipeline<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Fetch, normalize, filter and aggregate.
    ///
    /// # Errors
    ///
    /// * `InvalidInput` if the request is invalid (checked before the provider
    ///   is called)
    /// * `NoData` if the provider returns nothing for the side, or nothing
    ///   survives the filters
    /// * `Provider` for provider failures and malformed records
    pub fn build(&self, request: &SurfaceRequest, now: NaiveDateTime) -> SurfaceResult<SurfaceBuild> {
        let request = &request.normalized()?;
        info!(
            "building {} {} surface as of {}",
            request.ticker, request.side, now
        );

        let fetched = normalize_chain(&self.provider, &request.ticker, request.side, now)?;
        if fetched.is_empty() {
            return Err(SurfaceError::NoData {
                ticker: request.ticker.clone(),
                side: request.side,
                stage: DataStage::Fetch,
            });
        }

        let spot = match request.moneyness {
            Some(_) => self.provider.spot_price(&request.ticker)?,
            None => None,
        };
        let (observations, filters) = apply_filters(&fetched, spot, request)?;
        debug!(
            "{} {}: {} -> {} observations after filters",
            request.ticker, request.side, filters.before, filters.after
        );
        if observations.is_empty() {
            return Err(SurfaceError::NoData {
                ticker: request.ticker.clone(),
                side: request.side,
                stage: DataStage::Filter,
            });
        }

        let grid = aggregate(&observations);
        Ok(SurfaceBuild {
            request: request.clone(),
            observations,
            grid,
            filters,
        })
    }

    /// Build and hand the result to `sink`.
    ///
    /// The sink is only called when there is something to draw.
    pub fn run<S>(
        &self,
        request: &SurfaceRequest,
        now: NaiveDateTime,
        sink: &mut S,
    ) -> SurfaceResult<Emission>
    where
        S: SurfaceSink + ?Sized,
    {
        self.build(request, now)?.emit(sink)
    }
}

/// One-shot build without keeping a pipeline around.
pub fn build_surface<P: OptionDataProvider>(
    provider: &P,
    request: &SurfaceRequest,
    now: NaiveDateTime,
) -> SurfaceResult<SurfaceBuild> {
    SurfacePipeline::new(provider).build(request, now)
}

/// Current local time, for callers that build "as of now".
pub fn local_now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}
