use std::fmt;
use std::str::FromStr;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::grid::{aggregate, SurfaceGrid};
use crate::chain::ObservationSet;
use crate::error::{DataStage, SurfaceError, SurfaceResult};
use crate::render::{SurfaceLabels, SurfaceSink};

/// Shape in which a surface is handed to the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmitMode {
    /// Strike axis, maturity axis and the aggregated IV grid
    #[default]
    Surface,
    /// Raw strike / maturity / IV columns, one entry per observation
    Scatter,
}

impl fmt::Display for EmitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmitMode::Surface => f.write_str("surface"),
            EmitMode::Scatter => f.write_str("scatter"),
        }
    }
}

impl FromStr for EmitMode {
    type Err = SurfaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "surface" | "grid" => Ok(EmitMode::Surface),
            "scatter" | "trisurf" | "points" => Ok(EmitMode::Scatter),
            other => Err(SurfaceError::invalid_input(format!(
                "unknown output mode '{}', expected 'surface' or 'scatter'",
                other
            ))),
        }
    }
}

/// What was forwarded to the sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Emission {
    pub mode: EmitMode,
    pub labels: SurfaceLabels,
    /// Observations in scatter mode, populated cells in surface mode
    pub points: usize,
}

fn no_data(labels: &SurfaceLabels) -> SurfaceError {
    warn!("{}: nothing to render", labels.title);
    SurfaceError::NoData {
        ticker: labels.ticker.clone(),
        side: labels.side,
        stage: DataStage::Emit,
    }
}

/// Forward a gridded surface to `sink` unchanged.
///
/// An empty grid is reported as [`SurfaceError::NoData`] and the sink is not
/// called.
pub fn emit_surface<S>(
    grid: &SurfaceGrid,
    labels: &SurfaceLabels,
    sink: &mut S,
) -> SurfaceResult<Emission>
where
    S: SurfaceSink + ?Sized,
{
    if grid.is_empty() {
        return Err(no_data(labels));
    }
    sink.render_surface(grid.strike_axis(), grid.maturity_axis(), grid.iv(), labels)?;
    let (n_mat, n_strike) = grid.dimensions();
    info!(
        "emitted {}x{} surface for {} {}",
        n_mat, n_strike, labels.ticker, labels.side
    );
    Ok(Emission {
        mode: EmitMode::Surface,
        labels: labels.clone(),
        points: grid.populated_cells(),
    })
}

/// Forward raw observations to `sink` as parallel columns.
///
/// An empty set is reported as [`SurfaceError::NoData`] and the sink is not
/// called.
pub fn emit_scatter<S>(
    set: &ObservationSet,
    labels: &SurfaceLabels,
    sink: &mut S,
) -> SurfaceResult<Emission>
where
    S: SurfaceSink + ?Sized,
{
    if set.is_empty() {
        return Err(no_data(labels));
    }
    sink.render_scatter(set.strikes(), set.maturities(), set.ivs(), labels)?;
    info!(
        "emitted {} scattered points for {} {}",
        set.len(),
        labels.ticker,
        labels.side
    );
    Ok(Emission {
        mode: EmitMode::Scatter,
        labels: labels.clone(),
        points: set.len(),
    })
}

/// Emit `set` in the requested `mode`, aggregating first for surface output.
pub fn emit<S>(
    set: &ObservationSet,
    mode: EmitMode,
    labels: &SurfaceLabels,
    sink: &mut S,
) -> SurfaceResult<Emission>
where
    S: SurfaceSink + ?Sized,
{
    if set.is_empty() {
        return Err(no_data(labels));
    }
    match mode {
        EmitMode::Surface => emit_surface(&aggregate(set), labels, sink),
        EmitMode::Scatter => emit_scatter(set, labels, sink),
    }
}
