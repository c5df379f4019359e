//! Rendering sinks
//!
//! A sink receives either a full surface (axes plus grid) or a raw point cloud
//! and draws or writes it. Sinks never see an empty payload: the emitter
//! rejects those before calling them.

pub mod csv_writer;
pub mod svg;

pub use csv_writer::*;
pub use svg::*;

use serde::{Deserialize, Serialize};

use crate::chain::OptionSide;
use crate::error::SurfaceResult;

pub const STRIKE_AXIS_LABEL: &str = "Strike Price";
pub const MATURITY_AXIS_LABEL: &str = "Maturity (Days)";
pub const IV_AXIS_LABEL: &str = "Implied Volatility";

/// Cosmetic metadata attached to an emitted surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceLabels {
    pub ticker: String,
    pub side: OptionSide,
    pub title: String,
    pub strike_label: String,
    pub maturity_label: String,
    pub iv_label: String,
}

impl SurfaceLabels {
    pub fn new(ticker: &str, side: OptionSide) -> Self {
        let ticker = ticker.to_uppercase();
        Self {
            title: format!("Volatility Surface for {} {} Options", ticker, side.title()),
            ticker,
            side,
            strike_label: STRIKE_AXIS_LABEL.to_string(),
            maturity_label: MATURITY_AXIS_LABEL.to_string(),
            iv_label: IV_AXIS_LABEL.to_string(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

/// Destination for an emitted surface.
pub trait SurfaceSink {
    /// Draw a gridded surface; `iv[m][s]` pairs `maturity_axis[m]` with
    /// `strike_axis[s]`.
    fn render_surface(
        &mut self,
        strike_axis: &[f64],
        maturity_axis: &[i64],
        iv: &[Vec<f64>],
        labels: &SurfaceLabels,
    ) -> SurfaceResult<()>;

    /// Draw raw observations given as parallel columns.
    fn render_scatter(
        &mut self,
        strikes: &[f64],
        maturities: &[i64],
        ivs: &[f64],
        labels: &SurfaceLabels,
    ) -> SurfaceResult<()>;
}

impl<S: SurfaceSink + ?Sized> SurfaceSink for &mut S {
    fn render_surface(
        &mut self,
        strike_axis: &[f64],
        maturity_axis: &[i64],
        iv: &[Vec<f64>],
        labels: &SurfaceLabels,
    ) -> SurfaceResult<()> {
        (**self).render_surface(strike_axis, maturity_axis, iv, labels)
    }

    fn render_scatter(
        &mut self,
        strikes: &[f64],
        maturities: &[i64],
        ivs: &[f64],
        labels: &SurfaceLabels,
    ) -> SurfaceResult<()> {
        (**self).render_scatter(strikes, maturities, ivs, labels)
    }
}
