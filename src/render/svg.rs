use std::fmt::Display;
use std::ops::Range;
use std::path::{Path, PathBuf};

use log::{info, warn};
use plotters::prelude::*;

use super::{SurfaceLabels, SurfaceSink};
use crate::error::{SurfaceError, SurfaceResult};

/// Canvas size matching the interactive chart the surface was designed for.
pub const DEFAULT_WIDTH: u32 = 1200;
pub const DEFAULT_HEIGHT: u32 = 800;

fn draw_err(err: impl Display) -> SurfaceError {
    SurfaceError::render(format!("drawing failed: {}", err))
}

/// Pad an axis so single-valued axes still give a drawable range.
fn padded(lo: f64, hi: f64) -> Range<f64> {
    let span = hi - lo;
    if span.abs() < f64::EPSILON {
        let pad = lo.abs().max(1.0) * 0.05;
        (lo - pad)..(hi + pad)
    } else {
        let pad = span * 0.02;
        (lo - pad)..(hi + pad)
    }
}

fn min_max(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

/// Blue for low volatility through green to yellow for high.
fn iv_colour(v: f64, lo: f64, hi: f64) -> HSLColor {
    let t = if hi > lo {
        ((v - lo) / (hi - lo)).clamp(0.0, 1.0)
    } else {
        0.5
    };
    HSLColor(0.7 - 0.55 * t, 0.75, 0.3 + 0.3 * t)
}

fn cell(strike_axis: &[f64], maturity_axis: &[i64], iv: &[Vec<f64>], strike: f64, maturity: f64) -> f64 {
    let s = strike_axis.binary_search_by(|probe| probe.total_cmp(&strike));
    let m = maturity_axis.binary_search(&(maturity as i64));
    match (s, m) {
        (Ok(s), Ok(m)) => iv[m][s],
        _ => 0.0,
    }
}

/// Renders surfaces to an SVG file with plotters.
///
/// Surface mode draws the grid as a 3-D mesh, scatter mode draws one marker per
/// observation. Strike runs along x, maturity along z and implied volatility
/// is the height.
#[derive(Debug, Clone)]
pub struct SvgRenderer {
    path: PathBuf,
    width: u32,
    height: u32,
    yaw: f64,
    pitch: f64,
}

impl SvgRenderer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            yaw: 0.6,
            pitch: 0.35,
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Camera angles in radians.
    pub fn with_view(mut self, yaw: f64, pitch: f64) -> Self {
        self.yaw = yaw;
        self.pitch = pitch;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn axis_footer(&self, labels: &SurfaceLabels) -> String {
        format!(
            "x: {}    y: {}    z: {}",
            labels.strike_label, labels.iv_label, labels.maturity_label
        )
    }
}

impl SurfaceSink for SvgRenderer {
    fn render_surface(
        &mut self,
        strike_axis: &[f64],
        maturity_axis: &[i64],
        iv: &[Vec<f64>],
        labels: &SurfaceLabels,
    ) -> SurfaceResult<()> {
        let (x_lo, x_hi) = min_max(strike_axis.iter().copied());
        let (z_lo, z_hi) = min_max(maturity_axis.iter().map(|&m| m as f64));
        // sentinel cells are drawn at 0.0, so the height axis covers them
        let (y_lo, y_hi) = min_max(iv.iter().flat_map(|row| row.iter().copied()));
        let (yaw, pitch) = (self.yaw, self.pitch);

        let root = SVGBackend::new(&self.path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;

        let mut chart = ChartBuilder::on(&root)
            .margin(20)
            .caption(&labels.title, ("sans-serif", 30))
            .build_cartesian_3d(padded(x_lo, x_hi), padded(y_lo, y_hi), padded(z_lo, z_hi))
            .map_err(draw_err)?;

        chart.with_projection(|mut pb| {
            pb.yaw = yaw;
            pb.pitch = pitch;
            pb.scale = 0.9;
            pb.into_matrix()
        });

        chart
            .configure_axes()
            .light_grid_style(BLACK.mix(0.15))
            .max_light_lines(3)
            .draw()
            .map_err(draw_err)?;

        if strike_axis.len() < 2 || maturity_axis.len() < 2 {
            // a mesh needs two values on each axis; draw the cells as a curve
            warn!(
                "{}: {}x{} grid cannot form a mesh, drawing cells as markers",
                labels.title,
                maturity_axis.len(),
                strike_axis.len()
            );
            let points: Vec<(f64, f64, f64)> = maturity_axis
                .iter()
                .zip(iv)
                .flat_map(|(&maturity, row)| {
                    strike_axis
                        .iter()
                        .zip(row)
                        .map(move |(&strike, &v)| (strike, v, maturity as f64))
                })
                .collect();
            chart
                .draw_series(LineSeries::new(
                    points.iter().copied(),
                    BLACK.mix(0.4).stroke_width(1),
                ))
                .map_err(draw_err)?;
            chart
                .draw_series(points.iter().map(|&(strike, v, maturity)| {
                    Circle::new(
                        (strike, v, maturity),
                        4,
                        iv_colour(v, y_lo, y_hi).filled(),
                    )
                }))
                .map_err(draw_err)?;
        } else {
            let shade = |v: &f64| -> ShapeStyle { iv_colour(*v, y_lo, y_hi).mix(0.85).filled() };
            chart
                .draw_series(
                    SurfaceSeries::xoz(
                        strike_axis.iter().copied(),
                        maturity_axis.iter().map(|&m| m as f64),
                        |strike: f64, maturity: f64| {
                            cell(strike_axis, maturity_axis, iv, strike, maturity)
                        },
                    )
                    .style_func(&shade),
                )
                .map_err(draw_err)?;
        }

        root.draw(&Text::new(
            self.axis_footer(labels),
            (20, self.height as i32 - 30),
            ("sans-serif", 16),
        ))
        .map_err(draw_err)?;
        root.present().map_err(draw_err)?;

        info!("surface chart saved to {}", self.path.display());
        Ok(())
    }

    fn render_scatter(
        &mut self,
        strikes: &[f64],
        maturities: &[i64],
        ivs: &[f64],
        labels: &SurfaceLabels,
    ) -> SurfaceResult<()> {
        let (x_lo, x_hi) = min_max(strikes.iter().copied());
        let (z_lo, z_hi) = min_max(maturities.iter().map(|&m| m as f64));
        let (y_lo, y_hi) = min_max(ivs.iter().copied());
        let (yaw, pitch) = (self.yaw, self.pitch);

        let root = SVGBackend::new(&self.path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;

        let mut chart = ChartBuilder::on(&root)
            .margin(20)
            .caption(&labels.title, ("sans-serif", 30))
            .build_cartesian_3d(padded(x_lo, x_hi), padded(y_lo, y_hi), padded(z_lo, z_hi))
            .map_err(draw_err)?;

        chart.with_projection(|mut pb| {
            pb.yaw = yaw;
            pb.pitch = pitch;
            pb.scale = 0.9;
            pb.into_matrix()
        });

        chart
            .configure_axes()
            .light_grid_style(BLACK.mix(0.15))
            .max_light_lines(3)
            .draw()
            .map_err(draw_err)?;

        chart
            .draw_series(strikes.iter().zip(maturities).zip(ivs).map(
                |((&strike, &maturity), &v)| {
                    Circle::new(
                        (strike, v, maturity as f64),
                        3,
                        iv_colour(v, y_lo, y_hi).filled(),
                    )
                },
            ))
            .map_err(draw_err)?;

        root.draw(&Text::new(
            self.axis_footer(labels),
            (20, self.height as i32 - 30),
            ("sans-serif", 16),
        ))
        .map_err(draw_err)?;
        root.present().map_err(draw_err)?;

        info!(
            "scatter chart ({} points) saved to {}",
            strikes.len(),
            self.path.display()
        );
        Ok(())
    }
}
