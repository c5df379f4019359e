// Example: surface_demo.rs
// Builds a synthetic option chain with a skewed smile and a term structure,
// runs it through the surface pipeline, prints the grid and writes an SVG.
//
// Usage:
//     cargo run --example surface_demo
//
// The output image is written to surface_demo.svg in the working directory.

use std::error::Error;

use chrono::NaiveDate;
use iv_surface::{
    default_configs, InMemoryProvider, OptionSide, RawContract, RawOptionChain, SurfacePipeline,
    SurfaceRequest, SvgRenderer,
};

fn synthetic_chain(spot: f64, days: i64) -> RawOptionChain {
    let t = days as f64 / 365.0;
    let atm_vol = 0.22 + 0.04 * (-t * 2.0).exp();
    let skew = -0.12;
    let smile = 0.35;

    let mut chain = RawOptionChain::default();
    for pct in (60..=140).step_by(5) {
        let strike = spot * pct as f64 / 100.0;
        let k = (strike / spot).ln();
        let iv = (atm_vol + skew * k + smile * k * k / t.sqrt().max(0.2)).max(0.05);
        chain.calls.push(RawContract::new(strike, iv));
        chain.puts.push(RawContract::new(strike, iv + 0.01));
    }
    chain
}

fn main() -> Result<(), Box<dyn Error>> {
    let spot = 180.0;
    let today = NaiveDate::from_ymd_opt(2025, 1, 2).ok_or("bad date")?;
    let now = today.and_hms_opt(10, 30, 0).ok_or("bad time")?;

    let mut provider = InMemoryProvider::new().with_spot("DEMO", spot);
    for days in [0_i64, 7, 14, 30, 60, 90, 180, 365] {
        let expiry = today + chrono::Duration::days(days);
        provider.insert_chain(
            "DEMO",
            &expiry.format("%Y-%m-%d").to_string(),
            synthetic_chain(spot, days.max(1)),
        );
    }

    let config = default_configs::standard();
    let request = SurfaceRequest::from_config("demo", OptionSide::Call, &config)?;
    let pipeline = SurfacePipeline::new(provider);
    let build = pipeline.build(&request, now)?;

    println!("{}", build.labels().title);
    println!(
        "Kept {} of {} observations (spot {:.2})",
        build.filters.after,
        build.filters.before,
        build.filters.spot.unwrap_or_default()
    );

    let grid = &build.grid;
    print!("{:>8} |", "days");
    for strike in grid.strike_axis().iter().step_by(2) {
        print!(" {:>6.0}", strike);
    }
    println!();
    for (maturity, row) in grid.maturity_axis().iter().zip(grid.iv()) {
        print!("{:>8} |", maturity);
        for iv in row.iter().step_by(2) {
            print!(" {:>5.1}%", iv * 100.0);
        }
        println!();
    }

    let mut svg = SvgRenderer::new("surface_demo.svg");
    build.emit(&mut svg)?;
    println!("Chart saved to surface_demo.svg");
    Ok(())
}
