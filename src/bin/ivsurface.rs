// src/bin/ivsurface.rs
//
// Command-line front end: reads an option chain snapshot, applies the chosen
// filters and writes the implied volatility surface as SVG (and optionally CSV).

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use clap::Parser;
use iv_surface::{
    default_config_template, local_now, CsvChainProvider, CsvGridWriter, EmitMode,
    MoneynessBounds, OptionSide, SurfaceConfig, SurfaceError, SurfacePipeline, SurfaceRequest,
    SvgRenderer,
};
use log::info;

const NO_TICKER_MESSAGE: &str = "Please enter a stock ticker to generate the volatility surface.";
const NO_DATA_MESSAGE: &str =
    "No data available. Please check the ticker or try a different option type.";

#[derive(Parser)]
#[command(name = "ivsurface")]
#[command(about = "Implied volatility surface generator for listed options")]
struct Args {
    /// Option chain snapshot (CSV: ticker,expiration,option_type,strike,implied_volatility[,underlying_price])
    #[arg(long, short)]
    data: Option<PathBuf>,

    /// Stock ticker, e.g. AAPL or TSLA (case-insensitive)
    #[arg(long, short, default_value = "")]
    ticker: String,

    /// Option side: call or put
    #[arg(long, default_value = "call")]
    side: OptionSide,

    /// Path to configuration file (TOML)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Lower moneyness bound as a fraction of spot (0.0 - 1.0)
    #[arg(long)]
    lower: Option<f64>,

    /// Upper moneyness bound as a fraction of spot (>= 1.0)
    #[arg(long)]
    upper: Option<f64>,

    /// Do not filter strikes by spot price
    #[arg(long)]
    no_moneyness: bool,

    /// Minimum days to expiry
    #[arg(long)]
    min_days: Option<u32>,

    /// Keep short-dated and expired contracts
    #[arg(long)]
    no_maturity_filter: bool,

    /// Output shape: surface (strike x maturity grid) or scatter (raw points)
    #[arg(long)]
    mode: Option<EmitMode>,

    /// SVG output path
    #[arg(long, short, default_value = "iv_surface.svg")]
    out: PathBuf,

    /// Also write the emitted grid or points as CSV
    #[arg(long)]
    grid_csv: Option<PathBuf>,

    /// Build as of this local time (YYYY-MM-DDTHH:MM:SS) instead of now
    #[arg(long)]
    now: Option<String>,

    /// Print a default configuration file and exit
    #[arg(long)]
    generate_config: bool,
}

fn load_config(args: &Args) -> Result<SurfaceConfig> {
    let mut config = match &args.config {
        Some(path) => SurfaceConfig::from_file(path)?,
        None => SurfaceConfig::standard(),
    };

    if let Some(lower) = args.lower {
        config.filters.lower_pct = lower;
    }
    if let Some(upper) = args.upper {
        config.filters.upper_pct = upper;
    }
    if args.no_moneyness {
        config.filters.moneyness_enabled = false;
    }
    if let Some(min_days) = args.min_days {
        config.filters.min_days = min_days;
    }
    if args.no_maturity_filter {
        config.filters.maturity_enabled = false;
    }
    if let Some(mode) = args.mode {
        config.output.mode = mode;
    }
    config.validate()?;
    Ok(config)
}

fn build_time(args: &Args) -> Result<NaiveDateTime> {
    match &args.now {
        Some(text) => NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S")
            .with_context(|| format!("invalid --now '{}'", text)),
        None => Ok(local_now()),
    }
}

fn run(args: &Args) -> Result<()> {
    let config = load_config(args)?;
    let request = SurfaceRequest::from_config(&args.ticker, args.side, &config)?;
    let now = build_time(args)?;

    let data = args
        .data
        .as_ref()
        .context("no option chain snapshot given, use --data <csv>")?;
    let provider = CsvChainProvider::from_path(data)?;
    info!(
        "loaded {} contracts from {}",
        provider.row_count(),
        data.display()
    );

    println!("Fetching data for {}...", request.ticker);
    let pipeline = SurfacePipeline::new(provider);
    let build = pipeline.build(&request, now)?;

    if build.filters.moneyness_skipped {
        println!("No spot price for {}; strike filter skipped.", request.ticker);
    }
    if let Some(bounds) = request.moneyness.filter(|_| build.filters.moneyness_applied) {
        let MoneynessBounds {
            lower_pct,
            upper_pct,
        } = bounds;
        println!(
            "Strikes limited to {:.0}%-{:.0}% of spot {:.2}",
            lower_pct * 100.0,
            upper_pct * 100.0,
            build.filters.spot.unwrap_or_default()
        );
    }

    let mut svg = SvgRenderer::new(&args.out)
        .with_size(config.output.width, config.output.height)
        .with_view(config.output.yaw, config.output.pitch);
    let emission = build.emit(&mut svg)?;
    println!(
        "{}: {} {} written to {}",
        emission.labels.title,
        emission.points,
        match emission.mode {
            EmitMode::Surface => "grid cells",
            EmitMode::Scatter => "points",
        },
        svg.path().display()
    );

    if let Some(path) = &args.grid_csv {
        let mut writer = CsvGridWriter::to_path(path)?;
        build.emit(&mut writer)?;
        println!("Grid data written to {}", path.display());
    }
    Ok(())
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if args.generate_config {
        println!("{}", default_config_template());
        return;
    }

    if args.ticker.trim().is_empty() {
        println!("{}", NO_TICKER_MESSAGE);
        return;
    }

    if let Err(err) = run(&args) {
        match err.downcast_ref::<SurfaceError>() {
            Some(e) if e.is_no_data() => {
                println!("{}", NO_DATA_MESSAGE);
            }
            Some(SurfaceError::InvalidInput { message }) => {
                eprintln!("Invalid input: {}", message);
                process::exit(2);
            }
            _ => {
                eprintln!("Error: {:#}", err);
                process::exit(1);
            }
        }
    }
}
