use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;
use log::debug;
use serde::Deserialize;

use super::{InMemoryProvider, OptionDataProvider, RawContract, RawOptionChain};
use crate::chain::OptionSide;
use crate::error::{SurfaceError, SurfaceResult};

/// CSV row structure of an option chain snapshot.
///
/// `underlying_price` is optional; when present, the first value seen for a
/// ticker becomes its spot price.
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "ticker")]
    ticker: String,
    #[serde(rename = "expiration")]
    expiration: String,
    #[serde(rename = "option_type")]
    option_type: String,
    #[serde(rename = "strike")]
    strike: f64,
    #[serde(rename = "implied_volatility")]
    implied_volatility: f64,
    #[serde(rename = "underlying_price", default)]
    underlying_price: Option<f64>,
}

/// Provider reading a whole chain snapshot from CSV.
///
/// Expected header:
/// `ticker,expiration,option_type,strike,implied_volatility[,underlying_price]`
#[derive(Debug, Clone)]
pub struct CsvChainProvider {
    inner: InMemoryProvider,
    rows: usize,
}

impl CsvChainProvider {
    pub fn from_path(path: impl AsRef<Path>) -> SurfaceResult<Self> {
        let path = path.as_ref();
        let rdr = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| {
                SurfaceError::provider(format!("cannot open {}: {}", path.display(), e))
            })?;
        Self::from_csv_reader(rdr)
    }

    pub fn from_reader<R: Read>(reader: R) -> SurfaceResult<Self> {
        let rdr = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        Self::from_csv_reader(rdr)
    }

    fn from_csv_reader<R: Read>(mut rdr: csv::Reader<R>) -> SurfaceResult<Self> {
        let mut inner = InMemoryProvider::new();
        let mut rows = 0;

        for (idx, result) in rdr.deserialize::<CsvRow>().enumerate() {
            // header is line 1
            let line = idx + 2;
            let row = result
                .map_err(|e| SurfaceError::provider(format!("malformed row {}: {}", line, e)))?;

            let side: OptionSide = row.option_type.parse().map_err(|_| {
                SurfaceError::provider(format!(
                    "malformed row {}: unknown option_type '{}'",
                    line, row.option_type
                ))
            })?;

            inner.push_contract(
                &row.ticker,
                &row.expiration,
                side,
                RawContract::new(row.strike, row.implied_volatility),
            );

            if let Some(spot) = row.underlying_price {
                if inner.spot_price(&row.ticker)?.is_none() {
                    inner.set_spot(&row.ticker, spot);
                }
            }
            rows += 1;
        }

        debug!("loaded {} option rows from CSV snapshot", rows);
        Ok(Self { inner, rows })
    }

    /// Number of contract rows read from the snapshot.
    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn tickers(&self) -> impl Iterator<Item = &str> {
        self.inner.tickers()
    }
}

impl OptionDataProvider for CsvChainProvider {
    fn list_expirations(&self, ticker: &str) -> SurfaceResult<Vec<String>> {
        self.inner.list_expirations(ticker)
    }

    fn option_chain(&self, ticker: &str, expiration: &str) -> SurfaceResult<RawOptionChain> {
        self.inner.option_chain(ticker, expiration)
    }

    fn spot_price(&self, ticker: &str) -> SurfaceResult<Option<f64>> {
        self.inner.spot_price(ticker)
    }
}
