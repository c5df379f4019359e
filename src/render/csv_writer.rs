use std::fs::File;
use std::io::Write;
use std::path::Path;

use csv::{Writer, WriterBuilder};

use super::{SurfaceLabels, SurfaceSink};
use crate::error::{SurfaceError, SurfaceResult};

fn csv_err(err: impl std::fmt::Display) -> SurfaceError {
    SurfaceError::render(format!("CSV write failed: {}", err))
}

/// Writes the emitted surface as CSV.
///
/// Surface mode writes a matrix: the header holds `maturity_days` followed by
/// every strike, and each row is one maturity. Scatter mode writes one
/// `strike,maturity_days,implied_vol` row per observation.
pub struct CsvGridWriter<W: Write> {
    writer: Writer<W>,
}

impl CsvGridWriter<File> {
    pub fn to_path(path: impl AsRef<Path>) -> SurfaceResult<Self> {
        let path = path.as_ref();
        let writer = WriterBuilder::new()
            .flexible(false)
            .from_path(path)
            .map_err(|e| SurfaceError::render(format!("cannot create {}: {}", path.display(), e)))?;
        Ok(Self { writer })
    }
}

impl<W: Write> CsvGridWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            writer: WriterBuilder::new().from_writer(inner),
        }
    }

    /// Flush and return the underlying writer.
    pub fn into_inner(self) -> SurfaceResult<W> {
        self.writer.into_inner().map_err(|e| csv_err(e.error()))
    }
}

impl<W: Write> SurfaceSink for CsvGridWriter<W> {
    fn render_surface(
        &mut self,
        strike_axis: &[f64],
        maturity_axis: &[i64],
        iv: &[Vec<f64>],
        _labels: &SurfaceLabels,
    ) -> SurfaceResult<()> {
        let header = std::iter::once("maturity_days".to_string())
            .chain(strike_axis.iter().map(|k| k.to_string()));
        self.writer.write_record(header).map_err(csv_err)?;

        for (maturity, row) in maturity_axis.iter().zip(iv) {
            let record = std::iter::once(maturity.to_string())
                .chain(row.iter().map(|v| v.to_string()));
            self.writer.write_record(record).map_err(csv_err)?;
        }
        self.writer.flush().map_err(csv_err)
    }

    fn render_scatter(
        &mut self,
        strikes: &[f64],
        maturities: &[i64],
        ivs: &[f64],
        _labels: &SurfaceLabels,
    ) -> SurfaceResult<()> {
        self.writer
            .write_record(["strike", "maturity_days", "implied_vol"])
            .map_err(csv_err)?;
        for ((strike, maturity), iv) in strikes.iter().zip(maturities).zip(ivs) {
            self.writer
                .write_record([strike.to_string(), maturity.to_string(), iv.to_string()])
                .map_err(csv_err)?;
        }
        self.writer.flush().map_err(csv_err)
    }
}
