use log::debug;
use serde::{Deserialize, Serialize};

use crate::chain::ObservationSet;
use crate::error::{SurfaceError, SurfaceResult};

/// Value of a grid cell that no observation maps to.
pub const EMPTY_CELL: f64 = 0.0;

/// Implied volatility on a strike × maturity grid.
///
/// Both axes are strictly increasing. `iv[m][s]` is the mean implied
/// volatility of every observation with exactly `maturity_axis[m]` and
/// `strike_axis[s]`, or [`EMPTY_CELL`] when there is none. Sparse coverage is
/// normal for listed chains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GridParts")]
pub struct SurfaceGrid {
    strike_axis: Vec<f64>,
    maturity_axis: Vec<i64>,
    iv: Vec<Vec<f64>>,
    counts: Vec<Vec<usize>>,
}

/// Serialized shape of a [`SurfaceGrid`], checked before it becomes one.
#[derive(Deserialize)]
struct GridParts {
    strike_axis: Vec<f64>,
    maturity_axis: Vec<i64>,
    iv: Vec<Vec<f64>>,
    counts: Vec<Vec<usize>>,
}

impl TryFrom<GridParts> for SurfaceGrid {
    type Error = SurfaceError;

    fn try_from(parts: GridParts) -> SurfaceResult<Self> {
        if !parts
            .strike_axis
            .windows(2)
            .all(|w| w[0].total_cmp(&w[1]).is_lt())
        {
            return Err(SurfaceError::invalid_input(
                "strike axis must be strictly increasing",
            ));
        }
        if !parts.maturity_axis.windows(2).all(|w| w[0] < w[1]) {
            return Err(SurfaceError::invalid_input(
                "maturity axis must be strictly increasing",
            ));
        }

        let (n_mat, n_strike) = (parts.maturity_axis.len(), parts.strike_axis.len());
        let iv_fits = parts.iv.len() == n_mat && parts.iv.iter().all(|row| row.len() == n_strike);
        let counts_fit =
            parts.counts.len() == n_mat && parts.counts.iter().all(|row| row.len() == n_strike);
        if !iv_fits || !counts_fit {
            return Err(SurfaceError::invalid_input(format!(
                "grid rows do not match its {}x{} axes (maturities x strikes)",
                n_mat, n_strike
            )));
        }

        Ok(SurfaceGrid {
            strike_axis: parts.strike_axis,
            maturity_axis: parts.maturity_axis,
            iv: parts.iv,
            counts: parts.counts,
        })
    }
}

/// `-0.0` and `0.0` compare equal, so they share one axis entry.
fn strike_key(strike: f64) -> f64 {
    if strike == 0.0 {
        0.0
    } else {
        strike
    }
}

fn strike_index(axis: &[f64], strike: f64) -> Option<usize> {
    let key = strike_key(strike);
    axis.binary_search_by(|probe| probe.total_cmp(&key)).ok()
}

impl SurfaceGrid {
    pub fn strike_axis(&self) -> &[f64] {
        &self.strike_axis
    }

    pub fn maturity_axis(&self) -> &[i64] {
        &self.maturity_axis
    }

    /// Rows indexed by maturity, columns by strike.
    pub fn iv(&self) -> &[Vec<f64>] {
        &self.iv
    }

    /// `(maturities, strikes)`
    pub fn dimensions(&self) -> (usize, usize) {
        (self.maturity_axis.len(), self.strike_axis.len())
    }

    pub fn is_empty(&self) -> bool {
        self.strike_axis.is_empty() || self.maturity_axis.is_empty()
    }

    /// Cell value for an exact (strike, maturity) axis pair.
    ///
    /// `None` if either value is not on its axis; `Some(EMPTY_CELL)` for an axis
    /// pair without observations.
    pub fn iv_at(&self, strike: f64, maturity_days: i64) -> Option<f64> {
        let (m, s) = self.index_of(strike, maturity_days)?;
        Some(self.iv[m][s])
    }

    /// Number of observations averaged into cell `(maturity_index, strike_index)`.
    pub fn observations_at(&self, maturity_index: usize, strike_index: usize) -> usize {
        self.counts
            .get(maturity_index)
            .and_then(|row| row.get(strike_index))
            .copied()
            .unwrap_or(0)
    }

    /// Cells backed by at least one observation.
    pub fn populated_cells(&self) -> usize {
        self.counts
            .iter()
            .flat_map(|row| row.iter())
            .filter(|&&n| n > 0)
            .count()
    }

    /// Smallest and largest value over populated cells.
    pub fn iv_range(&self) -> Option<(f64, f64)> {
        let mut range: Option<(f64, f64)> = None;
        for (iv_row, count_row) in self.iv.iter().zip(&self.counts) {
            for (&v, &n) in iv_row.iter().zip(count_row) {
                if n == 0 {
                    continue;
                }
                range = Some(match range {
                    Some((lo, hi)) => (lo.min(v), hi.max(v)),
                    None => (v, v),
                });
            }
        }
        range
    }

    /// Consume the grid into `(strike_axis, maturity_axis, iv)`.
    pub fn into_parts(self) -> (Vec<f64>, Vec<i64>, Vec<Vec<f64>>) {
        (self.strike_axis, self.maturity_axis, self.iv)
    }

    fn index_of(&self, strike: f64, maturity_days: i64) -> Option<(usize, usize)> {
        let s = strike_index(&self.strike_axis, strike)?;
        let m = self.maturity_axis.binary_search(&maturity_days).ok()?;
        Some((m, s))
    }
}

/// Aggregate an observation set onto its own strike × maturity grid.
///
/// Strikes are grouped by exact equality; duplicates at one (strike, maturity)
/// pair are averaged. An empty set gives an empty grid.
pub fn aggregate(set: &ObservationSet) -> SurfaceGrid {
    let mut strike_axis: Vec<f64> = set.strikes().iter().map(|&k| strike_key(k)).collect();
    strike_axis.sort_by(|a, b| a.total_cmp(b));
    strike_axis.dedup_by(|a, b| a.total_cmp(b).is_eq());

    let mut maturity_axis = set.maturities().to_vec();
    maturity_axis.sort_unstable();
    maturity_axis.dedup();

    let n_mat = maturity_axis.len();
    let n_strike = strike_axis.len();
    let mut sums = vec![vec![0.0_f64; n_strike]; n_mat];
    let mut counts = vec![vec![0_usize; n_strike]; n_mat];

    for obs in set.iter() {
        let s = strike_index(&strike_axis, obs.strike);
        let m = maturity_axis.binary_search(&obs.maturity_days).ok();
        if let (Some(s), Some(m)) = (s, m) {
            sums[m][s] += obs.implied_vol;
            counts[m][s] += 1;
        }
    }

    let iv = sums
        .iter()
        .zip(&counts)
        .map(|(sum_row, count_row)| {
            sum_row
                .iter()
                .zip(count_row)
                .map(|(&sum, &n)| if n > 0 { sum / n as f64 } else { EMPTY_CELL })
                .collect()
        })
        .collect();

    let grid = SurfaceGrid {
        strike_axis,
        maturity_axis,
        iv,
        counts,
    };
    debug!(
        "{} {}: grid {}x{} (maturities x strikes), {} populated cells from {} observations",
        set.ticker(),
        set.side(),
        n_mat,
        n_strike,
        grid.populated_cells(),
        set.len()
    );
    grid
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{Observation, OptionSide};

    fn set_of(points: &[(f64, i64, f64)]) -> ObservationSet {
        ObservationSet::from_observations(
            "TEST",
            OptionSide::Call,
            points.iter().map(|&(k, m, v)| Observation::new(k, m, v)),
        )
    }

    #[test]
    fn test_duplicate_scenario() {
        let set = set_of(&[(100.0, 10, 0.2), (100.0, 10, 0.4), (110.0, 20, 0.3)]);
        let grid = aggregate(&set);

        assert_eq!(grid.strike_axis(), &[100.0, 110.0]);
        assert_eq!(grid.maturity_axis(), &[10, 20]);
        assert!((grid.iv()[0][0] - 0.3).abs() < 1e-12);
        assert_eq!(grid.iv()[0][1], 0.0);
        assert_eq!(grid.iv()[1][0], 0.0);
        assert!((grid.iv()[1][1] - 0.3).abs() < 1e-12);

        assert_eq!(grid.observations_at(0, 0), 2);
        assert_eq!(grid.observations_at(0, 1), 0);
        assert_eq!(grid.populated_cells(), 2);
    }

    #[test]
    fn test_duplicates_are_averaged_not_summed_or_overwritten() {
        let set = set_of(&[(50.0, 7, 0.1), (50.0, 7, 0.2), (50.0, 7, 0.6)]);
        let grid = aggregate(&set);
        let v = grid.iv_at(50.0, 7).unwrap();
        // sum would be 0.9, last-write 0.6
        assert!((v - 0.3).abs() < 1e-12, "expected mean 0.3, got {}", v);
    }

    #[test]
    fn test_axes_sorted_and_distinct_from_unsorted_input() {
        let set = set_of(&[(120.0, 30, 0.2), (80.0, 5, 0.4), (100.0, 30, 0.25), (80.0, 30, 0.35)]);
        let grid = aggregate(&set);
        assert_eq!(grid.strike_axis(), &[80.0, 100.0, 120.0]);
        assert_eq!(grid.maturity_axis(), &[5, 30]);
        assert_eq!(grid.dimensions(), (2, 3));
        assert_eq!(grid.iv_at(120.0, 5), Some(EMPTY_CELL));
        assert_eq!(grid.iv_at(80.0, 30), Some(0.35));
        assert_eq!(grid.iv_at(90.0, 30), None);
        assert_eq!(grid.iv_at(80.0, 6), None);
    }

    #[test]
    fn test_near_equal_strikes_are_not_merged() {
        let set = set_of(&[(100.0, 10, 0.2), (100.0 + 1e-9, 10, 0.4)]);
        let grid = aggregate(&set);
        assert_eq!(grid.strike_axis().len(), 2);
    }

    #[test]
    fn test_signed_zero_strikes_share_a_cell() {
        let set = set_of(&[(-0.0, 10, 0.2), (0.0, 10, 0.4)]);
        let grid = aggregate(&set);
        assert_eq!(grid.strike_axis().len(), 1);
        assert_eq!(grid.observations_at(0, 0), 2);
        assert!((grid.iv()[0][0] - 0.3).abs() < 1e-12);
        assert_eq!(grid.iv_at(-0.0, 10), grid.iv_at(0.0, 10));
    }

    #[test]
    fn test_deserialize_round_trip() {
        let grid = aggregate(&set_of(&[(100.0, 10, 0.2), (110.0, 20, 0.3)]));
        let text = toml::to_string(&grid).unwrap();
        let back: SurfaceGrid = toml::from_str(&text).unwrap();
        assert_eq!(back, grid);
    }

    #[test]
    fn test_deserialize_rejects_misshapen_grid() {
        // second iv row is short
        let short_row = r#"
strike_axis = [100.0, 110.0]
maturity_axis = [10, 20]
iv = [[0.2, 0.0], [0.3]]
counts = [[1, 0], [0, 1]]
"#;
        assert!(toml::from_str::<SurfaceGrid>(short_row).is_err());

        let unsorted = r#"
strike_axis = [110.0, 100.0]
maturity_axis = [10]
iv = [[0.2, 0.3]]
counts = [[1, 1]]
"#;
        assert!(toml::from_str::<SurfaceGrid>(unsorted).is_err());
    }

    #[test]
    fn test_empty_set_gives_empty_grid() {
        let grid = aggregate(&ObservationSet::empty("TEST", OptionSide::Put));
        assert!(grid.is_empty());
        assert!(grid.strike_axis().is_empty());
        assert!(grid.maturity_axis().is_empty());
        assert!(grid.iv().is_empty());
        assert_eq!(grid.iv_range(), None);
    }

    #[test]
    fn test_iv_range_ignores_sentinel_cells() {
        let set = set_of(&[(100.0, 10, 0.2), (110.0, 20, 0.5)]);
        let grid = aggregate(&set);
        assert_eq!(grid.iv_range(), Some((0.2, 0.5)));
    }
}
