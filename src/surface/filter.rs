use log::debug;
use serde::{Deserialize, Serialize};

use crate::chain::ObservationSet;
use crate::error::{SurfaceError, SurfaceResult};

/// Default lower moneyness bound (fraction of spot)
pub const DEFAULT_LOWER_PCT: f64 = 0.5;
/// Default upper moneyness bound (fraction of spot)
pub const DEFAULT_UPPER_PCT: f64 = 1.5;
/// Default minimum days to expiry; drops same-day and expired contracts
pub const DEFAULT_MIN_DAYS: u32 = 1;

/// Strike band around spot, as fractions of spot.
///
/// `lower_pct` lies in `[0, 1]`, `upper_pct` is at least `1` and may be
/// infinite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoneynessBounds {
    pub lower_pct: f64,
    pub upper_pct: f64,
}

impl MoneynessBounds {
    pub fn new(lower_pct: f64, upper_pct: f64) -> SurfaceResult<Self> {
        let bounds = Self {
            lower_pct,
            upper_pct,
        };
        bounds.validate()?;
        Ok(bounds)
    }

    /// Bounds that keep every strike.
    pub fn unbounded() -> Self {
        Self {
            lower_pct: 0.0,
            upper_pct: f64::INFINITY,
        }
    }

    pub fn validate(&self) -> SurfaceResult<()> {
        if self.lower_pct.is_nan() || self.upper_pct.is_nan() {
            return Err(SurfaceError::invalid_input("moneyness bounds must be numbers"));
        }
        if self.lower_pct > self.upper_pct {
            return Err(SurfaceError::invalid_input(format!(
                "lower moneyness bound {} exceeds upper bound {}",
                self.lower_pct, self.upper_pct
            )));
        }
        if !(0.0..=1.0).contains(&self.lower_pct) {
            return Err(SurfaceError::invalid_input(format!(
                "lower moneyness bound must be in [0, 1], got {}",
                self.lower_pct
            )));
        }
        if self.upper_pct < 1.0 {
            return Err(SurfaceError::invalid_input(format!(
                "upper moneyness bound must be >= 1, got {}",
                self.upper_pct
            )));
        }
        Ok(())
    }

    /// Absolute strike interval `[spot * lower_pct, spot * upper_pct]`.
    pub fn strike_range(&self, spot: f64) -> (f64, f64) {
        (spot * self.lower_pct, spot * self.upper_pct)
    }
}

impl Default for MoneynessBounds {
    fn default() -> Self {
        Self {
            lower_pct: DEFAULT_LOWER_PCT,
            upper_pct: DEFAULT_UPPER_PCT,
        }
    }
}

fn check_spot(spot: f64) -> SurfaceResult<()> {
    if !spot.is_finite() || spot <= 0.0 {
        return Err(SurfaceError::invalid_input(format!(
            "spot price must be positive and finite, got {}",
            spot
        )));
    }
    Ok(())
}

/// Keep observations whose strike lies in `[spot * lower_pct, spot * upper_pct]`.
pub fn filter_by_moneyness(
    set: &ObservationSet,
    spot: f64,
    lower_pct: f64,
    upper_pct: f64,
) -> SurfaceResult<ObservationSet> {
    let bounds = MoneynessBounds::new(lower_pct, upper_pct)?;
    filter_by_moneyness_bounds(set, spot, &bounds)
}

/// [`filter_by_moneyness`] over already validated bounds.
pub fn filter_by_moneyness_bounds(
    set: &ObservationSet,
    spot: f64,
    bounds: &MoneynessBounds,
) -> SurfaceResult<ObservationSet> {
    check_spot(spot)?;
    bounds.validate()?;
    let (lo, hi) = bounds.strike_range(spot);
    let kept = set.select(|obs| obs.strike >= lo && obs.strike <= hi);
    debug!(
        "moneyness filter [{:.4}, {:.4}] around spot {:.4}: kept {} of {}",
        lo,
        hi,
        spot,
        kept.len(),
        set.len()
    );
    Ok(kept)
}

/// Keep observations with at least `min_days` days to expiry.
pub fn exclude_short_maturity(set: &ObservationSet, min_days: u32) -> ObservationSet {
    let min_days = i64::from(min_days);
    let kept = set.select(|obs| obs.maturity_days >= min_days);
    debug!(
        "maturity filter >= {}d: kept {} of {}",
        min_days,
        kept.len(),
        set.len()
    );
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{Observation, OptionSide};

    fn strikes_only(strikes: &[f64]) -> ObservationSet {
        ObservationSet::from_observations(
            "TEST",
            OptionSide::Call,
            strikes.iter().map(|&k| Observation::new(k, 30, 0.2)),
        )
    }

    fn maturities_only(maturities: &[i64]) -> ObservationSet {
        ObservationSet::from_observations(
            "TEST",
            OptionSide::Call,
            maturities.iter().map(|&m| Observation::new(100.0, m, 0.2)),
        )
    }

    #[test]
    fn test_moneyness_band_scenario() {
        let set = strikes_only(&[50.0, 95.0, 100.0, 105.0, 200.0]);
        let kept = filter_by_moneyness(&set, 100.0, 0.9, 1.1).unwrap();
        assert_eq!(kept.strikes(), &[95.0, 100.0, 105.0]);
    }

    #[test]
    fn test_moneyness_band_is_inclusive() {
        let set = strikes_only(&[50.0, 150.0, 49.99, 150.01]);
        let kept = filter_by_moneyness(&set, 100.0, 0.5, 1.5).unwrap();
        assert_eq!(kept.strikes(), &[50.0, 150.0]);
    }

    #[test]
    fn test_short_maturity_scenario() {
        let set = maturities_only(&[-3, 0, 4, 5, 30]);
        let kept = exclude_short_maturity(&set, 5);
        assert_eq!(kept.maturities(), &[5, 30]);
    }

    #[test]
    fn test_default_min_days_drops_same_day_and_expired() {
        let set = maturities_only(&[-1, 0, 1, 2]);
        let kept = exclude_short_maturity(&set, DEFAULT_MIN_DAYS);
        assert_eq!(kept.maturities(), &[1, 2]);
    }

    #[test]
    fn test_invalid_bounds_rejected() {
        let set = strikes_only(&[100.0]);
        assert!(filter_by_moneyness(&set, 100.0, 1.2, 1.1).is_err());
        assert!(filter_by_moneyness(&set, 100.0, -0.1, 1.1).is_err());
        assert!(filter_by_moneyness(&set, 100.0, 0.5, 0.9).is_err());
        assert!(filter_by_moneyness(&set, 100.0, f64::NAN, 1.1).is_err());
    }

    #[test]
    fn test_invalid_spot_rejected() {
        let set = strikes_only(&[100.0]);
        for spot in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let result = filter_by_moneyness(&set, spot, 0.5, 1.5);
            assert!(
                matches!(result, Err(SurfaceError::InvalidInput { .. })),
                "spot {} should be rejected",
                spot
            );
        }
    }

    #[test]
    fn test_unbounded_keeps_everything() {
        let set = strikes_only(&[0.01, 100.0, 1e9]);
        let bounds = MoneynessBounds::unbounded();
        let kept = filter_by_moneyness_bounds(&set, 100.0, &bounds).unwrap();
        assert_eq!(kept, set);
    }
}
