use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{SurfaceError, SurfaceResult};

/// Option side selected for a surface build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionSide {
    Call,
    Put,
}

impl OptionSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            OptionSide::Call => "call",
            OptionSide::Put => "put",
        }
    }

    /// Capitalized form used in chart titles ("Call", "Put").
    pub fn title(&self) -> &'static str {
        match self {
            OptionSide::Call => "Call",
            OptionSide::Put => "Put",
        }
    }
}

impl fmt::Display for OptionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptionSide {
    type Err = SurfaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "call" | "c" => Ok(OptionSide::Call),
            "put" | "p" => Ok(OptionSide::Put),
            other => Err(SurfaceError::invalid_input(format!(
                "unknown option side '{}', expected 'call' or 'put'",
                other
            ))),
        }
    }
}

/// One (strike, maturity, implied volatility) point of a chain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Strike price (> 0)
    pub strike: f64,
    /// Whole days from the build time to expiration; zero or negative for
    /// contracts expiring today or already expired
    pub maturity_days: i64,
    /// Implied volatility as a decimal (0.25 = 25%)
    pub implied_vol: f64,
}

impl Observation {
    pub fn new(strike: f64, maturity_days: i64, implied_vol: f64) -> Self {
        Self {
            strike,
            maturity_days,
            implied_vol,
        }
    }
}

/// Ordered observations for one ticker and option side.
///
/// Stored as three parallel columns. Index `i` in `strikes()`, `maturities()`
/// and `ivs()` always refers to the same observation; the fields are private so
/// no caller can break that alignment. Deserialization goes through
/// [`ObservationSet::from_columns`] as well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ObservationColumns")]
pub struct ObservationSet {
    ticker: String,
    side: OptionSide,
    strikes: Vec<f64>,
    maturities: Vec<i64>,
    ivs: Vec<f64>,
}

/// Serialized shape of an [`ObservationSet`], checked before it becomes one.
#[derive(Deserialize)]
struct ObservationColumns {
    ticker: String,
    side: OptionSide,
    strikes: Vec<f64>,
    maturities: Vec<i64>,
    ivs: Vec<f64>,
}

impl TryFrom<ObservationColumns> for ObservationSet {
    type Error = SurfaceError;

    fn try_from(raw: ObservationColumns) -> SurfaceResult<Self> {
        ObservationSet::from_columns(raw.ticker, raw.side, raw.strikes, raw.maturities, raw.ivs)
    }
}

impl ObservationSet {
    /// Create an empty set for `ticker` (stored upper-cased) and `side`.
    pub fn empty(ticker: impl Into<String>, side: OptionSide) -> Self {
        Self {
            ticker: ticker.into().to_uppercase(),
            side,
            strikes: Vec::new(),
            maturities: Vec::new(),
            ivs: Vec::new(),
        }
    }

    /// Build a set from parallel columns, rejecting columns of unequal length.
    pub fn from_columns(
        ticker: impl Into<String>,
        side: OptionSide,
        strikes: Vec<f64>,
        maturities: Vec<i64>,
        ivs: Vec<f64>,
    ) -> SurfaceResult<Self> {
        if strikes.len() != maturities.len() || strikes.len() != ivs.len() {
            return Err(SurfaceError::invalid_input(format!(
                "parallel columns differ in length: strikes={}, maturities={}, ivs={}",
                strikes.len(),
                maturities.len(),
                ivs.len()
            )));
        }
        Ok(Self {
            ticker: ticker.into().to_uppercase(),
            side,
            strikes,
            maturities,
            ivs,
        })
    }

    /// Build a set from observations, preserving their order.
    pub fn from_observations(
        ticker: impl Into<String>,
        side: OptionSide,
        observations: impl IntoIterator<Item = Observation>,
    ) -> Self {
        let mut set = Self::empty(ticker, side);
        for obs in observations {
            set.push(obs);
        }
        set
    }

    pub(crate) fn push(&mut self, obs: Observation) {
        self.strikes.push(obs.strike);
        self.maturities.push(obs.maturity_days);
        self.ivs.push(obs.implied_vol);
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn side(&self) -> OptionSide {
        self.side
    }

    pub fn len(&self) -> usize {
        self.strikes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strikes.is_empty()
    }

    pub fn strikes(&self) -> &[f64] {
        &self.strikes
    }

    pub fn maturities(&self) -> &[i64] {
        &self.maturities
    }

    pub fn ivs(&self) -> &[f64] {
        &self.ivs
    }

    pub fn get(&self, index: usize) -> Option<Observation> {
        if index >= self.len() {
            return None;
        }
        Some(Observation::new(
            self.strikes[index],
            self.maturities[index],
            self.ivs[index],
        ))
    }

    pub fn iter(&self) -> impl Iterator<Item = Observation> + '_ {
        self.strikes
            .iter()
            .zip(&self.maturities)
            .zip(&self.ivs)
            .map(|((&strike, &maturity_days), &implied_vol)| Observation {
                strike,
                maturity_days,
                implied_vol,
            })
    }

    /// Keep the observations for which `keep` is true, as a new set.
    ///
    /// Relative order is preserved and `self` is left untouched.
    pub fn select<F>(&self, keep: F) -> ObservationSet
    where
        F: Fn(&Observation) -> bool,
    {
        let mut out = ObservationSet::empty(self.ticker.clone(), self.side);
        for obs in self.iter().filter(|obs| keep(obs)) {
            out.push(obs);
        }
        out
    }
}
