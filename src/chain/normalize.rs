use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use log::{debug, trace};

use super::types::{Observation, ObservationSet, OptionSide};
use crate::error::{SurfaceError, SurfaceResult};
use crate::provider::{OptionDataProvider, RawContract};

/// Date format used by providers for expirations.
pub const EXPIRATION_FORMAT: &str = "%Y-%m-%d";

/// Whole days from `now` until midnight at the start of `expiration`, floored.
///
/// With `now` past midnight, a contract expiring today gives `-1` and one
/// expiring tomorrow gives `0`.
pub fn maturity_days(expiration: NaiveDate, now: NaiveDateTime) -> i64 {
    let days = expiration.signed_duration_since(now.date()).num_days();
    if now.time() > NaiveTime::default() {
        days - 1
    } else {
        days
    }
}

/// Parse an ISO `YYYY-MM-DD` expiration string.
pub fn parse_expiration(expiration: &str) -> SurfaceResult<NaiveDate> {
    NaiveDate::parse_from_str(expiration.trim(), EXPIRATION_FORMAT).map_err(|e| {
        SurfaceError::provider(format!("malformed expiration date '{}': {}", expiration, e))
    })
}

fn check_contract(contract: &RawContract, expiration: &str) -> SurfaceResult<()> {
    if !contract.strike.is_finite() || contract.strike <= 0.0 {
        return Err(SurfaceError::provider(format!(
            "malformed contract expiring {}: strike must be positive, got {}",
            expiration, contract.strike
        )));
    }
    if !contract.implied_volatility.is_finite() || contract.implied_volatility < 0.0 {
        return Err(SurfaceError::provider(format!(
            "malformed contract expiring {} at strike {}: implied volatility must be non-negative, got {}",
            expiration, contract.strike, contract.implied_volatility
        )));
    }
    Ok(())
}

/// Collect every contract on `side` across all listed expirations.
///
/// Maturities that are zero or negative are kept; removing them is the job of
/// [`crate::surface::exclude_short_maturity`]. A provider with no expirations,
/// or no contracts on `side`, yields an empty set.
pub fn normalize_chain<P>(
    provider: &P,
    ticker: &str,
    side: OptionSide,
    now: NaiveDateTime,
) -> SurfaceResult<ObservationSet>
where
    P: OptionDataProvider + ?Sized,
{
    let mut set = ObservationSet::empty(ticker, side);
    let expirations = provider.list_expirations(set.ticker())?;
    debug!(
        "{}: provider lists {} expirations",
        set.ticker(),
        expirations.len()
    );

    for expiration in &expirations {
        let expiry_date = parse_expiration(expiration)?;
        let maturity = maturity_days(expiry_date, now);
        let chain = provider.option_chain(set.ticker(), expiration)?;
        let contracts = chain.side(side);
        trace!(
            "{} {} {}: {} contracts, maturity {}d",
            set.ticker(),
            expiration,
            side,
            contracts.len(),
            maturity
        );

        for contract in contracts {
            check_contract(contract, expiration)?;
            set.push(Observation::new(
                contract.strike,
                maturity,
                contract.implied_volatility,
            ));
        }
    }

    debug!(
        "{} {}: normalized {} observations",
        set.ticker(),
        side,
        set.len()
    );
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{InMemoryProvider, RawOptionChain};

    fn at(date: &str, time: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(&format!("{} {}", date, time), "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn day(date: &str) -> NaiveDate {
        NaiveDate::parse_from_str(date, EXPIRATION_FORMAT).unwrap()
    }

    #[test]
    fn test_maturity_days_floors_partial_days() {
        let now = at("2024-01-01", "12:00:00");
        assert_eq!(maturity_days(day("2024-01-01"), now), -1);
        assert_eq!(maturity_days(day("2024-01-02"), now), 0);
        assert_eq!(maturity_days(day("2024-01-11"), now), 9);
        assert_eq!(maturity_days(day("2023-12-30"), now), -3);
    }

    #[test]
    fn test_maturity_days_at_midnight_is_exact() {
        let now = at("2024-01-01", "00:00:00");
        assert_eq!(maturity_days(day("2024-01-01"), now), 0);
        assert_eq!(maturity_days(day("2024-01-11"), now), 10);
    }

    #[test]
    fn test_normalize_pairs_contracts_with_maturity() {
        let provider = InMemoryProvider::new()
            .with_chain(
                "AAPL",
                "2024-01-11",
                RawOptionChain {
                    calls: vec![RawContract::new(100.0, 0.2), RawContract::new(110.0, 0.25)],
                    puts: vec![RawContract::new(90.0, 0.35)],
                },
            )
            .with_chain(
                "AAPL",
                "2024-01-21",
                RawOptionChain {
                    calls: vec![RawContract::new(100.0, 0.22)],
                    puts: vec![],
                },
            );
        let now = at("2024-01-01", "00:00:00");

        let calls = normalize_chain(&provider, "aapl", OptionSide::Call, now).unwrap();
        assert_eq!(calls.ticker(), "AAPL");
        assert_eq!(calls.strikes(), &[100.0, 110.0, 100.0]);
        assert_eq!(calls.maturities(), &[10, 10, 20]);
        assert_eq!(calls.ivs(), &[0.2, 0.25, 0.22]);

        let puts = normalize_chain(&provider, "AAPL", OptionSide::Put, now).unwrap();
        assert_eq!(puts.len(), 1);
        assert_eq!(puts.get(0), Some(Observation::new(90.0, 10, 0.35)));
    }

    #[test]
    fn test_expired_contracts_are_kept() {
        let provider = InMemoryProvider::new().with_chain(
            "SPY",
            "2023-12-29",
            RawOptionChain {
                calls: vec![RawContract::new(470.0, 0.1)],
                puts: vec![],
            },
        );
        let set = normalize_chain(&provider, "SPY", OptionSide::Call, at("2024-01-01", "09:30:00"))
            .unwrap();
        assert_eq!(set.maturities(), &[-4]);
    }

    #[test]
    fn test_no_expirations_gives_empty_set() {
        let provider = InMemoryProvider::new();
        let set = normalize_chain(&provider, "ZZZZ", OptionSide::Put, at("2024-01-01", "00:00:00"))
            .unwrap();
        assert!(set.is_empty());
        assert_eq!(set.side(), OptionSide::Put);
    }

    #[test]
    fn test_malformed_records_are_provider_errors() {
        let now = at("2024-01-01", "00:00:00");

        let bad_date = InMemoryProvider::new().with_chain("X", "01/17/2024", RawOptionChain::default());
        assert!(matches!(
            normalize_chain(&bad_date, "X", OptionSide::Call, now),
            Err(SurfaceError::Provider { .. })
        ));

        let bad_iv = InMemoryProvider::new().with_chain(
            "X",
            "2024-01-17",
            RawOptionChain {
                calls: vec![RawContract::new(100.0, f64::NAN)],
                puts: vec![],
            },
        );
        assert!(matches!(
            normalize_chain(&bad_iv, "X", OptionSide::Call, now),
            Err(SurfaceError::Provider { .. })
        ));

        let bad_strike = InMemoryProvider::new().with_chain(
            "X",
            "2024-01-17",
            RawOptionChain {
                calls: vec![],
                puts: vec![RawContract::new(0.0, 0.3)],
            },
        );
        assert!(matches!(
            normalize_chain(&bad_strike, "X", OptionSide::Put, now),
            Err(SurfaceError::Provider { .. })
        ));
    }
}
