
use iv_surface::*;
use test_utils::{
    load_snapshot, snapshot_now, CountingProvider, RecordingSink, UnreachableProvider,
};

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-12,
        "expected {}, got {}",
        expected,
        actual
    );
}

#[test]
fn test_snapshot_loads() {
    let provider = load_snapshot();
    assert_eq!(provider.row_count(), 19);
    assert_eq!(provider.spot_price("aapl").unwrap(), Some(100.0));
    assert_eq!(provider.spot_price("MSFT").unwrap(), None);
    assert_eq!(
        provider.list_expirations("AAPL").unwrap(),
        vec!["2025-01-02", "2025-01-03", "2025-01-10", "2025-02-21", "2025-03-21"]
    );
}

#[test]
fn test_normalized_maturities_follow_calendar_days() {
    let provider = load_snapshot();
    let set = normalize_chain(&provider, "AAPL", OptionSide::Call, snapshot_now()).unwrap();

    assert_eq!(set.len(), 14);
    let mut maturities = set.maturities().to_vec();
    maturities.dedup();
    // expiring today at midnight is already in the past at 09:30
    assert_eq!(maturities, vec![-1, 0, 7, 49, 77]);
}

#[test]
fn test_standard_build_on_snapshot() {
    let provider = load_snapshot();
    let build = build_with_config(
        &provider,
        "aapl",
        OptionSide::Call,
        &default_configs::standard(),
        snapshot_now(),
    )
    .unwrap();

    let report = build.filters;
    assert_eq!(report.spot, Some(100.0));
    assert!(report.moneyness_applied && report.maturity_applied);
    assert!(!report.moneyness_skipped);
    assert_eq!((report.before, report.after), (14, 10));

    let grid = &build.grid;
    assert_eq!(grid.strike_axis(), &[90.0, 100.0, 110.0, 120.0]);
    assert_eq!(grid.maturity_axis(), &[7, 49, 77]);
    assert_eq!(grid.populated_cells(), 9);

    let expected = [
        [0.30, 0.25, 0.28, 0.0],
        [0.27, 0.22, 0.26, 0.0],
        [0.26, 0.23, 0.0, 0.25],
    ];
    for (row, expected_row) in grid.iv().iter().zip(expected.iter()) {
        for (&cell, &want) in row.iter().zip(expected_row.iter()) {
            assert_close(cell, want);
        }
    }
    assert_eq!(grid.observations_at(1, 1), 2);
}

#[test]
fn test_unfiltered_build_keeps_everything() {
    let provider = load_snapshot();
    let build = build_with_config(
        &provider,
        "AAPL",
        OptionSide::Call,
        &default_configs::unfiltered(),
        snapshot_now(),
    )
    .unwrap();

    assert_eq!(build.observations.len(), 14);
    assert_eq!(
        build.grid.strike_axis(),
        &[40.0, 90.0, 100.0, 110.0, 120.0, 250.0]
    );
    assert_eq!(build.grid.maturity_axis(), &[-1, 0, 7, 49, 77]);
    assert!(!build.filters.moneyness_applied && !build.filters.maturity_applied);
}

#[test]
fn test_put_side_only_sees_puts() {
    let provider = load_snapshot();
    let request = SurfaceRequest::new("AAPL", OptionSide::Put).unwrap();
    let build = build_surface(&provider, &request, snapshot_now()).unwrap();

    assert_eq!(build.grid.strike_axis(), &[90.0, 100.0]);
    assert_eq!(build.grid.maturity_axis(), &[7, 49]);
    assert_close(build.grid.iv()[1][0], 0.31);
    assert_eq!(build.grid.iv()[1][1], EMPTY_CELL);
}

/// No spot for MSFT: the strike band is skipped, the maturity filter still runs.
#[test]
fn test_missing_spot_skips_strike_band() {
    let provider = load_snapshot();
    let request = SurfaceRequest::new("MSFT", OptionSide::Put)
        .unwrap()
        .with_moneyness(0.9, 1.1)
        .unwrap()
        .with_min_days(1);
    let build = build_surface(&provider, &request, snapshot_now()).unwrap();

    assert!(build.filters.moneyness_skipped);
    assert!(!build.filters.moneyness_applied);
    assert!(build.filters.maturity_applied);
    assert_eq!(build.filters.spot, None);
    assert_eq!(build.observations.strikes(), &[400.0, 420.0]);
}

#[test]
fn test_empty_side_is_no_data_at_fetch() {
    let provider = load_snapshot();
    let request = SurfaceRequest::new("MSFT", OptionSide::Call).unwrap();
    let err = build_surface(&provider, &request, snapshot_now()).unwrap_err();
    assert!(matches!(
        err,
        SurfaceError::NoData {
            stage: DataStage::Fetch,
            side: OptionSide::Call,
            ..
        }
    ));
}

#[test]
fn test_unknown_ticker_is_no_data() {
    let provider = load_snapshot();
    let mut sink = RecordingSink::default();
    let request = SurfaceRequest::new("ZZZZ", OptionSide::Call).unwrap();

    let err = SurfacePipeline::new(&provider)
        .run(&request, snapshot_now(), &mut sink)
        .unwrap_err();

    assert!(err.is_no_data());
    assert!(err.is_recoverable());
    assert_eq!(sink.calls(), 0);
}

#[test]
fn test_everything_filtered_is_no_data_at_filter() {
    let provider = load_snapshot();
    let request = SurfaceRequest::new("AAPL", OptionSide::Call)
        .unwrap()
        .with_min_days(100);
    let err = build_surface(&provider, &request, snapshot_now()).unwrap_err();
    assert!(matches!(
        err,
        SurfaceError::NoData {
            stage: DataStage::Filter,
            ..
        }
    ));
}

#[test]
fn test_blank_ticker_never_reaches_provider() {
    let provider = CountingProvider::new(load_snapshot());
    let mut request = SurfaceRequest::new("AAPL", OptionSide::Call).unwrap();
    request.ticker = "   ".to_string();

    let err = build_surface(&provider, &request, snapshot_now()).unwrap_err();
    assert!(matches!(err, SurfaceError::InvalidInput { .. }));
    assert_eq!(provider.calls.get(), 0);
}

#[test]
fn test_inverted_bounds_never_reach_provider() {
    let provider = CountingProvider::new(load_snapshot());
    let mut request = SurfaceRequest::new("AAPL", OptionSide::Call).unwrap();
    request.moneyness = Some(MoneynessBounds {
        lower_pct: 1.5,
        upper_pct: 0.5,
    });

    let err = build_surface(&provider, &request, snapshot_now()).unwrap_err();
    assert!(matches!(err, SurfaceError::InvalidInput { .. }));
    assert_eq!(provider.calls.get(), 0);
}

#[test]
fn test_spot_only_fetched_when_band_requested() {
    let provider = CountingProvider::new(load_snapshot());
    let request = SurfaceRequest::new("AAPL", OptionSide::Call).unwrap();
    build_surface(&provider, &request, snapshot_now()).unwrap();
    // one listing plus one chain per expiration
    assert_eq!(provider.calls.get(), 6);
}

#[test]
fn test_provider_failure_propagates() {
    let mut sink = RecordingSink::default();
    let request = SurfaceRequest::new("AAPL", OptionSide::Call).unwrap();

    let err = SurfacePipeline::new(UnreachableProvider)
        .run(&request, snapshot_now(), &mut sink)
        .unwrap_err();

    assert!(matches!(err, SurfaceError::Provider { .. }));
    assert!(!err.is_recoverable());
    assert_eq!(sink.calls(), 0);
}

#[test]
fn test_run_emits_surface_with_title() {
    let provider = load_snapshot();
    let request =
        SurfaceRequest::from_config("aapl", OptionSide::Call, &default_configs::standard())
            .unwrap();
    let mut sink = RecordingSink::default();

    let emission = SurfacePipeline::new(provider)
        .run(&request, snapshot_now(), &mut sink)
        .unwrap();

    assert_eq!(emission.mode, EmitMode::Surface);
    assert_eq!(sink.surfaces.len(), 1);
    assert!(sink.scatters.is_empty());
    assert_eq!(
        sink.titles,
        vec!["Volatility Surface for AAPL Call Options".to_string()]
    );
}

#[test]
fn test_scatter_mode_forwards_filtered_points() {
    let provider = load_snapshot();
    let request = SurfaceRequest::new("AAPL", OptionSide::Call)
        .unwrap()
        .with_moneyness(0.5, 1.5)
        .unwrap()
        .with_min_days(1)
        .with_mode(EmitMode::Scatter);
    let mut sink = RecordingSink::default();

    let emission = SurfacePipeline::new(&provider)
        .run(&request, snapshot_now(), &mut sink)
        .unwrap();

    assert_eq!(emission.mode, EmitMode::Scatter);
    assert_eq!(emission.points, 10);
    let (strikes, maturities, _) = &sink.scatters[0];
    assert_eq!(strikes.len(), 10);
    assert!(maturities.iter().all(|&m| m >= 1));
    assert!(strikes.iter().all(|&k| (50.0..=150.0).contains(&k)));
}

#[test]
fn test_grid_written_as_csv() {
    let provider = load_snapshot();
    let request = SurfaceRequest::new("AAPL", OptionSide::Put).unwrap();
    let build = build_surface(&provider, &request, snapshot_now()).unwrap();

    let mut writer = CsvGridWriter::new(Vec::new());
    build.emit(&mut writer).unwrap();
    let out = String::from_utf8(writer.into_inner().unwrap()).unwrap();

    assert_eq!(out, "maturity_days,90,100\n7,0.33,0.29\n49,0.31,0\n");
}

#[test]
fn test_config_round_trip_drives_build() {
    let text = SurfaceConfig::near_the_money().to_toml_string().unwrap();
    let config = SurfaceConfig::from_toml_str(&text).unwrap();
    let provider = load_snapshot();

    let build =
        build_with_config(&provider, "AAPL", OptionSide::Call, &config, snapshot_now()).unwrap();
    // 90%-110% of 100 and at least a week out
    assert_eq!(build.grid.strike_axis(), &[90.0, 100.0, 110.0]);
    assert_eq!(build.grid.maturity_axis(), &[7, 49, 77]);
}
