use chrono::{Duration, NaiveDate, NaiveDateTime};
use greeks_core::options::lattice::{
    evaluate_rolling, CrrParameters, Lattice, FULL_TABLE_MAX_STEPS,
};
use greeks_core::{
    AnalyticOption, GreeksError, LatticeOption, OptionContract, OptionPricer, OptionStyle,
    OptionType, Settlement, Underlying,
};

fn t0() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

fn one_year() -> Duration {
    Duration::days(365) + Duration::hours(6)
}

fn contract<'u>(
    underlying: &'u Underlying,
    style: OptionStyle,
    option_type: OptionType,
) -> OptionContract<'u> {
    OptionContract::new(100.0, style, option_type, underlying, t0() + one_year(), 0.2).unwrap()
}

// ===========================================================================
// Tree shape
// ===========================================================================

#[test]
fn test_layer_sizes() {
    let params = CrrParameters::new(0.05, 0.0, 0.2).unwrap();
    let lattice = Lattice::build(100.0, &params, 365);
    assert_eq!(lattice.layers().len(), 366);
    assert_eq!(lattice.layers()[0], vec![100.0]);
    assert!(lattice
        .layers()
        .iter()
        .enumerate()
        .all(|(i, layer)| layer.len() == i + 1));
}

#[test]
fn test_recombines() {
    let params = CrrParameters::new(0.05, 0.0, 0.2).unwrap();
    let lattice = Lattice::build(100.0, &params, 4);
    // up then down returns to spot
    let middle = lattice.layers()[2][1];
    assert!((middle - 100.0).abs() < 1e-10, "middle node {middle}");
}

// ===========================================================================
// Convergence to closed form
// ===========================================================================

#[test]
fn test_zero_rate_call_converges() {
    let underlying = Underlying::new("BTC", Settlement::Spot, 100.0, t0(), 0.0, 0.0).unwrap();
    let mut tree = LatticeOption::new(contract(&underlying, OptionStyle::European, OptionType::Call))
        .unwrap();
    let value = tree.calculate_value().unwrap();
    assert!(
        (value - 7.9656).abs() < 0.05,
        "Expected ~7.9656, got {value}"
    );
    assert_eq!(tree.time_steps().unwrap(), 365);
}

#[test]
fn test_american_call_without_dividend_matches_european() {
    let underlying = Underlying::new("BTC", Settlement::Spot, 100.0, t0(), 0.05, 0.0).unwrap();
    let mut tree = LatticeOption::new(contract(&underlying, OptionStyle::American, OptionType::Call))
        .unwrap();
    let mut closed =
        AnalyticOption::new(contract(&underlying, OptionStyle::European, OptionType::Call)).unwrap();
    let lattice_value = tree.calculate_value().unwrap();
    let analytic_value = closed.calculate_value().unwrap();
    assert!(
        (lattice_value - analytic_value).abs() < 0.01,
        "lattice {lattice_value} vs analytic {analytic_value}"
    );
}

#[test]
fn test_american_put_worth_more_than_european() {
    let underlying = Underlying::new("BTC", Settlement::Spot, 100.0, t0(), 0.05, 0.0).unwrap();
    let mut american =
        LatticeOption::new(contract(&underlying, OptionStyle::American, OptionType::Put)).unwrap();
    let mut european =
        AnalyticOption::new(contract(&underlying, OptionStyle::European, OptionType::Put)).unwrap();
    let am = american.calculate_value().unwrap();
    let eu = european.calculate_value().unwrap();
    assert!(am > eu, "American {am} should exceed European {eu}");
    assert!((am - 6.0928).abs() < 0.001, "Expected ~6.0928, got {am}");
}

#[test]
fn test_greeks_close_to_analytic() {
    let underlying = Underlying::new("BTC", Settlement::Spot, 100.0, t0(), 0.05, 0.0).unwrap();
    let mut tree = LatticeOption::new(contract(&underlying, OptionStyle::European, OptionType::Call))
        .unwrap();
    let mut closed =
        AnalyticOption::new(contract(&underlying, OptionStyle::European, OptionType::Call)).unwrap();
    let l = tree.calculate_greeks().unwrap();
    let a = closed.calculate_greeks().unwrap();

    let checks = [
        ("delta", l.delta, a.delta, 0.005),
        ("gamma", l.gamma, a.gamma, 0.0005),
        ("theta", l.theta, a.theta, 0.05),
        ("vega", l.vega, a.vega, 0.1),
        ("rho", l.rho, a.rho, 0.2),
    ];
    for (name, lattice, analytic, tol) in checks {
        assert!(
            (lattice - analytic).abs() < tol,
            "{name}: lattice {lattice} vs analytic {analytic}"
        );
    }
    assert_eq!(l.gamma, l.relative_gamma);
}

#[test]
fn test_american_put_greek_signs() {
    let underlying = Underlying::new("SPX", Settlement::Spot, 100.0, t0(), 0.05, 0.0).unwrap();
    let mut tree =
        LatticeOption::new(contract(&underlying, OptionStyle::American, OptionType::Put)).unwrap();
    tree.calculate().unwrap();
    let g = tree.contract().greeks().unwrap();
    assert!(g.delta < 0.0 && g.delta > -1.0);
    assert!(g.gamma > 0.0);
    assert!(g.theta < 0.0);
    assert!(g.vega > 0.0);
    assert!(g.rho < 0.0);
}

// ===========================================================================
// Rolling roll-back
// ===========================================================================

#[test]
fn test_rolling_matches_full_table() {
    let params = CrrParameters::new(0.05, 0.0, 0.2).unwrap();
    let full = Lattice::build(100.0, &params, 600).evaluate(100.0, OptionType::Put, &params);
    let rolling = evaluate_rolling(100.0, 100.0, OptionType::Put, &params, 600);
    assert!((full.value - rolling.value).abs() < 1e-9);
    assert!((full.delta().unwrap() - rolling.delta().unwrap()).abs() < 1e-9);
    assert!((full.gamma().unwrap() - rolling.gamma().unwrap()).abs() < 1e-9);
    assert!((full.theta(params.dt).unwrap() - rolling.theta(params.dt).unwrap()).abs() < 1e-6);
}

#[test]
fn test_rolling_short_tree_identical() {
    let params = CrrParameters::new(0.05, 0.02, 0.3).unwrap();
    for steps in 1..=2 {
        let full = Lattice::build(100.0, &params, steps).evaluate(95.0, OptionType::Call, &params);
        let rolling = evaluate_rolling(100.0, 95.0, OptionType::Call, &params, steps);
        assert_eq!(full, rolling, "steps {steps}");
    }
}

#[test]
fn test_long_dated_tree_rolls() {
    let underlying = Underlying::new("BTC", Settlement::Spot, 100.0, t0(), 0.05, 0.0).unwrap();
    let expiry = t0() + Duration::days(2192) + Duration::hours(6);
    let c = OptionContract::new(
        100.0,
        OptionStyle::European,
        OptionType::Call,
        &underlying,
        expiry,
        0.2,
    )
    .unwrap();
    let mut tree = LatticeOption::new(c.clone()).unwrap();
    assert!(tree.time_steps().unwrap() > FULL_TABLE_MAX_STEPS);
    let mut closed = AnalyticOption::new(c).unwrap();

    tree.calculate().unwrap();
    let lattice_value = tree.contract().value().unwrap();
    let analytic_value = closed.calculate_value().unwrap();
    assert!(
        (lattice_value - analytic_value).abs() < 0.05,
        "lattice {lattice_value} vs analytic {analytic_value}"
    );
    let g = tree.contract().greeks().unwrap();
    assert!(g.delta > 0.0 && g.delta < 1.0);
    assert!(g.gamma > 0.0);
}

// ===========================================================================
// Bumped Greeks near the probability bound
// ===========================================================================

fn low_vol_put<'u>(underlying: &'u Underlying, volatility: f64) -> LatticeOption<'u> {
    let c = OptionContract::new(
        100.0,
        OptionStyle::American,
        OptionType::Put,
        underlying,
        t0() + Duration::days(180) + Duration::hours(6),
        volatility,
    )
    .unwrap();
    LatticeOption::new(c).unwrap()
}

#[test]
fn test_vega_falls_back_when_down_bump_is_invalid() {
    // sigma - 0.01 puts the up-move probability above one at r = 10%.
    let underlying = Underlying::new("BTC", Settlement::Spot, 100.0, t0(), 0.1, 0.0).unwrap();
    let mut tree = low_vol_put(&underlying, 0.015);
    assert_eq!(tree.time_steps().unwrap(), 180);

    tree.calculate().unwrap();
    let value = tree.contract().value().unwrap();
    assert!((value - 0.0378759).abs() < 1e-6, "Expected ~0.0378759, got {value}");
    let g = tree.contract().greeks().unwrap();
    assert!(g.vega.is_finite() && g.vega > 0.0, "vega {}", g.vega);
    assert!(g.rho.is_finite());
}

#[test]
fn test_rho_falls_back_when_up_bump_is_invalid() {
    // Just above the bound sigma = r * sqrt(dt); r + 0.0001 crosses it.
    let underlying = Underlying::new("BTC", Settlement::Spot, 100.0, t0(), 0.1, 0.0).unwrap();
    let mut tree = low_vol_put(&underlying, 0.005235);
    tree.calculate().unwrap();
    let g = tree.contract().greeks().unwrap();
    assert!(g.rho.is_finite() && g.rho < 0.0, "rho {}", g.rho);
    assert!(g.vega.is_finite());
}

// ===========================================================================
// Errors
// ===========================================================================

#[test]
fn test_invalid_probability_at_construction() {
    let underlying = Underlying::new("BTC", Settlement::Spot, 100.0, t0(), 0.5, 0.0).unwrap();
    let c = OptionContract::new(
        100.0,
        OptionStyle::American,
        OptionType::Put,
        &underlying,
        t0() + one_year(),
        0.001,
    )
    .unwrap();
    assert!(matches!(
        LatticeOption::new(c),
        Err(GreeksError::InvalidLatticeParameters { .. })
    ));
}

#[test]
fn test_invalid_probability_after_volatility_change() {
    let underlying = Underlying::new("BTC", Settlement::Spot, 100.0, t0(), 0.5, 0.0).unwrap();
    let mut tree =
        LatticeOption::new(contract(&underlying, OptionStyle::American, OptionType::Put)).unwrap();
    tree.contract_mut().set_volatility(0.001).unwrap();
    assert!(matches!(
        tree.calculate(),
        Err(GreeksError::InvalidLatticeParameters { .. })
    ));
}

#[test]
fn test_less_than_one_step() {
    let underlying = Underlying::new("BTC", Settlement::Spot, 100.0, t0(), 0.05, 0.0).unwrap();
    let c = OptionContract::new(
        100.0,
        OptionStyle::American,
        OptionType::Put,
        &underlying,
        t0() + Duration::hours(12),
        0.2,
    )
    .unwrap();
    let mut tree = LatticeOption::new(c).unwrap();
    match tree.calculate_value().unwrap_err() {
        GreeksError::InvalidTerm { field, .. } => assert_eq!(field, "time_steps"),
        other => panic!("Expected InvalidTerm, got {other:?}"),
    }
}

#[test]
fn test_one_step_values_but_no_gamma() {
    let underlying = Underlying::new("BTC", Settlement::Spot, 100.0, t0(), 0.05, 0.0).unwrap();
    let c = OptionContract::new(
        100.0,
        OptionStyle::American,
        OptionType::Put,
        &underlying,
        t0() + Duration::hours(36),
        0.2,
    )
    .unwrap();
    let mut tree = LatticeOption::new(c).unwrap();
    assert!(tree.calculate_value().is_ok());
    assert!(matches!(
        tree.calculate(),
        Err(GreeksError::InvalidTerm { .. })
    ));
    assert!(tree.contract().value().is_none());
}

#[test]
fn test_asian_rejected() {
    let underlying = Underlying::new("BTC", Settlement::Spot, 100.0, t0(), 0.05, 0.0).unwrap();
    match LatticeOption::new(contract(&underlying, OptionStyle::Asian, OptionType::Call)).unwrap_err()
    {
        GreeksError::UnsupportedStyle { style, .. } => assert_eq!(style, OptionStyle::Asian),
        other => panic!("Expected UnsupportedStyle, got {other:?}"),
    }
}
