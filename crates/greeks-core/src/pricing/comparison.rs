use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::{evaluate, input_warnings, lattice_warnings, OptionPricingInput};
use crate::options::analytic::AnalyticOption;
use crate::options::lattice::LatticeOption;
use crate::options::{Greeks, OptionStyle};
use crate::types::*;
use crate::GreeksResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineComparisonOutput {
    pub style: OptionStyle,
    pub lattice_value: Price,
    /// Closed-form value of the same contract with European exercise.
    pub analytic_value: Price,
    /// `lattice_value - analytic_value`. For American contracts this is the
    /// early-exercise premium plus discretisation error.
    pub early_exercise_premium: Price,
    pub lattice_greeks: Greeks,
    pub analytic_greeks: Greeks,
    pub time_steps: usize,
}

/// Value a contract on the lattice with its own style and in closed form as
/// a European contract, and report the difference.
pub fn compare_engines(
    input: &OptionPricingInput,
) -> GreeksResult<ComputationOutput<EngineComparisonOutput>> {
    let start = Instant::now();
    let underlying = input.underlying.build()?;
    let mut warnings = input_warnings(input);
    warnings.extend(lattice_warnings(input, input.style));

    let mut lattice = LatticeOption::new(input.contract(&underlying, input.style)?)?;
    let (lattice_value, lattice_greeks) = evaluate(&mut lattice)?;
    let time_steps = lattice.time_steps()?;

    let mut analytic = AnalyticOption::new(input.contract(&underlying, OptionStyle::European)?)?;
    let (analytic_value, analytic_greeks) = evaluate(&mut analytic)?;

    let premium = lattice_value - analytic_value;
    if input.style == OptionStyle::American && premium < 0.0 {
        warnings.push(format!(
            "Lattice value is {:.6} below the European value; increase time to expiry for a finer tree",
            -premium
        ));
    }

    let output = EngineComparisonOutput {
        style: input.style,
        lattice_value,
        analytic_value,
        early_exercise_premium: premium,
        lattice_greeks,
        analytic_greeks,
        time_steps,
    };

    let assumptions = serde_json::json!({
        "underlying": underlying.name(),
        "settlement": underlying.settlement().to_string(),
        "spot": underlying.spot(),
        "strike": input.strike,
        "risk_free_rate": underlying.risk_free_rate(),
        "dividend_yield": underlying.dividend_yield(),
        "volatility": input.volatility,
        "analytic_style": OptionStyle::European.to_string(),
    });

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Cox-Ross-Rubinstein lattice against Black-Scholes-Merton closed form",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GreeksError;
    use crate::options::OptionType;
    use crate::pricing::fixtures::input;

    #[test]
    fn test_american_put_premium_positive() {
        let out = compare_engines(&input(OptionStyle::American, OptionType::Put)).unwrap();
        let r = &out.result;
        assert_eq!(r.time_steps, 365);
        assert!(
            r.early_exercise_premium > 0.4,
            "premium {}",
            r.early_exercise_premium
        );
        assert!((r.analytic_value - 5.573526022256971).abs() < 1e-6);
    }

    #[test]
    fn test_american_call_no_dividend_matches_european() {
        let out = compare_engines(&input(OptionStyle::American, OptionType::Call)).unwrap();
        assert!(
            out.result.early_exercise_premium.abs() < 0.01,
            "premium {}",
            out.result.early_exercise_premium
        );
    }

    #[test]
    fn test_greek_signs_agree() {
        let out = compare_engines(&input(OptionStyle::European, OptionType::Call)).unwrap();
        let (l, a) = (out.result.lattice_greeks, out.result.analytic_greeks);
        assert!((l.delta - a.delta).abs() < 0.01);
        assert!((l.gamma - a.gamma).abs() < 0.001);
        assert!((l.theta - a.theta).abs() < 0.05);
        assert!((l.vega - a.vega).abs() < 0.1);
        assert!((l.rho - a.rho).abs() < 0.2);
    }

    #[test]
    fn test_asian_rejected() {
        let result = compare_engines(&input(OptionStyle::Asian, OptionType::Call));
        assert!(matches!(result, Err(GreeksError::UnsupportedStyle { .. })));
    }
}
