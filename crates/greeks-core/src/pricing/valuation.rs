use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::{evaluate, input_warnings, lattice_warnings, OptionPricingInput};
use crate::error::GreeksError;
use crate::options::analytic::{AnalyticOption, BsmTerms};
use crate::options::lattice::{LatticeOption, TIME_STEP};
use crate::options::{intrinsic_value, EngineKind, Greeks, OptionPricer, OptionType};
use crate::types::*;
use crate::GreeksResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionPricingOutput {
    pub engine: EngineKind,
    pub value: Price,
    pub greeks: Greeks,
    /// Theta spread over the underlying's trading days.
    pub theta_per_day: f64,
    pub intrinsic_value: Price,
    pub time_value: Price,
    pub time_to_expiry: Years,
    /// Lattice only.
    pub time_steps: Option<usize>,
    /// Price of the opposite leg implied by put-call parity (analytic only).
    pub parity_price: Option<Price>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntrinsicInput {
    pub prices: Vec<Price>,
    pub strike: Price,
    pub option_type: OptionType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntrinsicOutput {
    pub values: Vec<Price>,
}

/// Value one option and all its Greeks on the requested (or default) engine.
pub fn price_option(
    input: &OptionPricingInput,
) -> GreeksResult<ComputationOutput<OptionPricingOutput>> {
    let start = Instant::now();
    let underlying = input.underlying.build()?;
    let contract = input.contract(&underlying, input.style)?;
    let engine = input.resolved_engine();
    let mut warnings = input_warnings(input);

    let (value, greeks, time_to_expiry, time_steps, parity_price) = match engine {
        EngineKind::Analytic => {
            let mut option = AnalyticOption::new(contract)?;
            let (value, greeks) = evaluate(&mut option)?;
            let terms: BsmTerms = option.prepare()?;
            let parity = match input.option_type {
                OptionType::Call => value - terms.parity_spread(),
                OptionType::Put => value + terms.parity_spread(),
            };
            (value, greeks, terms.time, None, Some(parity))
        }
        EngineKind::Lattice => {
            warnings.extend(lattice_warnings(input, input.style));
            let mut option = LatticeOption::new(contract)?;
            let (value, greeks) = evaluate(&mut option)?;
            let steps = option.time_steps()?;
            let t = option.contract().time_to_expiry();
            (value, greeks, t, Some(steps), None)
        }
    };

    let intrinsic = input.option_type.intrinsic(underlying.spot(), input.strike);
    let output = OptionPricingOutput {
        engine,
        value,
        greeks,
        theta_per_day: greeks.theta / underlying.trading_days_per_year(),
        intrinsic_value: intrinsic,
        time_value: value - intrinsic,
        time_to_expiry,
        time_steps,
        parity_price,
    };

    let lattice_time_step = time_steps.map(|_| TIME_STEP);
    let assumptions = serde_json::json!({
        "underlying": underlying.name(),
        "settlement": underlying.settlement().to_string(),
        "spot": underlying.spot(),
        "risk_free_rate": underlying.risk_free_rate(),
        "dividend_yield": underlying.dividend_yield(),
        "cost_of_carry": underlying.cost_of_carry(),
        "trading_days_per_year": underlying.trading_days_per_year(),
        "valuation_time": underlying.valuation_time().to_string(),
        "expiry": input.expiry.to_string(),
        "volatility": input.volatility,
        "style": input.style.to_string(),
        "lattice_time_step": lattice_time_step,
    });

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        engine.methodology(),
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

/// Exercise values across a set of underlying prices.
pub fn intrinsic_values(
    input: &IntrinsicInput,
) -> GreeksResult<ComputationOutput<IntrinsicOutput>> {
    let start = Instant::now();
    if !input.strike.is_finite() || input.strike <= 0.0 {
        return Err(GreeksError::invalid_input("strike", "must be positive"));
    }
    if let Some(bad) = input.prices.iter().find(|p| !p.is_finite()) {
        return Err(GreeksError::invalid_input(
            "prices",
            format!("{bad} is not a finite price"),
        ));
    }

    let mut warnings = Vec::new();
    if input.prices.is_empty() {
        warnings.push("No prices supplied".into());
    }
    let values = intrinsic_value(&input.prices, input.strike, input.option_type);

    let assumptions = serde_json::json!({
        "strike": input.strike,
        "option_type": input.option_type.to_string(),
    });
    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Intrinsic (immediate exercise) value",
        &assumptions,
        warnings,
        elapsed,
        IntrinsicOutput { values },
    ))
}
