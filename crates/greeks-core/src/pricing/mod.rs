pub mod comparison;
pub mod valuation;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::GreeksError;
use crate::market::{Settlement, Underlying};
use crate::options::{
    EngineKind, Greeks, OptionContract, OptionPricer, OptionStyle, OptionType,
};
use crate::types::{Price, Rate};
use crate::GreeksResult;

pub use comparison::{compare_engines, EngineComparisonOutput};
pub use valuation::{
    intrinsic_values, price_option, IntrinsicInput, IntrinsicOutput, OptionPricingOutput,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnderlyingInput {
    pub name: String,
    pub settlement: Settlement,
    pub spot: Price,
    pub valuation_time: NaiveDateTime,
    pub risk_free_rate: Rate,
    #[serde(default)]
    pub dividend_yield: Rate,
}

impl UnderlyingInput {
    pub fn build(&self) -> GreeksResult<Underlying> {
        Underlying::new(
            self.name.as_str(),
            self.settlement,
            self.spot,
            self.valuation_time,
            self.risk_free_rate,
            self.dividend_yield,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionPricingInput {
    pub underlying: UnderlyingInput,
    pub strike: Price,
    pub style: OptionStyle,
    pub option_type: OptionType,
    pub expiry: NaiveDateTime,
    pub volatility: Rate,
    /// Defaults to analytic for European contracts and lattice otherwise.
    #[serde(default)]
    pub engine: Option<EngineKind>,
}

impl OptionPricingInput {
    pub fn resolved_engine(&self) -> EngineKind {
        self.engine.unwrap_or(match self.style {
            OptionStyle::European => EngineKind::Analytic,
            OptionStyle::American | OptionStyle::Asian => EngineKind::Lattice,
        })
    }

    pub fn contract<'u>(
        &self,
        underlying: &'u Underlying,
        style: OptionStyle,
    ) -> GreeksResult<OptionContract<'u>> {
        OptionContract::new(
            self.strike,
            style,
            self.option_type,
            underlying,
            self.expiry,
            self.volatility,
        )
    }
}

/// Run a full `calculate` and read back the committed results.
pub(crate) fn evaluate<'u, P: OptionPricer<'u>>(option: &mut P) -> GreeksResult<(f64, Greeks)> {
    option.calculate()?;
    let contract = option.contract();
    match (contract.value(), contract.greeks()) {
        (Some(value), Some(greeks)) => Ok((value, greeks)),
        _ => Err(GreeksError::invalid_term(
            "results",
            "valuation finished without committing results",
        )),
    }
}

/// Warnings shared by every entry point that values on the lattice.
pub(crate) fn lattice_warnings(input: &OptionPricingInput, style: OptionStyle) -> Vec<String> {
    let mut warnings = Vec::new();
    let underlying = &input.underlying;
    if style == OptionStyle::European
        && (input.option_type == OptionType::Put || underlying.dividend_yield > 0.0)
    {
        warnings.push(
            "Lattice applies the early-exercise max at every node; European value includes any early-exercise premium"
                .into(),
        );
    }
    if underlying.settlement == Settlement::Futures {
        warnings.push(
            "Lattice grows at r - q and does not apply the zero cost of carry of futures settlement"
                .into(),
        );
    }
    warnings
}

pub(crate) fn input_warnings(input: &OptionPricingInput) -> Vec<String> {
    let mut warnings = Vec::new();
    if input.volatility > 2.0 {
        warnings.push(format!(
            "Volatility of {:.0}% is unusually high; check it is a decimal, not a percentage",
            input.volatility * 100.0
        ));
    }
    if input.underlying.risk_free_rate.abs() > 0.5 {
        warnings.push(format!(
            "Risk-free rate of {:.2} looks like a percentage; rates are decimals",
            input.underlying.risk_free_rate
        ));
    }
    warnings
}
