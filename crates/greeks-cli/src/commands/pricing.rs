use clap::{Args, ValueEnum};
use serde_json::Value;

use greeks_core::pricing::{self, IntrinsicInput, OptionPricingInput};
use greeks_core::{EngineKind, OptionType};

use super::load_input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum EngineArg {
    Analytic,
    Lattice,
}

impl From<EngineArg> for EngineKind {
    fn from(arg: EngineArg) -> Self {
        match arg {
            EngineArg::Analytic => EngineKind::Analytic,
            EngineArg::Lattice => EngineKind::Lattice,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OptionTypeArg {
    Call,
    Put,
}

impl From<OptionTypeArg> for OptionType {
    fn from(arg: OptionTypeArg) -> Self {
        match arg {
            OptionTypeArg::Call => OptionType::Call,
            OptionTypeArg::Put => OptionType::Put,
        }
    }
}

/// Arguments for option pricing
#[derive(Args)]
pub struct PriceArgs {
    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,

    /// Override the engine chosen by exercise style
    #[arg(long, value_enum)]
    pub engine: Option<EngineArg>,
}

pub fn run_price(args: PriceArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut pricing_input: OptionPricingInput =
        load_input(args.input.as_deref(), "option pricing")?;
    if let Some(engine) = args.engine {
        pricing_input.engine = Some(engine.into());
    }
    let result = pricing::price_option(&pricing_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for lattice vs closed-form comparison
#[derive(Args)]
pub struct CompareArgs {
    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_compare(args: CompareArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let pricing_input: OptionPricingInput =
        load_input(args.input.as_deref(), "engine comparison")?;
    let result = pricing::compare_engines(&pricing_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for intrinsic values
#[derive(Args)]
pub struct IntrinsicArgs {
    /// Path to JSON or YAML input file
    #[arg(long, conflicts_with_all = ["prices", "strike", "option_type"])]
    pub input: Option<String>,

    /// Underlying prices, comma separated
    #[arg(long, value_delimiter = ',', requires_all = ["strike", "option_type"])]
    pub prices: Option<Vec<f64>>,

    #[arg(long)]
    pub strike: Option<f64>,

    #[arg(long, value_enum)]
    pub option_type: Option<OptionTypeArg>,
}

pub fn run_intrinsic(args: IntrinsicArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let intrinsic_input = match (args.prices, args.strike, args.option_type) {
        (Some(prices), Some(strike), Some(option_type)) => IntrinsicInput {
            prices,
            strike,
            option_type: option_type.into(),
        },
        _ => load_input(args.input.as_deref(), "intrinsic values")?,
    };
    let result = pricing::intrinsic_values(&intrinsic_input)?;
    Ok(serde_json::to_value(result)?)
}
