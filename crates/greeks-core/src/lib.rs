pub mod error;
pub mod math;
pub mod market;
pub mod options;
pub mod time;
pub mod types;

#[cfg(all(feature = "analytic", feature = "lattice"))]
pub mod pricing;

pub use error::GreeksError;
pub use market::{Settlement, Underlying};
pub use options::{
    intrinsic_value, EngineKind, Greeks, OptionContract, OptionPricer, OptionResults,
    OptionStyle, OptionType,
};
pub use types::*;

#[cfg(feature = "analytic")]
pub use options::AnalyticOption;

#[cfg(feature = "lattice")]
pub use options::LatticeOption;

/// Standard result type for all option valuation operations
pub type GreeksResult<T> = Result<T, GreeksError>;
