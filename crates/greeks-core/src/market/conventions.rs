use serde::Serialize;

use crate::error::GreeksError;
use crate::GreeksResult;

/// Trading-day convention for one instrument.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TradingConvention {
    pub name: &'static str,
    pub trading_days_per_year: f64,
}

// Crypto trades every calendar day; listed index options follow the
// exchange calendar.
const CONVENTIONS: &[TradingConvention] = &[
    TradingConvention {
        name: "BTC",
        trading_days_per_year: 365.25,
    },
    TradingConvention {
        name: "SPX",
        trading_days_per_year: 252.0,
    },
];

/// All known instrument conventions.
pub fn trading_conventions() -> &'static [TradingConvention] {
    CONVENTIONS
}

/// Look up the trading days per year for an instrument name (exact match).
pub fn trading_days_per_year(name: &str) -> GreeksResult<f64> {
    CONVENTIONS
        .iter()
        .find(|c| c.name == name)
        .map(|c| c.trading_days_per_year)
        .ok_or_else(|| GreeksError::UnknownInstrument { name: name.into() })
}
