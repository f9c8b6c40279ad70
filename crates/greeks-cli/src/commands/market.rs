use serde_json::Value;

use greeks_core::market::trading_conventions;

/// List instruments with a known trading-day convention.
pub fn run_conventions() -> Result<Value, Box<dyn std::error::Error>> {
    Ok(serde_json::to_value(trading_conventions())?)
}
