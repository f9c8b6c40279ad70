use napi::Result as NapiResult;
use napi_derive::napi;

use greeks_core::pricing::{self, IntrinsicInput, OptionPricingInput};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Valuation
// ---------------------------------------------------------------------------

#[napi]
pub fn price_option(input_json: String) -> NapiResult<String> {
    let input: OptionPricingInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = pricing::price_option(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn compare_engines(input_json: String) -> NapiResult<String> {
    let input: OptionPricingInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = pricing::compare_engines(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn intrinsic_values(input_json: String) -> NapiResult<String> {
    let input: IntrinsicInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = pricing::intrinsic_values(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Market data
// ---------------------------------------------------------------------------

#[napi]
pub fn trading_conventions() -> NapiResult<String> {
    serde_json::to_string(greeks_core::market::trading_conventions()).map_err(to_napi_error)
}
