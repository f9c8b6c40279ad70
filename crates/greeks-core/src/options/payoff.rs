use super::OptionType;

/// Exercise value at each underlying price.
///
/// `max(price - strike, 0)` for calls and `max(strike - price, 0)` for puts.
pub fn intrinsic_value(prices: &[f64], strike: f64, option_type: OptionType) -> Vec<f64> {
    prices
        .iter()
        .map(|&price| option_type.intrinsic(price, strike))
        .collect()
}
