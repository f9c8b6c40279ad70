use statrs::function::erf::erfc;
use std::f64::consts::{PI, SQRT_2};

/// Standard normal CDF, `N(x) = erfc(-x / sqrt(2)) / 2`.
///
/// The complementary error function keeps `N(x) + N(-x) = 1` to machine
/// precision, which put-call parity relies on.
pub fn norm_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / SQRT_2)
}

/// Standard normal PDF
pub fn norm_pdf(x: f64) -> f64 {
    (-0.5 * x * x).exp() / (2.0 * PI).sqrt()
}
