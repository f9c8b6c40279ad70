pub mod contract;
pub mod payoff;

#[cfg(feature = "analytic")]
pub mod analytic;

#[cfg(feature = "lattice")]
pub mod lattice;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::GreeksError;
use crate::GreeksResult;

pub use contract::{OptionContract, OptionResults};
pub use payoff::intrinsic_value;

#[cfg(feature = "analytic")]
pub use analytic::AnalyticOption;

#[cfg(feature = "lattice")]
pub use lattice::LatticeOption;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionType {
    Call,
    Put,
}

impl OptionType {
    /// Exercise value at a single underlying price.
    pub fn intrinsic(&self, price: f64, strike: f64) -> f64 {
        match self {
            OptionType::Call => (price - strike).max(0.0),
            OptionType::Put => (strike - price).max(0.0),
        }
    }

    /// The opposite leg (call for a put and vice versa).
    pub fn opposite(&self) -> Self {
        match self {
            OptionType::Call => OptionType::Put,
            OptionType::Put => OptionType::Call,
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionType::Call => write!(f, "Call"),
            OptionType::Put => write!(f, "Put"),
        }
    }
}

/// Exercise style. Asian can be tagged but no engine values it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionStyle {
    European,
    American,
    Asian,
}

impl fmt::Display for OptionStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionStyle::European => write!(f, "European"),
            OptionStyle::American => write!(f, "American"),
            OptionStyle::Asian => write!(f, "Asian"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    Analytic,
    Lattice,
}

impl EngineKind {
    pub fn methodology(&self) -> &'static str {
        match self {
            EngineKind::Analytic => "Black-Scholes-Merton (generalised cost of carry, closed-form)",
            EngineKind::Lattice => "Cox-Ross-Rubinstein binomial tree with early exercise",
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineKind::Analytic => write!(f, "analytic"),
            EngineKind::Lattice => write!(f, "lattice"),
        }
    }
}

/// First and second order sensitivities, annualised and unscaled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Greeks {
    /// dV/dS
    pub delta: f64,
    /// d²V/dS²
    pub gamma: f64,
    /// Equal to gamma; no separate normalisation is applied.
    pub relative_gamma: f64,
    /// dV/dt per year of calendar time
    pub theta: f64,
    /// dV/dσ per unit of volatility
    pub vega: f64,
    /// dV/dr per unit of rate
    pub rho: f64,
}

/// A valuation engine bound to one option contract.
///
/// `Terms` holds whatever the engine derives once per valuation (d1/d2 and
/// discount factors, lattice parameters) so the Greeks reuse the exact terms
/// the value was computed from.
pub trait OptionPricer<'u> {
    type Terms;

    fn engine(&self) -> EngineKind;

    /// Capability table: the styles this engine can value.
    fn supported_styles(&self) -> &'static [OptionStyle];

    fn contract(&self) -> &OptionContract<'u>;

    fn contract_mut(&mut self) -> &mut OptionContract<'u>;

    /// Validate the current contract state and derive the shared terms.
    fn prepare(&self) -> GreeksResult<Self::Terms>;

    fn value(&self, terms: &Self::Terms) -> GreeksResult<f64>;

    fn delta(&self, terms: &Self::Terms) -> GreeksResult<f64>;

    fn gamma(&self, terms: &Self::Terms) -> GreeksResult<f64>;

    fn theta(&self, terms: &Self::Terms) -> GreeksResult<f64>;

    fn vega(&self, terms: &Self::Terms) -> GreeksResult<f64>;

    fn rho(&self, terms: &Self::Terms) -> GreeksResult<f64>;

    fn supports(&self, style: OptionStyle) -> bool {
        self.supported_styles().contains(&style)
    }

    fn ensure_supported(&self) -> GreeksResult<()> {
        let style = self.contract().style();
        if self.supports(style) {
            Ok(())
        } else {
            Err(GreeksError::UnsupportedStyle {
                engine: self.engine(),
                style,
            })
        }
    }

    /// Delta, gamma, theta, vega and rho, in that order.
    fn greeks_from(&self, terms: &Self::Terms) -> GreeksResult<Greeks> {
        let delta = self.delta(terms)?;
        let gamma = self.gamma(terms)?;
        let theta = self.theta(terms)?;
        let vega = self.vega(terms)?;
        let rho = self.rho(terms)?;
        Ok(Greeks {
            delta,
            gamma,
            relative_gamma: gamma,
            theta,
            vega,
            rho,
        })
    }

    fn calculate_value(&mut self) -> GreeksResult<f64> {
        self.ensure_supported()?;
        self.contract_mut().compute_time_to_expiry()?;
        let terms = self.prepare()?;
        let value = self.value(&terms)?;
        self.contract_mut().record_value(value);
        Ok(value)
    }

    fn calculate_greeks(&mut self) -> GreeksResult<Greeks> {
        self.ensure_supported()?;
        self.contract_mut().compute_time_to_expiry()?;
        let terms = self.prepare()?;
        let greeks = self.greeks_from(&terms)?;
        self.contract_mut().record_greeks(greeks);
        Ok(greeks)
    }

    /// Refresh time to expiry, then value, then Greeks.
    ///
    /// Results are committed only if every step succeeds; on failure the
    /// contract is left with no results.
    fn calculate(&mut self) -> GreeksResult<()> {
        self.contract_mut().clear_results();
        self.ensure_supported()?;
        self.contract_mut().compute_time_to_expiry()?;
        let terms = self.prepare()?;
        let value = self.value(&terms)?;
        let greeks = self.greeks_from(&terms)?;
        self.contract_mut().record_value(value);
        self.contract_mut().record_greeks(greeks);
        Ok(())
    }
}
