use super::{EngineKind, OptionContract, OptionPricer, OptionStyle, OptionType};
use crate::error::GreeksError;
use crate::math::{norm_cdf, norm_pdf};
use crate::GreeksResult;

const SUPPORTED_STYLES: &[OptionStyle] = &[OptionStyle::European];

// ---------------------------------------------------------------------------
// Closed-form terms
// ---------------------------------------------------------------------------

/// Terms shared by the value and every Greek for one valuation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BsmTerms {
    pub spot: f64,
    pub strike: f64,
    pub carry: f64,
    pub rate: f64,
    pub time: f64,
    pub volatility: f64,
    pub sqrt_t: f64,
    pub d1: f64,
    pub d2: f64,
    /// e^{(b - r)T}
    pub carry_factor: f64,
    /// e^{-rT}
    pub discount: f64,
}

impl BsmTerms {
    pub fn new(
        spot: f64,
        strike: f64,
        carry: f64,
        rate: f64,
        time: f64,
        volatility: f64,
    ) -> GreeksResult<Self> {
        if volatility <= 0.0 {
            return Err(GreeksError::invalid_term("volatility", "must be positive"));
        }
        if time <= 0.0 {
            return Err(GreeksError::invalid_term(
                "time_to_expiry",
                "must be positive for closed-form valuation",
            ));
        }
        if spot <= 0.0 || strike <= 0.0 {
            return Err(GreeksError::invalid_input(
                "spot/strike",
                "must both be positive",
            ));
        }

        let sqrt_t = time.sqrt();
        let sigma_sqrt_t = volatility * sqrt_t;
        let d1 = ((spot / strike).ln() + (carry + volatility * volatility / 2.0) * time)
            / sigma_sqrt_t;
        let d2 = d1 - sigma_sqrt_t;

        Ok(Self {
            spot,
            strike,
            carry,
            rate,
            time,
            volatility,
            sqrt_t,
            d1,
            d2,
            carry_factor: ((carry - rate) * time).exp(),
            discount: (-rate * time).exp(),
        })
    }

    pub fn value(&self, option_type: OptionType) -> f64 {
        match option_type {
            OptionType::Call => {
                self.spot * self.carry_factor * norm_cdf(self.d1)
                    - self.strike * self.discount * norm_cdf(self.d2)
            }
            OptionType::Put => {
                self.strike * self.discount * norm_cdf(-self.d2)
                    - self.spot * self.carry_factor * norm_cdf(-self.d1)
            }
        }
    }

    pub fn delta(&self, option_type: OptionType) -> f64 {
        match option_type {
            OptionType::Call => self.carry_factor * norm_cdf(self.d1),
            OptionType::Put => -self.carry_factor * norm_cdf(-self.d1),
        }
    }

    pub fn gamma(&self) -> f64 {
        self.carry_factor * norm_pdf(self.d1) / (self.spot * self.volatility * self.sqrt_t)
    }

    pub fn theta(&self, option_type: OptionType) -> f64 {
        let decay = -(self.spot * self.carry_factor * norm_pdf(self.d1) * self.volatility)
            / (2.0 * self.sqrt_t);
        let carry_term = (self.carry - self.rate) * self.spot * self.carry_factor;
        let rate_term = self.rate * self.strike * self.discount;
        match option_type {
            OptionType::Call => {
                decay - carry_term * norm_cdf(self.d1) - rate_term * norm_cdf(self.d2)
            }
            OptionType::Put => {
                decay + carry_term * norm_cdf(-self.d1) + rate_term * norm_cdf(-self.d2)
            }
        }
    }

    pub fn vega(&self) -> f64 {
        self.spot * self.sqrt_t * norm_pdf(self.d1) * self.carry_factor
    }

    pub fn rho(&self, option_type: OptionType) -> f64 {
        match option_type {
            OptionType::Call => self.strike * self.time * self.discount * norm_cdf(self.d2),
            OptionType::Put => -self.strike * self.time * self.discount * norm_cdf(-self.d2),
        }
    }

    /// `S e^{(b-r)T} - K e^{-rT}`, the call-minus-put price.
    pub fn parity_spread(&self) -> f64 {
        self.spot * self.carry_factor - self.strike * self.discount
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// A European option valued in closed form.
///
/// Carry is `b = r - q` for spot settlement and `b = 0` for futures, which
/// gives Black-76.
#[derive(Debug, Clone)]
pub struct AnalyticOption<'u> {
    contract: OptionContract<'u>,
}

impl<'u> AnalyticOption<'u> {
    /// Fails with `UnsupportedStyle` unless the contract is European.
    pub fn new(contract: OptionContract<'u>) -> GreeksResult<Self> {
        let option = Self { contract };
        option.ensure_supported()?;
        Ok(option)
    }

    pub fn into_contract(self) -> OptionContract<'u> {
        self.contract
    }
}

impl<'u> OptionPricer<'u> for AnalyticOption<'u> {
    type Terms = BsmTerms;

    fn engine(&self) -> EngineKind {
        EngineKind::Analytic
    }

    fn supported_styles(&self) -> &'static [OptionStyle] {
        SUPPORTED_STYLES
    }

    fn contract(&self) -> &OptionContract<'u> {
        &self.contract
    }

    fn contract_mut(&mut self) -> &mut OptionContract<'u> {
        &mut self.contract
    }

    fn prepare(&self) -> GreeksResult<BsmTerms> {
        let c = &self.contract;
        let underlying = c.underlying();
        let terms = BsmTerms::new(
            underlying.spot(),
            c.strike(),
            underlying.cost_of_carry(),
            underlying.risk_free_rate(),
            c.time_to_expiry(),
            c.volatility(),
        )?;
        tracing::debug!(d1 = terms.d1, d2 = terms.d2, t = terms.time, "bsm terms");
        Ok(terms)
    }

    fn value(&self, terms: &BsmTerms) -> GreeksResult<f64> {
        Ok(terms.value(self.contract.option_type()))
    }

    fn delta(&self, terms: &BsmTerms) -> GreeksResult<f64> {
        Ok(terms.delta(self.contract.option_type()))
    }

    fn gamma(&self, terms: &BsmTerms) -> GreeksResult<f64> {
        Ok(terms.gamma())
    }

    fn theta(&self, terms: &BsmTerms) -> GreeksResult<f64> {
        Ok(terms.theta(self.contract.option_type()))
    }

    fn vega(&self, terms: &BsmTerms) -> GreeksResult<f64> {
        Ok(terms.vega())
    }

    fn rho(&self, terms: &BsmTerms) -> GreeksResult<f64> {
        Ok(terms.rho(self.contract.option_type()))
    }
}
