use chrono::NaiveDateTime;
use serde::Serialize;

use super::{Greeks, OptionStyle, OptionType};
use crate::error::GreeksError;
use crate::market::Underlying;
use crate::time::year_fraction;
use crate::types::{Price, Rate, Years};
use crate::GreeksResult;

/// Value and Greeks from the last successful computation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OptionResults {
    pub value: Option<f64>,
    pub delta: Option<f64>,
    pub gamma: Option<f64>,
    pub relative_gamma: Option<f64>,
    pub theta: Option<f64>,
    pub vega: Option<f64>,
    pub rho: Option<f64>,
    /// Underlying valuation time the results were computed at.
    pub priced_at: Option<NaiveDateTime>,
}

/// One option contract, borrowing the underlying it is written on.
#[derive(Debug, Clone)]
pub struct OptionContract<'u> {
    strike: Price,
    style: OptionStyle,
    option_type: OptionType,
    underlying: &'u Underlying,
    expiry: NaiveDateTime,
    volatility: Rate,
    time_to_expiry: Years,
    results: OptionResults,
}

impl<'u> OptionContract<'u> {
    pub fn new(
        strike: Price,
        style: OptionStyle,
        option_type: OptionType,
        underlying: &'u Underlying,
        expiry: NaiveDateTime,
        volatility: Rate,
    ) -> GreeksResult<Self> {
        validate_strike(strike)?;
        validate_volatility(volatility)?;
        let mut contract = Self {
            strike,
            style,
            option_type,
            underlying,
            expiry,
            volatility,
            time_to_expiry: 0.0,
            results: OptionResults::default(),
        };
        contract.compute_time_to_expiry()?;
        Ok(contract)
    }

    /// Recompute time to expiry from the underlying's current clock.
    pub fn compute_time_to_expiry(&mut self) -> GreeksResult<Years> {
        let t = year_fraction(self.underlying.valuation_time(), self.expiry);
        if t < 0.0 {
            return Err(GreeksError::invalid_term(
                "time_to_expiry",
                format!(
                    "expiry {} is before valuation time {}",
                    self.expiry,
                    self.underlying.valuation_time()
                ),
            ));
        }
        self.time_to_expiry = t;
        Ok(t)
    }

    pub fn strike(&self) -> Price {
        self.strike
    }

    pub fn style(&self) -> OptionStyle {
        self.style
    }

    pub fn option_type(&self) -> OptionType {
        self.option_type
    }

    pub fn underlying(&self) -> &'u Underlying {
        self.underlying
    }

    pub fn expiry(&self) -> NaiveDateTime {
        self.expiry
    }

    pub fn volatility(&self) -> Rate {
        self.volatility
    }

    /// Time to expiry as of the last refresh.
    pub fn time_to_expiry(&self) -> Years {
        self.time_to_expiry
    }

    pub fn set_strike(&mut self, strike: Price) -> GreeksResult<()> {
        validate_strike(strike)?;
        self.strike = strike;
        self.clear_results();
        Ok(())
    }

    pub fn set_volatility(&mut self, volatility: Rate) -> GreeksResult<()> {
        validate_volatility(volatility)?;
        self.volatility = volatility;
        self.clear_results();
        Ok(())
    }

    pub fn set_expiry(&mut self, expiry: NaiveDateTime) -> GreeksResult<()> {
        let previous = self.expiry;
        self.expiry = expiry;
        self.clear_results();
        if let Err(e) = self.compute_time_to_expiry() {
            self.expiry = previous;
            return Err(e);
        }
        Ok(())
    }

    pub fn set_style(&mut self, style: OptionStyle) {
        self.style = style;
        self.clear_results();
    }

    pub fn set_option_type(&mut self, option_type: OptionType) {
        self.option_type = option_type;
        self.clear_results();
    }

    /// Results priced at the underlying's current clock, if any.
    pub fn results(&self) -> Option<&OptionResults> {
        match self.results.priced_at {
            Some(at) if at == self.underlying.valuation_time() => Some(&self.results),
            _ => None,
        }
    }

    /// True when results exist but the underlying clock has moved since.
    pub fn is_stale(&self) -> bool {
        self.results.priced_at.is_some() && self.results().is_none()
    }

    pub fn value(&self) -> Option<f64> {
        self.results().and_then(|r| r.value)
    }

    pub fn delta(&self) -> Option<f64> {
        self.results().and_then(|r| r.delta)
    }

    pub fn gamma(&self) -> Option<f64> {
        self.results().and_then(|r| r.gamma)
    }

    pub fn relative_gamma(&self) -> Option<f64> {
        self.results().and_then(|r| r.relative_gamma)
    }

    pub fn theta(&self) -> Option<f64> {
        self.results().and_then(|r| r.theta)
    }

    pub fn vega(&self) -> Option<f64> {
        self.results().and_then(|r| r.vega)
    }

    pub fn rho(&self) -> Option<f64> {
        self.results().and_then(|r| r.rho)
    }

    /// All five Greeks, when every one is available at the current clock.
    pub fn greeks(&self) -> Option<Greeks> {
        let r = self.results()?;
        Some(Greeks {
            delta: r.delta?,
            gamma: r.gamma?,
            relative_gamma: r.relative_gamma?,
            theta: r.theta?,
            vega: r.vega?,
            rho: r.rho?,
        })
    }

    pub(crate) fn clear_results(&mut self) {
        self.results = OptionResults::default();
    }

    /// Start a result set at the current clock, dropping anything older.
    fn stamp(&mut self) {
        let now = self.underlying.valuation_time();
        if self.results.priced_at != Some(now) {
            if self.results.priced_at.is_some() {
                tracing::debug!(priced_at = ?self.results.priced_at, %now, "discarding stale results");
            }
            self.results = OptionResults {
                priced_at: Some(now),
                ..OptionResults::default()
            };
        }
    }

    pub(crate) fn record_value(&mut self, value: f64) {
        self.stamp();
        self.results.value = Some(value);
    }

    pub(crate) fn record_greeks(&mut self, greeks: Greeks) {
        self.stamp();
        self.results.delta = Some(greeks.delta);
        self.results.gamma = Some(greeks.gamma);
        self.results.relative_gamma = Some(greeks.relative_gamma);
        self.results.theta = Some(greeks.theta);
        self.results.vega = Some(greeks.vega);
        self.results.rho = Some(greeks.rho);
    }
}

fn validate_strike(strike: Price) -> GreeksResult<()> {
    if !strike.is_finite() || strike <= 0.0 {
        return Err(GreeksError::invalid_input("strike", "must be positive"));
    }
    Ok(())
}

fn validate_volatility(volatility: Rate) -> GreeksResult<()> {
    if !volatility.is_finite() || volatility <= 0.0 {
        return Err(GreeksError::invalid_term("volatility", "must be positive"));
    }
    Ok(())
}
