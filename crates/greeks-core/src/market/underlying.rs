use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::fmt;

use super::conventions::trading_days_per_year;
use crate::error::GreeksError;
use crate::types::{Price, Rate};
use crate::GreeksResult;

/// How the underlying settles, which fixes its cost of carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Settlement {
    Spot,
    Futures,
}

impl fmt::Display for Settlement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Settlement::Spot => write!(f, "Spot"),
            Settlement::Futures => write!(f, "Futures"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Underlying {
    name: String,
    settlement: Settlement,
    spot: Price,
    valuation_time: Cell<NaiveDateTime>,
    risk_free_rate: Rate,
    dividend_yield: Rate,
    cost_of_carry: Rate,
    trading_days_per_year: f64,
}

impl Underlying {
    pub fn new(
        name: impl Into<String>,
        settlement: Settlement,
        spot: Price,
        valuation_time: NaiveDateTime,
        risk_free_rate: Rate,
        dividend_yield: Rate,
    ) -> GreeksResult<Self> {
        let name = name.into();
        if !spot.is_finite() || spot <= 0.0 {
            return Err(GreeksError::invalid_input("spot", "must be positive"));
        }
        if !risk_free_rate.is_finite() {
            return Err(GreeksError::invalid_input("risk_free_rate", "must be finite"));
        }
        if !dividend_yield.is_finite() {
            return Err(GreeksError::invalid_input("dividend_yield", "must be finite"));
        }
        let trading_days_per_year = trading_days_per_year(&name)?;

        // Futures cost nothing to carry: the margin earns the risk-free rate.
        let cost_of_carry = match settlement {
            Settlement::Spot => risk_free_rate - dividend_yield,
            Settlement::Futures => 0.0,
        };

        Ok(Self {
            name,
            settlement,
            spot,
            valuation_time: Cell::new(valuation_time),
            risk_free_rate,
            dividend_yield,
            cost_of_carry,
            trading_days_per_year,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn settlement(&self) -> Settlement {
        self.settlement
    }

    pub fn spot(&self) -> Price {
        self.spot
    }

    pub fn valuation_time(&self) -> NaiveDateTime {
        self.valuation_time.get()
    }

    pub fn risk_free_rate(&self) -> Rate {
        self.risk_free_rate
    }

    pub fn dividend_yield(&self) -> Rate {
        self.dividend_yield
    }

    /// Generalised cost of carry `b`.
    pub fn cost_of_carry(&self) -> Rate {
        self.cost_of_carry
    }

    pub fn trading_days_per_year(&self) -> f64 {
        self.trading_days_per_year
    }

    /// Move the valuation clock forward to `time`.
    ///
    /// Results computed at the previous clock read back as not computed
    /// until the options are recalculated.
    pub fn advance_to(&self, time: NaiveDateTime) -> GreeksResult<()> {
        let current = self.valuation_time.get();
        if time < current {
            return Err(GreeksError::invalid_input(
                "valuation_time",
                format!("cannot move the clock back from {current} to {time}"),
            ));
        }
        tracing::debug!(underlying = %self.name, from = %current, to = %time, "advancing valuation clock");
        self.valuation_time.set(time);
        Ok(())
    }
}
