use serde::Serialize;

use super::{EngineKind, OptionContract, OptionPricer, OptionStyle, OptionType};
use crate::error::GreeksError;
use crate::time::DAYS_PER_YEAR;
use crate::GreeksResult;

/// Fixed calendar step in years.
pub const TIME_STEP: f64 = 1.0 / DAYS_PER_YEAR;

/// Longest tree kept as a full price table; deeper trees roll back over
/// a single values buffer.
pub const FULL_TABLE_MAX_STEPS: usize = 2_048;

const VOL_BUMP: f64 = 0.01;
const RATE_BUMP: f64 = 0.0001;

const SUPPORTED_STYLES: &[OptionStyle] = &[OptionStyle::European, OptionStyle::American];

// ---------------------------------------------------------------------------
// Tree parameters
// ---------------------------------------------------------------------------

/// Per-step tree parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CrrParameters {
    pub dt: f64,
    /// a = e^{(r-q)dt}
    pub growth: f64,
    pub up: f64,
    pub down: f64,
    /// Risk-neutral probability of an up move.
    pub probability: f64,
    /// e^{-r dt}
    pub discount: f64,
}

impl CrrParameters {
    pub fn new(rate: f64, dividend_yield: f64, volatility: f64) -> GreeksResult<Self> {
        if !volatility.is_finite() || volatility <= 0.0 {
            return Err(GreeksError::invalid_term("volatility", "must be positive"));
        }
        let dt = TIME_STEP;
        let growth = ((rate - dividend_yield) * dt).exp();
        let up = (volatility * dt.sqrt()).exp();
        let down = (-volatility * dt.sqrt()).exp();
        let probability = (growth - down) / (up - down);
        if !(probability > 0.0 && probability < 1.0) {
            return Err(GreeksError::InvalidLatticeParameters { probability });
        }
        Ok(Self {
            dt,
            growth,
            up,
            down,
            probability,
            discount: (-rate * dt).exp(),
        })
    }

    /// Whole steps that fit before expiry.
    pub fn time_steps(&self, time_to_expiry: f64) -> GreeksResult<usize> {
        let steps = (time_to_expiry / self.dt).floor();
        if !(steps >= 1.0) {
            return Err(GreeksError::invalid_term(
                "time_steps",
                format!("time to expiry {time_to_expiry:.6}y is shorter than one lattice step"),
            ));
        }
        Ok(steps as usize)
    }
}

// ---------------------------------------------------------------------------
// Full-table lattice
// ---------------------------------------------------------------------------

/// Underlying prices of a recombining tree.
///
/// Layer `i` holds the `i + 1` prices reachable after `i` moves, most-up first.
#[derive(Debug, Clone)]
pub struct Lattice {
    layers: Vec<Vec<f64>>,
}

impl Lattice {
    pub fn build(spot: f64, params: &CrrParameters, steps: usize) -> Self {
        let mut layers: Vec<Vec<f64>> = Vec::with_capacity(steps + 1);
        layers.push(vec![spot]);
        for i in 0..steps {
            let prev = &layers[i];
            let mut next = Vec::with_capacity(i + 2);
            next.extend(prev.iter().map(|price| price * params.up));
            next.push(prev[i] * params.down);
            layers.push(next);
        }
        Self { layers }
    }

    pub fn steps(&self) -> usize {
        self.layers.len() - 1
    }

    pub fn layers(&self) -> &[Vec<f64>] {
        &self.layers
    }

    /// Roll the tree back to its root.
    ///
    /// Terminal prices become exercise values; each earlier node becomes the
    /// larger of its discounted expectation and its exercise value. Layers
    /// are overwritten in place and dropped once consumed.
    pub fn evaluate(
        mut self,
        strike: f64,
        option_type: OptionType,
        params: &CrrParameters,
    ) -> LatticeValuation {
        let steps = self.steps();
        let early_prices: Vec<Vec<f64>> = self.layers.iter().take(3).cloned().collect();

        for node in self.layers[steps].iter_mut() {
            *node = option_type.intrinsic(*node, strike);
        }

        let p = params.probability;
        let mut early_values: Vec<Vec<f64>> = Vec::with_capacity(3);
        for i in (0..steps).rev() {
            let (settled, pending) = self.layers.split_at_mut(i + 1);
            let future = &pending[0];
            for (j, node) in settled[i].iter_mut().enumerate() {
                let continuation = params.discount * (p * future[j] + (1.0 - p) * future[j + 1]);
                let exercise = option_type.intrinsic(*node, strike);
                *node = if continuation > exercise {
                    continuation
                } else {
                    exercise
                };
            }
            if let Some(consumed) = self.layers.pop() {
                if i < 2 {
                    early_values.push(consumed);
                }
            }
        }
        early_values.push(self.layers.swap_remove(0));
        early_values.reverse();

        LatticeValuation {
            value: early_values[0][0],
            early_prices,
            early_values,
        }
    }
}

// ---------------------------------------------------------------------------
// Rolling roll-back
// ---------------------------------------------------------------------------

/// Value a tree without materialising its price table.
///
/// Node `(i, j)` sits at `spot * d^j * u^(i-j)`, so only the down diagonal
/// is stored. Option values live in one buffer that shrinks by a node per
/// layer; the first three layers are kept for the tree Greeks.
pub fn evaluate_rolling(
    spot: f64,
    strike: f64,
    option_type: OptionType,
    params: &CrrParameters,
    steps: usize,
) -> LatticeValuation {
    let early_prices = Lattice::build(spot, params, steps.min(2)).layers;

    let mut diagonal = Vec::with_capacity(steps + 1);
    diagonal.push(spot);
    for j in 0..steps {
        diagonal.push(diagonal[j] * params.down);
    }
    let price = |i: usize, j: usize| -> f64 {
        match early_prices.get(i) {
            Some(layer) => layer[j],
            None => diagonal[j] * params.up.powi((i - j) as i32),
        }
    };

    let mut values: Vec<f64> = (0..=steps)
        .map(|j| option_type.intrinsic(price(steps, j), strike))
        .collect();
    let mut early_values: Vec<Vec<f64>> = vec![Vec::new(); early_prices.len()];
    if let Some(slot) = early_values.get_mut(steps) {
        *slot = values.clone();
    }

    let p = params.probability;
    for i in (0..steps).rev() {
        for j in 0..=i {
            let continuation = params.discount * (p * values[j] + (1.0 - p) * values[j + 1]);
            let exercise = option_type.intrinsic(price(i, j), strike);
            values[j] = if continuation > exercise {
                continuation
            } else {
                exercise
            };
        }
        values.truncate(i + 1);
        if let Some(slot) = early_values.get_mut(i) {
            *slot = values.clone();
        }
    }

    LatticeValuation {
        value: values[0],
        early_prices,
        early_values,
    }
}

// ---------------------------------------------------------------------------
// Valuation
// ---------------------------------------------------------------------------

/// Full table for shallow trees, rolling buffers past `FULL_TABLE_MAX_STEPS`.
pub fn value_tree(
    spot: f64,
    strike: f64,
    option_type: OptionType,
    params: &CrrParameters,
    steps: usize,
) -> LatticeValuation {
    if steps <= FULL_TABLE_MAX_STEPS {
        Lattice::build(spot, params, steps).evaluate(strike, option_type, params)
    } else {
        evaluate_rolling(spot, strike, option_type, params, steps)
    }
}

/// Value one option on a freshly built tree.
pub fn crr_value(
    spot: f64,
    strike: f64,
    option_type: OptionType,
    params: &CrrParameters,
    steps: usize,
) -> f64 {
    value_tree(spot, strike, option_type, params, steps).value
}

/// Root value plus the first steps of the valued tree.
#[derive(Debug, Clone, PartialEq)]
pub struct LatticeValuation {
    pub value: f64,
    early_prices: Vec<Vec<f64>>,
    early_values: Vec<Vec<f64>>,
}

impl LatticeValuation {
    fn step(&self, i: usize) -> GreeksResult<(&[f64], &[f64])> {
        match (self.early_prices.get(i), self.early_values.get(i)) {
            (Some(prices), Some(values)) => Ok((prices.as_slice(), values.as_slice())),
            _ => Err(GreeksError::invalid_term(
                "time_steps",
                format!("tree Greeks need {i} or more steps"),
            )),
        }
    }

    /// Slope between the two nodes after one move.
    pub fn delta(&self) -> GreeksResult<f64> {
        let (s, f) = self.step(1)?;
        Ok((f[0] - f[1]) / (s[0] - s[1]))
    }

    /// Change in slope across the three nodes after two moves.
    pub fn gamma(&self) -> GreeksResult<f64> {
        let (s, f) = self.step(2)?;
        let upper = (f[0] - f[1]) / (s[0] - s[1]);
        let lower = (f[1] - f[2]) / (s[1] - s[2]);
        Ok((upper - lower) / (0.5 * (s[0] - s[2])))
    }

    /// Middle node two steps on, against the root.
    pub fn theta(&self, dt: f64) -> GreeksResult<f64> {
        let (_, f) = self.step(2)?;
        Ok((f[1] - self.value) / (2.0 * dt))
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// A bumped input and the tree value it produced, if its tree was valid.
type Leg = (f64, Option<f64>);

/// Central difference when both legs priced, one-sided against the base
/// otherwise.
fn bumped_difference(field: &str, base: (f64, f64), up: Leg, down: Leg) -> GreeksResult<f64> {
    match (up.1, down.1) {
        (Some(hi), Some(lo)) => Ok((hi - lo) / (up.0 - down.0)),
        (Some(hi), None) => Ok((hi - base.1) / (up.0 - base.0)),
        (None, Some(lo)) => Ok((base.1 - lo) / (base.0 - down.0)),
        (None, None) => Err(GreeksError::invalid_term(
            field,
            "no bumped tree has a valid up-move probability",
        )),
    }
}

#[derive(Debug, Clone)]
pub struct LatticeTerms {
    pub params: CrrParameters,
    pub steps: usize,
    pub valuation: LatticeValuation,
}

/// An option valued on a CRR tree; supports early exercise.
///
/// The tree steps one calendar day whatever the trading-day convention and
/// grows at `r - q` for both settlements. Delta, gamma and theta come from
/// the first two steps; vega and rho re-price bumped trees, falling back to
/// a one-sided difference when a bump leaves the probability outside (0, 1).
#[derive(Debug, Clone)]
pub struct LatticeOption<'u> {
    contract: OptionContract<'u>,
}

impl<'u> LatticeOption<'u> {
    /// Fails with `UnsupportedStyle` for Asian contracts and with
    /// `InvalidLatticeParameters` when the inputs admit arbitrage.
    pub fn new(contract: OptionContract<'u>) -> GreeksResult<Self> {
        let option = Self { contract };
        option.ensure_supported()?;
        option.parameters()?;
        Ok(option)
    }

    pub fn into_contract(self) -> OptionContract<'u> {
        self.contract
    }

    pub fn parameters(&self) -> GreeksResult<CrrParameters> {
        let underlying = self.contract.underlying();
        CrrParameters::new(
            underlying.risk_free_rate(),
            underlying.dividend_yield(),
            self.contract.volatility(),
        )
    }

    /// Steps for the current time to expiry.
    pub fn time_steps(&self) -> GreeksResult<usize> {
        self.parameters()?.time_steps(self.contract.time_to_expiry())
    }

    /// `None` when the bumped inputs give an invalid tree.
    fn reprice(&self, rate: f64, volatility: f64, steps: usize) -> GreeksResult<Option<f64>> {
        let c = &self.contract;
        let params = match CrrParameters::new(rate, c.underlying().dividend_yield(), volatility) {
            Ok(params) => params,
            Err(GreeksError::InvalidLatticeParameters { probability }) => {
                tracing::debug!(rate, volatility, probability, "skipping invalid bumped tree");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        Ok(Some(crr_value(
            c.underlying().spot(),
            c.strike(),
            c.option_type(),
            &params,
            steps,
        )))
    }
}

impl<'u> OptionPricer<'u> for LatticeOption<'u> {
    type Terms = LatticeTerms;

    fn engine(&self) -> EngineKind {
        EngineKind::Lattice
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

    fn prepare(&self) -> GreeksResult<LatticeTerms> {
        let c = &self.contract;
        let params = self.parameters()?;
        let steps = params.time_steps(c.time_to_expiry())?;
        tracing::debug!(
            steps,
            p = params.probability,
            rolling = steps > FULL_TABLE_MAX_STEPS,
            "building crr lattice"
        );
        let valuation = value_tree(
            c.underlying().spot(),
            c.strike(),
            c.option_type(),
            &params,
            steps,
        );
        Ok(LatticeTerms {
            params,
            steps,
            valuation,
        })
    }

    fn value(&self, terms: &LatticeTerms) -> GreeksResult<f64> {
        Ok(terms.valuation.value)
    }

    fn delta(&self, terms: &LatticeTerms) -> GreeksResult<f64> {
        terms.valuation.delta()
    }

    fn gamma(&self, terms: &LatticeTerms) -> GreeksResult<f64> {
        terms.valuation.gamma()
    }

    fn theta(&self, terms: &LatticeTerms) -> GreeksResult<f64> {
        terms.valuation.theta(terms.params.dt)
    }

    fn vega(&self, terms: &LatticeTerms) -> GreeksResult<f64> {
        let sigma = self.contract.volatility();
        let rate = self.contract.underlying().risk_free_rate();
        let upper = sigma + VOL_BUMP;
        let lower = sigma - VOL_BUMP;
        let up = (upper, self.reprice(rate, upper, terms.steps)?);
        // No down leg when the bump would leave no volatility.
        let down = if lower > 0.0 {
            (lower, self.reprice(rate, lower, terms.steps)?)
        } else {
            (lower, None)
        };
        bumped_difference("vega", (sigma, terms.valuation.value), up, down)
    }

    fn rho(&self, terms: &LatticeTerms) -> GreeksResult<f64> {
        let sigma = self.contract.volatility();
        let rate = self.contract.underlying().risk_free_rate();
        let up = (
            rate + RATE_BUMP,
            self.reprice(rate + RATE_BUMP, sigma, terms.steps)?,
        );
        let down = (
            rate - RATE_BUMP,
            self.reprice(rate - RATE_BUMP, sigma, terms.steps)?,
        );
        bumped_difference("rho", (rate, terms.valuation.value), up, down)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(rate: f64, vol: f64) -> CrrParameters {
        CrrParameters::new(rate, 0.0, vol).unwrap()
    }

    #[test]
    fn test_layer_shape() {
        let lattice = Lattice::build(100.0, &params(0.05, 0.2), 10);
        assert_eq!(lattice.steps(), 10);
        assert_eq!(lattice.layers()[0], vec![100.0]);
        for (i, layer) in lattice.layers().iter().enumerate() {
            assert_eq!(layer.len(), i + 1, "layer {i}");
        }
    }

    #[test]
    fn test_layers_ordered_most_up_first() {
        let p = params(0.05, 0.2);
        let lattice = Lattice::build(100.0, &p, 3);
        let layer = &lattice.layers()[3];
        assert!(layer.windows(2).all(|w| w[0] > w[1]));
        assert_eq!(layer[0], 100.0 * p.up * p.up * p.up);
        assert_eq!(layer[3], 100.0 * p.down * p.down * p.down);
    }

    #[test]
    fn test_probability_out_of_range() {
        // Drift per step dwarfs the volatility move.
        match CrrParameters::new(0.5, 0.0, 0.001) {
            Err(GreeksError::InvalidLatticeParameters { probability }) => {
                assert!(probability > 1.0)
            }
            other => panic!("Expected InvalidLatticeParameters, got {other:?}"),
        }
    }

    #[test]
    fn test_time_steps_floor() {
        let p = params(0.0, 0.2);
        assert_eq!(p.time_steps(1.0).unwrap(), 365);
        assert_eq!(p.time_steps(2.5 * TIME_STEP).unwrap(), 2);
        assert!(matches!(
            p.time_steps(0.5 * TIME_STEP),
            Err(GreeksError::InvalidTerm { .. })
        ));
    }

    #[test]
    fn test_single_step_value() {
        let p = params(0.0, 0.2);
        let value = crr_value(100.0, 100.0, OptionType::Call, &p, 1);
        let expected = p.discount * p.probability * (100.0 * p.up - 100.0);
        assert!((value - expected).abs() < 1e-12);
    }

    #[test]
    fn test_tree_greeks_need_two_steps() {
        let p = params(0.0, 0.2);
        let valuation = Lattice::build(100.0, &p, 1).evaluate(100.0, OptionType::Call, &p);
        assert!(valuation.delta().is_ok());
        assert!(matches!(valuation.gamma(), Err(GreeksError::InvalidTerm { .. })));
        assert!(matches!(valuation.theta(p.dt), Err(GreeksError::InvalidTerm { .. })));
    }

    #[test]
    fn test_deep_itm_put_exercises_immediately() {
        let p = params(0.05, 0.2);
        let value = crr_value(50.0, 100.0, OptionType::Put, &p, 30);
        assert!((value - 50.0).abs() < 1e-12);
    }
}
