//! Score factors paired positionally with weights.

use serde::{Deserialize, Serialize};

use crate::state::StateError;

/// Factor identifiers and their weights, matched by position.
///
/// Fields are private so the equal-length invariant cannot be broken from
/// outside; deserialization goes through [`ScoreFactorSet::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFactorSet")]
pub struct ScoreFactorSet {
    score_factors: Vec<String>,
    weights: Vec<f64>,
}

#[derive(Deserialize)]
struct RawFactorSet {
    #[serde(default)]
    score_factors: Vec<String>,
    #[serde(default)]
    weights: Vec<f64>,
}

impl TryFrom<RawFactorSet> for ScoreFactorSet {
    type Error = StateError;

    fn try_from(raw: RawFactorSet) -> Result<Self, Self::Error> {
        Self::new(raw.score_factors, raw.weights)
    }
}

impl ScoreFactorSet {
    pub fn new(score_factors: Vec<String>, weights: Vec<f64>) -> Result<Self, StateError> {
        if score_factors.len() != weights.len() {
            return Err(StateError::FactorWeightMismatch {
                factors: score_factors.len(),
                weights: weights.len(),
            });
        }
        Ok(Self {
            score_factors,
            weights,
        })
    }

    /// `bond_prem`, `ytm`, `turnover_5` weighted `-10`, `10`, `5`.
    pub fn convertible_bond_defaults() -> Self {
        Self {
            score_factors: vec!["bond_prem".into(), "ytm".into(), "turnover_5".into()],
            weights: vec![-10.0, 10.0, 5.0],
        }
    }

    pub fn factors(&self) -> &[String] {
        &self.score_factors
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// `(factor, weight)` pairs in order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.score_factors
            .iter()
            .map(String::as_str)
            .zip(self.weights.iter().copied())
    }

    /// Overwrite the weight at `index`. The factor list is never touched.
    pub fn set_weight(&mut self, index: usize, value: f64) -> Result<(), StateError> {
        let len = self.score_factors.len();
        match self.weights.get_mut(index) {
            Some(w) => {
                *w = value;
                Ok(())
            }
            None => Err(StateError::WeightIndexOutOfRange { index, len }),
        }
    }
}
