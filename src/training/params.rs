//! Booster hyperparameters

use crate::error::{FraudBenchError, Result};
use crate::evaluation::{log_loss, roc_auc};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    /// Log loss on a 0/1 label
    Binary,
}

/// Metric reported on the training rows once boosting finishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Auc,
    BinaryLogloss,
}

impl Metric {
    pub fn name(&self) -> &'static str {
        match self {
            Metric::Auc => "auc",
            Metric::BinaryLogloss => "binary_logloss",
        }
    }

    /// `None` when the metric is undefined for these labels
    pub fn compute(&self, labels: &Array1<f64>, scores: &Array1<f64>) -> Option<f64> {
        match self {
            Metric::Auc => roc_auc(labels, scores),
            Metric::BinaryLogloss => log_loss(labels, scores),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoostingType {
    /// Every row in every round
    Gbdt,
    /// Gradient-based one-side sampling
    Goss,
}

/// Hyperparameters for the leaf-wise gradient-boosted tree classifier.
///
/// Defaults match the benchmark script: `num_leaves = 31`, binary objective,
/// `n_estimators = 1000`, AUC metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoosterParams {
    pub num_leaves: usize,
    pub objective: Objective,
    /// Round count carried in the parameter map; overrides the `num_round` argument when set
    pub n_estimators: Option<usize>,
    pub metric: Metric,
    pub learning_rate: f64,
    pub max_depth: Option<usize>,
    pub min_child_samples: usize,
    pub min_sum_hessian: f64,
    pub max_bin: usize,
    pub reg_lambda: f64,
    pub reg_alpha: f64,
    pub subsample: f64,
    pub colsample_bytree: f64,
    pub boosting: BoostingType,
    /// GOSS: share of rows kept by largest gradient
    pub top_rate: f64,
    /// GOSS: share of remaining rows sampled at random
    pub other_rate: f64,
    pub seed: u64,
}

impl Default for BoosterParams {
    fn default() -> Self {
        Self {
            num_leaves: 31,
            objective: Objective::Binary,
            n_estimators: Some(1000),
            metric: Metric::Auc,
            learning_rate: 0.1,
            max_depth: None,
            min_child_samples: 20,
            min_sum_hessian: 1e-3,
            max_bin: 255,
            reg_lambda: 0.0,
            reg_alpha: 0.0,
            subsample: 1.0,
            colsample_bytree: 1.0,
            boosting: BoostingType::Gbdt,
            top_rate: 0.2,
            other_rate: 0.1,
            seed: 42,
        }
    }
}

impl BoosterParams {
    pub fn with_num_leaves(mut self, n: usize) -> Self {
        self.num_leaves = n;
        self
    }

    pub fn with_n_estimators(mut self, n: Option<usize>) -> Self {
        self.n_estimators = n;
        self
    }

    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    pub fn with_min_child_samples(mut self, n: usize) -> Self {
        self.min_child_samples = n;
        self
    }

    pub fn with_boosting(mut self, boosting: BoostingType) -> Self {
        self.boosting = boosting;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Number of boosting rounds actually run.
    ///
    /// `n_estimators` in the parameter map takes precedence over the separately
    /// passed `num_round`, as in the boosting library the script targets. A
    /// disagreement between the two is logged rather than reconciled.
    pub fn resolve_rounds(&self, num_round: usize) -> usize {
        match self.n_estimators {
            Some(n) if n != num_round => {
                warn!(
                    num_round,
                    n_estimators = n,
                    "n_estimators in params overrides num_round"
                );
                n
            }
            Some(n) => n,
            None => num_round,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |name: &str, value: String, reason: &str| {
            Err(FraudBenchError::ConfigError(format!("{} = {}: {}", name, value, reason)))
        };
        if self.num_leaves < 2 {
            return invalid("num_leaves", self.num_leaves.to_string(), "must be at least 2");
        }
        if !(self.learning_rate > 0.0) {
            return invalid("learning_rate", self.learning_rate.to_string(), "must be positive");
        }
        if self.max_bin < 2 || self.max_bin > u16::MAX as usize - 1 {
            return invalid("max_bin", self.max_bin.to_string(), "must be in [2, 65534]");
        }
        for (name, value) in [
            ("subsample", self.subsample),
            ("colsample_bytree", self.colsample_bytree),
            ("top_rate", self.top_rate),
            ("other_rate", self.other_rate),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return invalid(name, value.to_string(), "must be in (0, 1]");
            }
        }
        if self.boosting == BoostingType::Goss && self.top_rate + self.other_rate > 1.0 {
            return invalid(
                "top_rate + other_rate",
                (self.top_rate + self.other_rate).to_string(),
                "must not exceed 1",
            );
        }
        if self.reg_lambda < 0.0 || self.reg_alpha < 0.0 {
            return invalid("reg_lambda/reg_alpha", format!("{}/{}", self.reg_lambda, self.reg_alpha), "must be non-negative");
        }
        Ok(())
    }
}
