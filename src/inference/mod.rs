//! Scoring a table with a trained model

use crate::error::Result;
use crate::training::{ShapeCheck, TrainedModel};
use ndarray::Array1;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Prediction options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictConfig {
    /// Accept a scoring table whose columns differ from the training table
    pub disable_shape_check: bool,
}

impl Default for PredictConfig {
    fn default() -> Self {
        Self { disable_shape_check: true }
    }
}

impl PredictConfig {
    pub fn strict() -> Self {
        Self { disable_shape_check: false }
    }

    fn shape_check(&self) -> ShapeCheck {
        if self.disable_shape_check {
            ShapeCheck::Relaxed
        } else {
            ShapeCheck::Strict
        }
    }
}

/// Fraud probability for every row of `df`, in row order
pub fn predict(model: &TrainedModel, df: &DataFrame, config: &PredictConfig) -> Result<Array1<f64>> {
    if config.disable_shape_check {
        let missing: Vec<&str> = model
            .schema()
            .names()
            .into_iter()
            .filter(|name| df.column(name).is_err())
            .collect();
        if !missing.is_empty() {
            warn!(?missing, "Scoring table lacks training columns, treating them as missing values");
        }
    }

    let x = model.feature_matrix(df, config.shape_check())?;
    let scores = model.booster().predict_proba(&x)?;
    debug!(rows = scores.len(), "Scored table");
    Ok(scores)
}
