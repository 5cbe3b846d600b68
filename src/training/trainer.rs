//! Fits the fraud classifier on a labelled table

use super::booster::LightGBMClassifier;
use super::features::{FeatureSchema, ShapeCheck};
use super::params::BoosterParams;
use crate::error::{FraudBenchError, Result};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

/// A fitted classifier together with the feature schema it was trained on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedModel {
    schema: FeatureSchema,
    booster: LightGBMClassifier,
    rounds: usize,
}

impl TrainedModel {
    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn booster(&self) -> &LightGBMClassifier {
        &self.booster
    }

    /// Boosting rounds actually run
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    pub fn feature_matrix(&self, df: &DataFrame, shape_check: ShapeCheck) -> Result<Array2<f64>> {
        self.schema.to_matrix(df, shape_check)
    }
}

pub struct Trainer;

impl Trainer {
    /// Train on every row of `df`; `target` holds the 0/1 label
    pub fn train(df: &DataFrame, target: &str, params: &BoosterParams, num_round: usize) -> Result<TrainedModel> {
        let start = Instant::now();
        if df.height() == 0 {
            return Err(FraudBenchError::TrainingError("Empty dataset".into()));
        }

        let y = target_vector(df, target)?;
        let schema = FeatureSchema::infer(df, target)?;
        if schema.is_empty() {
            return Err(FraudBenchError::TrainingError("No feature columns".into()));
        }
        let x = schema.to_matrix(df, ShapeCheck::Strict)?;

        let rounds = params.resolve_rounds(num_round);
        let mut booster = LightGBMClassifier::new(params.clone());
        booster.fit(&x, &y, rounds)?;

        let scores = booster.predict_proba(&x)?;
        if let Some(value) = params.metric.compute(&y, &scores) {
            debug!(metric = params.metric.name(), value, "Training metric");
        }

        info!(
            rows = x.nrows(),
            features = x.ncols(),
            rounds,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Model trained"
        );
        Ok(TrainedModel { schema, booster, rounds })
    }
}

fn target_vector(df: &DataFrame, target: &str) -> Result<Array1<f64>> {
    let col = df
        .column(target)
        .map_err(|_| FraudBenchError::FeatureNotFound(target.to_string()))?;
    let values = col
        .cast(&DataType::Float64)?
        .f64()?
        .into_iter()
        .map(|v| match v {
            Some(x) if x == 0.0 || x == 1.0 => Ok(x),
            Some(x) => Err(FraudBenchError::TrainingError(format!("{} has non-binary value {}", target, x))),
            None => Err(FraudBenchError::TrainingError(format!("{} has missing values", target))),
        })
        .collect::<Result<Vec<f64>>>()?;
    Ok(Array1::from_vec(values))
}
