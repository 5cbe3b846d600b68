//! Model training
//!
//! - [`BoosterParams`] - hyperparameter map (leaves, objective, rounds, metric)
//! - [`FeatureSchema`] - table columns to feature matrix
//! - [`LightGBMClassifier`] - leaf-wise histogram GBDT, binary objective
//! - [`Trainer`] - fits a [`TrainedModel`] on a labelled table

mod booster;
mod features;
mod params;
mod trainer;

pub use booster::LightGBMClassifier;
pub use features::{FeatureColumn, FeatureKind, FeatureSchema, ShapeCheck};
pub use params::{BoosterParams, BoostingType, Metric, Objective};
pub use trainer::{TrainedModel, Trainer};
