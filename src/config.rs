//! Benchmark run configuration

use crate::datasets::{DatasetKey, LoaderConfig};
use crate::error::Result;
use crate::inference::PredictConfig;
use crate::training::BoosterParams;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Everything a single benchmark run needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkConfig {
    pub loader: LoaderConfig,
    pub params: BoosterParams,
    /// Round count passed alongside `params`; `params.n_estimators` wins when both are set
    pub num_round: usize,
    pub predict: PredictConfig,
    /// Rows shown in table previews
    pub preview_rows: usize,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            loader: LoaderConfig::default(),
            params: BoosterParams::default(),
            num_round: 10,
            predict: PredictConfig::default(),
            preview_rows: 5,
        }
    }
}

impl BenchmarkConfig {
    pub fn new(key: DatasetKey) -> Self {
        Self { loader: LoaderConfig::new(key), ..Default::default() }
    }

    pub fn with_loader(mut self, loader: LoaderConfig) -> Self {
        self.loader = loader;
        self
    }

    pub fn with_params(mut self, params: BoosterParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_num_round(mut self, n: usize) -> Self {
        self.num_round = n;
        self
    }

    /// Load from a JSON file; absent fields take their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_script_defaults() {
        let config = BenchmarkConfig::default();
        assert_eq!(config.loader.key, DatasetKey::VehicleLoan);
        assert!(!config.loader.load_pre_downloaded);
        assert!(!config.loader.delete_downloaded);
        assert_eq!(config.num_round, 10);
        assert!(config.predict.disable_shape_check);
    }

    #[test]
    fn test_partial_json() {
        let json = r#"{
            "loader": {"key": "ieeecis", "delete_downloaded": true,
                       "add_random_values_if_real_na": {"ENTITY_TYPE": false}},
            "num_round": 25
        }"#;
        let config: BenchmarkConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.loader.key, DatasetKey::IeeeCis);
        assert!(config.loader.delete_downloaded);
        assert!(!config.loader.add_random_values_if_real_na.entity_type);
        assert!(config.loader.add_random_values_if_real_na.event_id);
        assert_eq!(config.num_round, 25);
        assert_eq!(config.params.num_leaves, 31);
    }

    #[test]
    fn test_save_load() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bench.json");
        let config = BenchmarkConfig::new(DatasetKey::MalUrl).with_num_round(3);
        config.save(&path).unwrap();
        assert_eq!(BenchmarkConfig::load(&path).unwrap(), config);
    }
}
