//! Synthetic values for missing reserved columns

use super::columns::{ENTITY_ID, ENTITY_TYPE, EVENT_ID, EVENT_TIMESTAMP, LABEL_TIMESTAMP, TIMESTAMP_FORMAT};
use crate::error::{FraudBenchError, Result};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use polars::prelude::*;
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Entity type written when `ENTITY_TYPE` is synthesized
pub const SYNTHETIC_ENTITY_TYPE: &str = "user";

/// Which reserved columns get generated placeholders when the real value is missing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticFillConfig {
    #[serde(rename = "EVENT_ID")]
    pub event_id: bool,
    #[serde(rename = "ENTITY_ID")]
    pub entity_id: bool,
    #[serde(rename = "ENTITY_TYPE")]
    pub entity_type: bool,
    #[serde(rename = "EVENT_TIMESTAMP")]
    pub event_timestamp: bool,
    #[serde(rename = "LABEL_TIMESTAMP")]
    pub label_timestamp: bool,
}

impl Default for SyntheticFillConfig {
    fn default() -> Self {
        Self::all(true)
    }
}

impl SyntheticFillConfig {
    pub fn all(enabled: bool) -> Self {
        Self {
            event_id: enabled,
            entity_id: enabled,
            entity_type: enabled,
            event_timestamp: enabled,
            label_timestamp: enabled,
        }
    }

    /// Build from a column-name mapping; columns not named keep their default (`true`)
    pub fn from_map(map: &HashMap<String, bool>) -> Result<Self> {
        let mut config = Self::default();
        for (column, &enabled) in map {
            config.set(column, enabled)?;
        }
        Ok(config)
    }

    pub fn set(&mut self, column: &str, enabled: bool) -> Result<()> {
        let slot = match column {
            EVENT_ID => &mut self.event_id,
            ENTITY_ID => &mut self.entity_id,
            ENTITY_TYPE => &mut self.entity_type,
            EVENT_TIMESTAMP => &mut self.event_timestamp,
            LABEL_TIMESTAMP => &mut self.label_timestamp,
            other => {
                return Err(FraudBenchError::ConfigError(format!(
                    "'{}' is not a fillable column",
                    other
                )))
            }
        };
        *slot = enabled;
        Ok(())
    }

    pub fn enabled(&self, column: &str) -> bool {
        match column {
            EVENT_ID => self.event_id,
            ENTITY_ID => self.entity_id,
            ENTITY_TYPE => self.entity_type,
            EVENT_TIMESTAMP => self.event_timestamp,
            LABEL_TIMESTAMP => self.label_timestamp,
            _ => false,
        }
    }
}

fn window_start() -> DateTime<Utc> {
    Utc.from_utc_datetime(
        &NaiveDate::from_ymd_opt(2021, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap_or_default(),
    )
}

const WINDOW_SECS: i64 = 365 * 24 * 3600;

fn string_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    match df.column(name) {
        Ok(col) => {
            let col = col.cast(&DataType::String)?;
            Ok(col
                .str()?
                .into_iter()
                .map(|v| v.filter(|s| !s.is_empty()).map(str::to_string))
                .collect())
        }
        Err(_) => Ok(vec![None; df.height()]),
    }
}

fn replace_missing(
    df: &mut DataFrame,
    name: &str,
    mut generate: impl FnMut() -> String,
) -> Result<usize> {
    let mut values = string_values(df, name)?;
    let mut filled = 0;
    for v in values.iter_mut().filter(|v| v.is_none()) {
        *v = Some(generate());
        filled += 1;
    }
    if filled > 0 {
        df.with_column(Series::new(name.into(), values))?;
    }
    Ok(filled)
}

/// Replace null or absent cells of the enabled reserved columns.
///
/// `LABEL_TIMESTAMP` is filled with the latest `EVENT_TIMESTAMP` in the table,
/// so it runs after the event timestamp fill.
pub fn fill_missing(
    df: &mut DataFrame,
    config: &SyntheticFillConfig,
    rng: &mut Xoshiro256PlusPlus,
) -> Result<()> {
    let n_rows = df.height();

    if config.event_id {
        let filled = replace_missing(df, EVENT_ID, || {
            uuid::Builder::from_random_bytes(rng.gen()).into_uuid().to_string()
        })?;
        debug!(column = EVENT_ID, filled, "Synthetic fill");
    }
    if config.entity_id {
        let n_entities = (n_rows / 4).max(1);
        let filled = replace_missing(df, ENTITY_ID, || {
            format!("entity_{}", rng.gen_range(0..n_entities))
        })?;
        debug!(column = ENTITY_ID, filled, "Synthetic fill");
    }
    if config.entity_type {
        let filled = replace_missing(df, ENTITY_TYPE, || SYNTHETIC_ENTITY_TYPE.to_string())?;
        debug!(column = ENTITY_TYPE, filled, "Synthetic fill");
    }
    if config.event_timestamp {
        let start = window_start();
        let filled = replace_missing(df, EVENT_TIMESTAMP, || {
            let offset = chrono::Duration::seconds(rng.gen_range(0..WINDOW_SECS));
            (start + offset).format(TIMESTAMP_FORMAT).to_string()
        })?;
        debug!(column = EVENT_TIMESTAMP, filled, "Synthetic fill");
    }
    if config.label_timestamp {
        // RFC 3339 with a fixed format orders lexicographically
        let latest = string_values(df, EVENT_TIMESTAMP)?
            .into_iter()
            .flatten()
            .max()
            .unwrap_or_else(|| {
                (window_start() + chrono::Duration::seconds(WINDOW_SECS))
                    .format(TIMESTAMP_FORMAT)
                    .to_string()
            });
        let filled = replace_missing(df, LABEL_TIMESTAMP, || latest.clone())?;
        debug!(column = LABEL_TIMESTAMP, filled, "Synthetic fill");
    }
    Ok(())
}
