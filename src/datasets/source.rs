//! Raw source layouts and normalization into the reserved schema

use super::columns::{ENTITY_ID, EVENT_ID, EVENT_LABEL, EVENT_TIMESTAMP, TIMESTAMP_FORMAT};
use super::DatasetKey;
use crate::error::{FraudBenchError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use polars::prelude::*;
use tracing::debug;

/// How the raw label column maps to `EVENT_LABEL`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LabelRule {
    /// Any value > 0.5 is fraud
    Numeric(&'static str),
    /// Fraud when the text equals `positive`
    Equals { column: &'static str, positive: &'static str },
    /// Fraud when the text differs from `negative`
    NotEquals { column: &'static str, negative: &'static str },
}

impl LabelRule {
    pub fn column(&self) -> &'static str {
        match self {
            LabelRule::Numeric(c) => c,
            LabelRule::Equals { column, .. } | LabelRule::NotEquals { column, .. } => column,
        }
    }
}

/// How the raw event time maps to `EVENT_TIMESTAMP`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimestampRule {
    /// Seconds elapsed since a reference date (`epoch` is y, m, d)
    SecondsSince { column: &'static str, epoch: (i32, u32, u32) },
    /// Text parsed with a chrono format; date-only formats resolve to midnight
    Formatted { column: &'static str, format: &'static str },
}

impl TimestampRule {
    pub fn column(&self) -> &'static str {
        match self {
            TimestampRule::SecondsSince { column, .. } | TimestampRule::Formatted { column, .. } => column,
        }
    }
}

/// Where a dataset's downloaded source lives and which of its columns are reserved
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceLayout {
    pub file: &'static str,
    pub label: LabelRule,
    pub event_id: Option<&'static str>,
    pub entity_id: Option<&'static str>,
    pub event_timestamp: Option<TimestampRule>,
}

impl DatasetKey {
    pub fn layout(&self) -> SourceLayout {
        match self {
            DatasetKey::FakeJob => SourceLayout {
                file: "fake_job_postings.csv",
                label: LabelRule::Numeric("fraudulent"),
                event_id: Some("job_id"),
                entity_id: None,
                event_timestamp: None,
            },
            DatasetKey::VehicleLoan => SourceLayout {
                file: "train.csv",
                label: LabelRule::Numeric("loan_default"),
                event_id: Some("UniqueID"),
                entity_id: Some("Employee_code_ID"),
                event_timestamp: Some(TimestampRule::Formatted { column: "DisbursalDate", format: "%d-%m-%y" }),
            },
            DatasetKey::MalUrl => SourceLayout {
                file: "malicious_phish.csv",
                label: LabelRule::NotEquals { column: "type", negative: "benign" },
                event_id: None,
                entity_id: None,
                event_timestamp: None,
            },
            DatasetKey::IeeeCis => SourceLayout {
                file: "train_transaction.csv",
                label: LabelRule::Numeric("isFraud"),
                event_id: Some("TransactionID"),
                entity_id: Some("card1"),
                event_timestamp: Some(TimestampRule::SecondsSince { column: "TransactionDT", epoch: (2017, 12, 1) }),
            },
            DatasetKey::CcFraud => SourceLayout {
                file: "creditcard.csv",
                label: LabelRule::Numeric("Class"),
                event_id: None,
                entity_id: None,
                event_timestamp: Some(TimestampRule::SecondsSince { column: "Time", epoch: (2013, 9, 1) }),
            },
            DatasetKey::FraudEcom => SourceLayout {
                file: "Fraud_Data.csv",
                label: LabelRule::Numeric("class"),
                event_id: None,
                entity_id: Some("user_id"),
                event_timestamp: Some(TimestampRule::Formatted { column: "purchase_time", format: "%Y-%m-%d %H:%M:%S" }),
            },
            DatasetKey::TwitterBot => SourceLayout {
                file: "twitter_human_bots_dataset.csv",
                label: LabelRule::Equals { column: "account_type", positive: "bot" },
                event_id: Some("id"),
                entity_id: None,
                event_timestamp: Some(TimestampRule::Formatted { column: "created_at", format: "%Y-%m-%d %H:%M:%S" }),
            },
            DatasetKey::IpBlock => SourceLayout {
                file: "ip_blocklist.csv",
                label: LabelRule::Numeric("is_ip_malign"),
                event_id: None,
                entity_id: Some("ip"),
                event_timestamp: None,
            },
        }
    }
}

fn source_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column> {
    df.column(name)
        .map_err(|_| FraudBenchError::FeatureNotFound(name.to_string()))
}

fn labels(df: &DataFrame, rule: &LabelRule) -> Result<Vec<Option<i64>>> {
    let col = source_column(df, rule.column())?;
    let out: Vec<Option<i64>> = match rule {
        LabelRule::Numeric(_) => col
            .cast(&DataType::Float64)?
            .f64()?
            .into_iter()
            .map(|v| v.map(|x| i64::from(x > 0.5)))
            .collect(),
        LabelRule::Equals { positive, .. } => col
            .cast(&DataType::String)?
            .str()?
            .into_iter()
            .map(|v| v.map(|s| i64::from(s.trim() == *positive)))
            .collect(),
        LabelRule::NotEquals { negative, .. } => col
            .cast(&DataType::String)?
            .str()?
            .into_iter()
            .map(|v| v.map(|s| i64::from(s.trim() != *negative)))
            .collect(),
    };
    Ok(out)
}

fn parse_timestamp(text: &str, format: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, format)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(text, format)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn timestamps(df: &DataFrame, rule: &TimestampRule) -> Result<Vec<Option<String>>> {
    let col = source_column(df, rule.column())?;
    let render = |dt: NaiveDateTime| dt.and_utc().format(TIMESTAMP_FORMAT).to_string();
    let out: Vec<Option<String>> = match rule {
        TimestampRule::SecondsSince { epoch: (y, m, d), .. } => {
            let base = NaiveDate::from_ymd_opt(*y, *m, *d)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .ok_or_else(|| FraudBenchError::ConfigError(format!("invalid epoch {}-{}-{}", y, m, d)))?;
            col.cast(&DataType::Float64)?
                .f64()?
                .into_iter()
                .map(|v| {
                    v.filter(|s| s.is_finite())
                        .and_then(|s| TimeDelta::try_seconds(s as i64))
                        .and_then(|delta| base.checked_add_signed(delta))
                        .map(&render)
                })
                .collect()
        }
        TimestampRule::Formatted { format, .. } => col
            .cast(&DataType::String)?
            .str()?
            .into_iter()
            .map(|v| v.and_then(|s| parse_timestamp(s.trim(), format)).map(&render))
            .collect(),
    };
    Ok(out)
}

fn move_as_string(df: &mut DataFrame, from: &str, to: &str) -> Result<()> {
    let values: Vec<Option<String>> = source_column(df, from)?
        .cast(&DataType::String)?
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect();
    df.drop_in_place(from)?;
    df.with_column(Series::new(to.into(), values))?;
    Ok(())
}

/// Rename reserved source columns, derive `EVENT_LABEL`, and drop rows whose label is missing
pub fn normalize(mut df: DataFrame, layout: &SourceLayout) -> Result<DataFrame> {
    let n_raw = df.height();

    let label_values = labels(&df, &layout.label)?;
    let event_time = layout
        .event_timestamp
        .as_ref()
        .map(|rule| timestamps(&df, rule))
        .transpose()?;

    df.drop_in_place(layout.label.column())?;
    if let Some(rule) = &layout.event_timestamp {
        df.drop_in_place(rule.column())?;
    }
    if let Some(col) = layout.event_id {
        move_as_string(&mut df, col, EVENT_ID)?;
    }
    if let Some(col) = layout.entity_id {
        move_as_string(&mut df, col, ENTITY_ID)?;
    }
    if let Some(values) = event_time {
        df.with_column(Series::new(EVENT_TIMESTAMP.into(), values))?;
    }

    let keep: BooleanChunked = label_values.iter().map(|v| v.is_some()).collect();
    df.with_column(Series::new(EVENT_LABEL.into(), label_values))?;
    let df = df.filter(&keep)?;

    debug!(rows_in = n_raw, rows_out = df.height(), "Normalized raw source");
    Ok(df)
}

/// Epoch seconds for a reserved-format timestamp
pub fn timestamp_seconds(text: &str) -> Option<f64> {
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| dt.with_timezone(&Utc).timestamp() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_key_has_layout() {
        for key in DatasetKey::ALL {
            let layout = key.layout();
            assert!(layout.file.ends_with(".csv"));
        }
    }

    #[test]
    fn test_normalize_vehicleloan() {
        let raw = df!(
            "UniqueID" => &[420825i64, 537409, 417566],
            "Employee_code_ID" => &[1998i64, 1998, 1441],
            "DisbursalDate" => &["03-08-18", "26-09-18", "not a date"],
            "ltv" => &[89.55, 73.23, 89.63],
            "loan_default" => &[0i64, 1, 0]
        )
        .unwrap();

        let df = normalize(raw, &DatasetKey::VehicleLoan.layout()).unwrap();
        assert!(df.column("UniqueID").is_err());
        assert!(df.column("loan_default").is_err());

        let ts = df.column(EVENT_TIMESTAMP).unwrap().str().unwrap().clone();
        assert_eq!(ts.get(0), Some("2018-08-03T00:00:00Z"));
        assert_eq!(ts.get(2), None);

        let ids = df.column(EVENT_ID).unwrap().str().unwrap().clone();
        assert_eq!(ids.get(1), Some("537409"));

        let labels = df.column(EVENT_LABEL).unwrap().i64().unwrap().clone();
        assert_eq!(labels.get(1), Some(1));
    }

    #[test]
    fn test_normalize_text_labels_and_offsets() {
        let raw = df!(
            "url" => &["a.com", "b.net", "c.org"],
            "type" => &["benign", "phishing", "defacement"]
        )
        .unwrap();
        let df = normalize(raw, &DatasetKey::MalUrl.layout()).unwrap();
        let labels: Vec<Option<i64>> = df.column(EVENT_LABEL).unwrap().i64().unwrap().into_iter().collect();
        assert_eq!(labels, vec![Some(0), Some(1), Some(1)]);

        let raw = df!(
            "Time" => &[0.0, 86400.0],
            "V1" => &[-1.35, 1.19],
            "Class" => &[0i64, 1]
        )
        .unwrap();
        let df = normalize(raw, &DatasetKey::CcFraud.layout()).unwrap();
        let ts = df.column(EVENT_TIMESTAMP).unwrap().str().unwrap().clone();
        assert_eq!(ts.get(1), Some("2013-09-02T00:00:00Z"));
    }

    #[test]
    fn test_rows_without_label_are_dropped() {
        let raw = df!(
            "amount" => &[1.0, 2.0, 3.0],
            "Class" => &[Some(0i64), None, Some(1)]
        )
        .unwrap();
        let df = normalize(raw, &DatasetKey::CcFraud.layout());
        // ccfraud needs its Time column
        assert!(matches!(df, Err(FraudBenchError::FeatureNotFound(ref c)) if c == "Time"));

        let raw = df!(
            "ip" => &["1.1.1.1", "2.2.2.2", "3.3.3.3"],
            "is_ip_malign" => &[Some(0i64), None, Some(1)]
        )
        .unwrap();
        let df = normalize(raw, &DatasetKey::IpBlock.layout()).unwrap();
        assert_eq!(df.height(), 2);
    }

    #[test]
    fn test_timestamp_seconds() {
        assert_eq!(timestamp_seconds("1970-01-01T00:01:00Z"), Some(60.0));
        assert_eq!(timestamp_seconds("yesterday"), None);
    }
}
