//! Integration test: full benchmark run end-to-end

use fraud_bench::datasets::columns::EVENT_LABEL;
use fraud_bench::datasets::{write_csv, DatasetKey, LoaderConfig};
use fraud_bench::inference::PredictConfig;
use fraud_bench::pipeline;
use fraud_bench::training::BoosterParams;
use fraud_bench::{BenchmarkConfig, FraudBenchError};
use polars::prelude::*;
use std::path::Path;
use tempfile::TempDir;

/// Fraud rows sit at the high end of `signal`, so a booster can separate them
fn fixture(key: DatasetKey, n: usize) -> DataFrame {
    let fraud: Vec<bool> = (0..n).map(|i| i % 6 == 0).collect();
    let signal: Vec<f64> = (0..n)
        .map(|i| if fraud[i] { 80.0 + (i % 17) as f64 } else { (i % 61) as f64 })
        .collect();
    let label: Vec<i64> = fraud.iter().map(|&f| i64::from(f)).collect();
    let ids: Vec<i64> = (0..n as i64).map(|i| 100_000 + i).collect();

    let df = match key {
        DatasetKey::FakeJob => {
            let title: Vec<&str> = (0..n).map(|i| ["Engineer", "Clerk", "Data Entry"][i % 3]).collect();
            df!("job_id" => &ids, "title" => &title, "salary_max" => &signal, "fraudulent" => &label)
        }
        DatasetKey::VehicleLoan => {
            let employee: Vec<i64> = (0..n as i64).map(|i| 1_000 + i % 9).collect();
            let date: Vec<String> = (0..n).map(|i| format!("{:02}-{:02}-18", 1 + i % 28, 1 + i % 12)).collect();
            df!(
                "UniqueID" => &ids,
                "disbursed_amount" => &signal,
                "Employee_code_ID" => &employee,
                "DisbursalDate" => &date,
                "loan_default" => &label
            )
        }
        DatasetKey::MalUrl => {
            let url: Vec<String> = (0..n).map(|i| format!("site{}.example/{}", i % 5, i)).collect();
            let kind: Vec<&str> = fraud.iter().map(|&f| if f { "phishing" } else { "benign" }).collect();
            df!("url" => &url, "url_length" => &signal, "type" => &kind)
        }
        DatasetKey::IeeeCis => {
            let dt: Vec<f64> = (0..n).map(|i| 86_400.0 + (i * 600) as f64).collect();
            let card1: Vec<Option<i64>> = (0..n).map(|i| if i % 9 == 0 { None } else { Some(7_000 + (i % 11) as i64) }).collect();
            df!(
                "TransactionID" => &ids,
                "isFraud" => &label,
                "TransactionDT" => &dt,
                "TransactionAmt" => &signal,
                "card1" => &card1
            )
        }
        DatasetKey::CcFraud => {
            let time: Vec<f64> = (0..n).map(|i| (i * 30) as f64).collect();
            let v1: Vec<f64> = (0..n).map(|i| ((i as f64) * 0.7).cos()).collect();
            df!("Time" => &time, "V1" => &v1, "Amount" => &signal, "Class" => &label)
        }
        DatasetKey::FraudEcom => {
            let user: Vec<i64> = (0..n as i64).map(|i| 22_000 + i).collect();
            let when: Vec<String> = (0..n).map(|i| format!("2015-{:02}-{:02} 10:{:02}:00", 1 + i % 12, 1 + i % 28, i % 60)).collect();
            let source: Vec<&str> = (0..n).map(|i| ["SEO", "Ads", "Direct"][i % 3]).collect();
            df!(
                "user_id" => &user,
                "purchase_time" => &when,
                "purchase_value" => &signal,
                "source" => &source,
                "class" => &label
            )
        }
        DatasetKey::TwitterBot => {
            let when: Vec<String> = (0..n).map(|i| format!("2012-{:02}-{:02} 08:00:00", 1 + i % 12, 1 + i % 28)).collect();
            let account: Vec<&str> = fraud.iter().map(|&f| if f { "bot" } else { "human" }).collect();
            df!(
                "id" => &ids,
                "created_at" => &when,
                "followers_count" => &signal,
                "account_type" => &account
            )
        }
        DatasetKey::IpBlock => {
            let ip: Vec<String> = (0..n).map(|i| format!("10.0.{}.{}", i / 250, i % 250)).collect();
            df!("ip" => &ip, "reports" => &signal, "is_ip_malign" => &label)
        }
    };
    df.unwrap()
}

fn stage_raw(data_dir: &Path, key: DatasetKey, n: usize) {
    let raw = data_dir.join(key.as_str()).join("raw");
    std::fs::create_dir_all(&raw).unwrap();
    write_csv(&fixture(key, n), &raw.join(key.layout().file)).unwrap();
}

fn quick_params() -> BoosterParams {
    BoosterParams::default()
        .with_n_estimators(None)
        .with_num_leaves(8)
        .with_min_child_samples(5)
}

#[test]
fn test_ieeecis_run_deletes_download() {
    let tmp = TempDir::new().unwrap();
    stage_raw(tmp.path(), DatasetKey::IeeeCis, 240);

    let loader = LoaderConfig::new(DatasetKey::IeeeCis)
        .with_data_dir(tmp.path())
        .with_delete_downloaded(true);
    let config = BenchmarkConfig::new(DatasetKey::IeeeCis)
        .with_loader(loader.clone())
        .with_params(quick_params())
        .with_num_round(20);

    let mut out = Vec::new();
    let outcome = pipeline::run(&config, &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();

    assert!(text.contains("########## Object key: ##########\nieeecis"));
    assert!(text.contains("########## Train set: ##########"));
    assert!(text.contains("Test set: "));
    assert_eq!(outcome.predictions.len(), outcome.test_rows);
    assert!(outcome.predictions.iter().all(|p| (0.0..=1.0).contains(p)));
    assert_eq!(outcome.rounds, 20);
    assert!(!loader.raw_dir().exists());
    assert!(loader.processed_dir().join("test.csv").exists());
}

#[test]
fn test_vehicleloan_run_reports_after_labels() {
    let tmp = TempDir::new().unwrap();
    stage_raw(tmp.path(), DatasetKey::VehicleLoan, 300);

    let config = BenchmarkConfig::new(DatasetKey::VehicleLoan)
        .with_loader(LoaderConfig::new(DatasetKey::VehicleLoan).with_data_dir(tmp.path()))
        .with_num_round(10);

    let mut out = Vec::new();
    let outcome = pipeline::run(&config, &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();

    // n_estimators in the default parameters outranks the round count
    assert_eq!(outcome.rounds, 1000);

    let key_at = text.find("Object key").unwrap();
    let train_at = text.find("Train set").unwrap();
    let test_at = text.find("Test set").unwrap();
    let scores_at = text.find("Test scores").unwrap();
    let rule_at = text.find("=========\n").unwrap();
    let report_at = text.find("roc_score:").unwrap();
    assert!(key_at < train_at && train_at < test_at && test_at < scores_at);
    assert!(scores_at < rule_at && rule_at < report_at);

    let auc = outcome.report.roc_auc.unwrap();
    assert!(auc > 0.8, "separable fixture scored roc_auc {auc}");
    assert!(tmp.path().join("vehicleloan").join("raw").exists());
}

#[test]
fn test_every_key_scores_every_test_row() {
    for key in DatasetKey::ALL {
        let tmp = TempDir::new().unwrap();
        stage_raw(tmp.path(), key, 120);
        let config = BenchmarkConfig::new(key)
            .with_loader(LoaderConfig::new(key).with_data_dir(tmp.path()))
            .with_params(quick_params());

        let outcome = pipeline::run(&config, &mut std::io::sink())
            .unwrap_or_else(|e| panic!("{key} failed: {e}"));
        assert_eq!(outcome.predictions.len(), outcome.test_rows, "{key}");
        assert_eq!(outcome.report.n_samples, outcome.test_rows, "{key}");
        assert_eq!(outcome.test_label_counts.column, EVENT_LABEL);

        let share: f64 = outcome.train_label_balance.entries.iter().map(|(_, v)| v).sum();
        assert!((share - 1.0).abs() < 1e-9, "{key} balance sums to {share}");
    }
}

#[test]
fn test_rerun_from_processed_cache() {
    let tmp = TempDir::new().unwrap();
    stage_raw(tmp.path(), DatasetKey::CcFraud, 150);
    let loader = LoaderConfig::new(DatasetKey::CcFraud).with_data_dir(tmp.path());
    let config = BenchmarkConfig::new(DatasetKey::CcFraud)
        .with_loader(loader.clone())
        .with_params(quick_params());

    let first = pipeline::run(&config, &mut std::io::sink()).unwrap();
    std::fs::remove_dir_all(loader.raw_dir()).unwrap();

    let cached = config.clone().with_loader(loader.with_load_pre_downloaded(true));
    let second = pipeline::run(&cached, &mut std::io::sink()).unwrap();
    assert_eq!(first.test_rows, second.test_rows);
    assert_eq!(first.report.n_positive, second.report.n_positive);
}

#[test]
fn test_strict_shape_check_rejects_drifted_test_table() {
    let tmp = TempDir::new().unwrap();
    stage_raw(tmp.path(), DatasetKey::CcFraud, 100);
    let mut config = BenchmarkConfig::new(DatasetKey::CcFraud)
        .with_loader(LoaderConfig::new(DatasetKey::CcFraud).with_data_dir(tmp.path()))
        .with_params(quick_params());
    config.predict = PredictConfig::strict();

    // the train table still carries LABEL_TIMESTAMP, the test table does not
    let result = pipeline::run(&config, &mut std::io::sink());
    assert!(matches!(result, Err(FraudBenchError::ShapeError { .. })));
}

#[test]
fn test_missing_dataset_fails_before_output() {
    let tmp = TempDir::new().unwrap();
    let config = BenchmarkConfig::new(DatasetKey::TwitterBot)
        .with_loader(LoaderConfig::new(DatasetKey::TwitterBot).with_data_dir(tmp.path()));
    let mut out = Vec::new();
    let result = pipeline::run(&config, &mut out);
    assert!(matches!(result, Err(FraudBenchError::DatasetUnavailable { .. })));
    assert!(out.is_empty());
}
