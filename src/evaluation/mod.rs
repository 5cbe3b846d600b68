//! Evaluation of fraud scores against held-out labels

mod counts;
mod metrics;

pub use counts::{value_counts, ValueCounts};
pub use metrics::{average_precision, log_loss, recall_at_fpr, roc_auc};

use crate::error::{FraudBenchError, Result};
use ndarray::Array1;
use serde::Serialize;
use std::fmt;

/// False positive rate budget for the recall metric
pub const FPR_BUDGET: f64 = 0.01;

/// Evaluation summary; metrics are `None` when undefined for the label mix
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub roc_auc: Option<f64>,
    pub pr_auc: Option<f64>,
    pub recall_at_1pct_fpr: Option<f64>,
    pub n_samples: usize,
    pub n_positive: usize,
}

pub fn evaluate(labels: &Array1<f64>, scores: &Array1<f64>) -> Result<EvaluationReport> {
    if labels.len() != scores.len() {
        return Err(FraudBenchError::ShapeError {
            expected: format!("{} scores", labels.len()),
            actual: format!("{} scores", scores.len()),
        });
    }
    Ok(EvaluationReport {
        roc_auc: roc_auc(labels, scores),
        pr_auc: average_precision(labels, scores),
        recall_at_1pct_fpr: recall_at_fpr(labels, scores, FPR_BUDGET),
        n_samples: labels.len(),
        n_positive: labels.iter().filter(|&&y| y > 0.5).count(),
    })
}

fn metric(v: Option<f64>) -> String {
    v.map_or_else(|| "n/a".to_string(), |x| format!("{:.4}", x))
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "roc_score:          {}", metric(self.roc_auc))?;
        writeln!(f, "pr_score:           {}", metric(self.pr_auc))?;
        writeln!(f, "recall_at_1pct_fpr: {}", metric(self.recall_at_1pct_fpr))?;
        write!(f, "samples:            {} ({} fraud)", self.n_samples, self.n_positive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_evaluate() {
        let report = evaluate(&array![0.0, 1.0, 0.0, 1.0], &array![0.2, 0.7, 0.1, 0.9]).unwrap();
        assert_eq!(report.roc_auc, Some(1.0));
        assert_eq!(report.pr_auc, Some(1.0));
        assert_eq!(report.recall_at_1pct_fpr, Some(1.0));
        assert_eq!(report.n_positive, 2);
        assert!(report.to_string().contains("roc_score:          1.0000"));
    }

    #[test]
    fn test_evaluate_length_mismatch() {
        assert!(evaluate(&array![0.0, 1.0], &array![0.5]).is_err());
    }

    #[test]
    fn test_undefined_metrics_render() {
        let report = evaluate(&array![0.0, 0.0], &array![0.5, 0.4]).unwrap();
        assert_eq!(report.roc_auc, None);
        assert!(report.to_string().contains("n/a"));
    }
}
