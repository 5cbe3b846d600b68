//! Ranking metrics for binary scores

use ndarray::Array1;
use std::cmp::Ordering;

/// (score, label) pairs sorted by descending score
fn ranked(labels: &Array1<f64>, scores: &Array1<f64>) -> Vec<(f64, bool)> {
    let mut pairs: Vec<(f64, bool)> = scores
        .iter()
        .zip(labels.iter())
        .map(|(&s, &y)| (s, y > 0.5))
        .collect();
    pairs.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
    pairs
}

fn class_totals(labels: &Array1<f64>) -> (usize, usize) {
    let pos = labels.iter().filter(|&&y| y > 0.5).count();
    (pos, labels.len() - pos)
}

/// Cumulative (tp, fp) at each distinct threshold, highest score first
fn threshold_counts(pairs: &[(f64, bool)]) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    let (mut tp, mut fp) = (0, 0);
    for (i, &(score, positive)) in pairs.iter().enumerate() {
        if positive { tp += 1 } else { fp += 1 }
        let last_of_group = pairs.get(i + 1).map_or(true, |next| next.0 != score);
        if last_of_group {
            out.push((tp, fp));
        }
    }
    out
}

/// Area under the ROC curve; tied scores share their average rank.
/// `None` when only one class is present.
pub fn roc_auc(labels: &Array1<f64>, scores: &Array1<f64>) -> Option<f64> {
    let (pos, neg) = class_totals(labels);
    if pos == 0 || neg == 0 || labels.len() != scores.len() {
        return None;
    }

    let mut pairs = ranked(labels, scores);
    pairs.reverse();
    let mut rank_sum_pos = 0.0;
    let mut i = 0;
    while i < pairs.len() {
        let mut j = i;
        while j + 1 < pairs.len() && pairs[j + 1].0 == pairs[i].0 {
            j += 1;
        }
        // ranks are 1-based
        let avg_rank = (i + j) as f64 / 2.0 + 1.0;
        rank_sum_pos += avg_rank * pairs[i..=j].iter().filter(|p| p.1).count() as f64;
        i = j + 1;
    }

    let pos = pos as f64;
    let neg = neg as f64;
    Some((rank_sum_pos - pos * (pos + 1.0) / 2.0) / (pos * neg))
}

/// Average precision: sum over thresholds of precision weighted by the recall gained
pub fn average_precision(labels: &Array1<f64>, scores: &Array1<f64>) -> Option<f64> {
    let (pos, _) = class_totals(labels);
    if pos == 0 || labels.len() != scores.len() {
        return None;
    }
    let pairs = ranked(labels, scores);
    let mut ap = 0.0;
    let mut prev_recall = 0.0;
    for (tp, fp) in threshold_counts(&pairs) {
        let recall = tp as f64 / pos as f64;
        let precision = tp as f64 / (tp + fp) as f64;
        ap += (recall - prev_recall) * precision;
        prev_recall = recall;
    }
    Some(ap)
}

/// Highest true positive rate reachable while the false positive rate stays <= `max_fpr`
pub fn recall_at_fpr(labels: &Array1<f64>, scores: &Array1<f64>, max_fpr: f64) -> Option<f64> {
    let (pos, neg) = class_totals(labels);
    if pos == 0 || neg == 0 || labels.len() != scores.len() {
        return None;
    }
    let pairs = ranked(labels, scores);
    let best = threshold_counts(&pairs)
        .into_iter()
        .filter(|&(_, fp)| fp as f64 / neg as f64 <= max_fpr)
        .map(|(tp, _)| tp as f64 / pos as f64)
        .fold(0.0, f64::max);
    Some(best)
}

/// Mean binary cross-entropy, probabilities clipped away from 0 and 1
pub fn log_loss(labels: &Array1<f64>, scores: &Array1<f64>) -> Option<f64> {
    if labels.is_empty() || labels.len() != scores.len() {
        return None;
    }
    let eps = 1e-15;
    let total: f64 = labels
        .iter()
        .zip(scores.iter())
        .map(|(&y, &p)| {
            let p = p.clamp(eps, 1.0 - eps);
            -(y * p.ln() + (1.0 - y) * (1.0 - p).ln())
        })
        .sum();
    Some(total / labels.len() as f64)
}
