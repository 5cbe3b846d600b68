//! LightGBM-style gradient boosting with leaf-wise tree growth
//!
//! - Features are bucketed into at most `max_bin` histogram bins per column
//! - Trees grow best-first until `num_leaves` is reached
//! - NaN is a value of its own: each split learns which side missing rows take
//! - Optional GOSS row sampling

use super::params::{BoosterParams, BoostingType};
use crate::error::{FraudBenchError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

// ---- Binning ----

/// Upper bounds of a feature's bins; value `v` falls in the first bin whose bound is >= `v`
#[derive(Debug, Clone, Serialize, Deserialize)]
struct BinMapper {
    upper_bounds: Vec<f64>,
}

impl BinMapper {
    fn fit(values: impl Iterator<Item = f64>, max_bin: usize) -> Self {
        let mut sorted: Vec<f64> = values.filter(|v| !v.is_nan()).collect();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

        let mut distinct = sorted.clone();
        distinct.dedup();

        let mut upper_bounds: Vec<f64> = if distinct.len() <= max_bin {
            distinct.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect()
        } else {
            let n = sorted.len();
            let mut bounds: Vec<f64> = (1..max_bin).map(|k| sorted[k * n / max_bin]).collect();
            bounds.dedup();
            bounds
        };
        upper_bounds.push(f64::INFINITY);
        Self { upper_bounds }
    }

    fn n_bins(&self) -> usize {
        self.upper_bounds.len()
    }

    /// Bin index; NaN maps to the extra slot `n_bins()`
    fn bin(&self, v: f64) -> u16 {
        if v.is_nan() {
            return self.n_bins() as u16;
        }
        self.upper_bounds.partition_point(|&ub| ub < v) as u16
    }
}

/// Column-major binned copy of the training matrix
struct BinnedMatrix {
    mappers: Vec<BinMapper>,
    columns: Vec<Vec<u16>>,
}

impl BinnedMatrix {
    fn new(x: &Array2<f64>, max_bin: usize) -> Self {
        let (mappers, columns): (Vec<_>, Vec<_>) = (0..x.ncols())
            .into_par_iter()
            .map(|f| {
                let col = x.column(f);
                let mapper = BinMapper::fit(col.iter().copied(), max_bin);
                let binned = col.iter().map(|&v| mapper.bin(v)).collect();
                (mapper, binned)
            })
            .unzip();
        Self { mappers, columns }
    }
}

// ---- Trees ----

#[derive(Debug, Clone, Serialize, Deserialize)]
enum LGBNode {
    Leaf { value: f64 },
    Split {
        feature: usize,
        threshold: f64,
        /// Side taken by NaN
        default_left: bool,
        left: Box<LGBNode>,
        right: Box<LGBNode>,
    },
}

impl LGBNode {
    fn predict(&self, sample: &[f64]) -> f64 {
        match self {
            LGBNode::Leaf { value } => *value,
            LGBNode::Split { feature, threshold, default_left, left, right } => {
                let v = sample[*feature];
                let go_left = if v.is_nan() { *default_left } else { v <= *threshold };
                if go_left {
                    left.predict(sample)
                } else {
                    right.predict(sample)
                }
            }
        }
    }

    fn n_leaves(&self) -> usize {
        match self {
            LGBNode::Leaf { .. } => 1,
            LGBNode::Split { left, right, .. } => left.n_leaves() + right.n_leaves(),
        }
    }
}

fn compute_leaf_weight(g: f64, h: f64, lambda: f64, alpha: f64) -> f64 {
    let g_adj = if g.abs() <= alpha { 0.0 } else { g - alpha * g.signum() };
    -g_adj / (h + lambda)
}

fn compute_gain_single(g: f64, h: f64, lambda: f64) -> f64 {
    g * g / (h + lambda)
}

#[derive(Clone, Copy, Default)]
struct BinStat {
    g: f64,
    h: f64,
    n: usize,
}

impl BinStat {
    fn add(&mut self, other: &BinStat) {
        self.g += other.g;
        self.h += other.h;
        self.n += other.n;
    }

    fn minus(&self, other: &BinStat) -> BinStat {
        BinStat { g: self.g - other.g, h: self.h - other.h, n: self.n - other.n }
    }
}

#[derive(Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    bin: u16,
    threshold: f64,
    default_left: bool,
    gain: f64,
}

/// Best split of one feature over the rows in `indices`
fn find_best_split_for_feature(
    data: &BinnedMatrix, gradients: &[f64], hessians: &[f64],
    indices: &[usize], feature: usize, params: &BoosterParams,
) -> Option<SplitCandidate> {
    let mapper = &data.mappers[feature];
    let n_bins = mapper.n_bins();
    let column = &data.columns[feature];

    let mut hist = vec![BinStat::default(); n_bins + 1];
    for &i in indices {
        let slot = &mut hist[column[i] as usize];
        slot.g += gradients[i];
        slot.h += hessians[i];
        slot.n += 1;
    }
    let missing = hist[n_bins];
    let mut total = BinStat::default();
    for s in &hist {
        total.add(s);
    }

    let lambda = params.reg_lambda;
    let base_score = compute_gain_single(total.g, total.h, lambda);
    let valid = |s: &BinStat| s.n >= params.min_child_samples && s.h >= params.min_sum_hessian;

    let mut best: Option<SplitCandidate> = None;
    let mut cum = BinStat::default();
    // The last bin only splits off the missing rows
    for b in 0..n_bins {
        cum.add(&hist[b]);
        if hist[b].n == 0 {
            continue;
        }
        // missing right, then missing left
        for default_left in [false, true] {
            if default_left && missing.n == 0 {
                continue;
            }
            let mut left = cum;
            if default_left {
                left.add(&missing);
            }
            let right = total.minus(&left);
            if !valid(&left) || !valid(&right) {
                continue;
            }
            let gain = compute_gain_single(left.g, left.h, lambda)
                + compute_gain_single(right.g, right.h, lambda)
                - base_score;
            if gain > best.map_or(0.0, |c| c.gain) {
                best = Some(SplitCandidate {
                    feature,
                    bin: b as u16,
                    threshold: mapper.upper_bounds[b],
                    default_left,
                    gain,
                });
            }
        }
    }
    best
}

fn best_split(
    data: &BinnedMatrix, gradients: &[f64], hessians: &[f64],
    indices: &[usize], features: &[usize], params: &BoosterParams,
) -> Option<SplitCandidate> {
    if indices.len() < params.min_child_samples * 2 {
        return None;
    }
    features
        .par_iter()
        .filter_map(|&f| find_best_split_for_feature(data, gradients, hessians, indices, f, params))
        .max_by(|a, b| {
            a.gain
                .partial_cmp(&b.gain)
                .unwrap_or(Ordering::Equal)
                .then(b.feature.cmp(&a.feature))
        })
}

fn make_leaf(gradients: &[f64], hessians: &[f64], indices: &[usize], params: &BoosterParams) -> LGBNode {
    let g: f64 = indices.iter().map(|&i| gradients[i]).sum();
    let h: f64 = indices.iter().map(|&i| hessians[i]).sum();
    LGBNode::Leaf { value: compute_leaf_weight(g, h, params.reg_lambda, params.reg_alpha) }
}

/// Build one tree using leaf-wise (best-first) growth
fn build_lgb_tree(
    data: &BinnedMatrix, gradients: &[f64], hessians: &[f64],
    indices: Vec<usize>, params: &BoosterParams, rng: &mut Xoshiro256PlusPlus,
) -> LGBNode {
    let n_features = data.columns.len();
    let n_selected = ((n_features as f64 * params.colsample_bytree).ceil() as usize).clamp(1, n_features.max(1));
    let mut features: Vec<usize> = (0..n_features).collect();
    if n_selected < n_features {
        features.shuffle(rng);
        features.truncate(n_selected);
        features.sort_unstable();
    }

    struct PendingSplit {
        node_id: usize,
        split: SplitCandidate,
    }
    impl PartialEq for PendingSplit { fn eq(&self, other: &Self) -> bool { self.split.gain == other.split.gain } }
    impl Eq for PendingSplit {}
    impl PartialOrd for PendingSplit {
        fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
    }
    impl Ord for PendingSplit {
        fn cmp(&self, other: &Self) -> Ordering {
            self.split.gain.partial_cmp(&other.split.gain).unwrap_or(Ordering::Equal)
        }
    }

    enum NodeSlot {
        Leaf(Vec<usize>),
        Split { split: SplitCandidate, left: usize, right: usize },
    }

    let max_depth_limit = params.max_depth.unwrap_or(usize::MAX);
    let mut heap: BinaryHeap<PendingSplit> = BinaryHeap::new();
    if let Some(split) = best_split(data, gradients, hessians, &indices, &features, params) {
        heap.push(PendingSplit { node_id: 0, split });
    }
    let mut nodes: Vec<NodeSlot> = vec![NodeSlot::Leaf(indices)];
    let mut depths: Vec<usize> = vec![0];
    let mut n_leaves = 1usize;

    while n_leaves < params.num_leaves {
        let Some(PendingSplit { node_id, split }) = heap.pop() else { break };
        let depth = depths[node_id];
        if depth >= max_depth_limit {
            continue;
        }

        let rows = match std::mem::replace(&mut nodes[node_id], NodeSlot::Leaf(Vec::new())) {
            NodeSlot::Leaf(rows) => rows,
            slot @ NodeSlot::Split { .. } => {
                nodes[node_id] = slot;
                continue;
            }
        };
        let column = &data.columns[split.feature];
        let missing_bin = data.mappers[split.feature].n_bins() as u16;
        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows.into_iter().partition(|&i| {
            let b = column[i];
            if b == missing_bin { split.default_left } else { b <= split.bin }
        });

        let left_id = nodes.len();
        let right_id = left_id + 1;
        for (child_id, child_rows) in [(left_id, &left_rows), (right_id, &right_rows)] {
            if depth + 1 < max_depth_limit {
                if let Some(child) = best_split(data, gradients, hessians, child_rows, &features, params) {
                    heap.push(PendingSplit { node_id: child_id, split: child });
                }
            }
        }
        nodes.push(NodeSlot::Leaf(left_rows));
        nodes.push(NodeSlot::Leaf(right_rows));
        depths.push(depth + 1);
        depths.push(depth + 1);
        nodes[node_id] = NodeSlot::Split { split, left: left_id, right: right_id };
        n_leaves += 1;
    }

    fn to_node(nodes: &[NodeSlot], idx: usize, g: &[f64], h: &[f64], params: &BoosterParams) -> LGBNode {
        match &nodes[idx] {
            NodeSlot::Leaf(indices) => make_leaf(g, h, indices, params),
            NodeSlot::Split { split, left, right } => LGBNode::Split {
                feature: split.feature,
                threshold: split.threshold,
                default_left: split.default_left,
                left: Box::new(to_node(nodes, *left, g, h, params)),
                right: Box::new(to_node(nodes, *right, g, h, params)),
            },
        }
    }
    to_node(&nodes, 0, gradients, hessians, params)
}

/// GOSS: keep the `top_rate` largest |gradient| rows, sample `other_rate` of the rest
/// and up-weight the sampled rows by `(1 - top_rate) / other_rate`
fn goss_sample(
    gradients: &mut [f64], hessians: &mut [f64],
    top_rate: f64, other_rate: f64, rng: &mut Xoshiro256PlusPlus,
) -> Vec<usize> {
    let n = gradients.len();
    let n_top = ((n as f64 * top_rate).ceil() as usize).min(n);
    let n_other = (n as f64 * other_rate).ceil() as usize;
    let mut sorted: Vec<usize> = (0..n).collect();
    sorted.sort_by(|&a, &b| gradients[b].abs().partial_cmp(&gradients[a].abs()).unwrap_or(Ordering::Equal));

    let mut selected: Vec<usize> = sorted[..n_top].to_vec();
    let mut remaining: Vec<usize> = sorted[n_top..].to_vec();
    remaining.shuffle(rng);
    remaining.truncate(n_other);

    let amplify = (1.0 - top_rate) / other_rate;
    for &i in &remaining {
        gradients[i] *= amplify;
        hessians[i] *= amplify;
    }
    selected.extend(remaining);
    selected
}

fn sigmoid(x: f64) -> f64 { 1.0 / (1.0 + (-x).exp()) }

fn with_row<R>(row: ArrayView1<f64>, f: impl FnOnce(&[f64]) -> R) -> R {
    match row.as_slice() {
        Some(s) => f(s),
        None => f(&row.to_vec()),
    }
}

// ============ Binary classifier ============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LightGBMClassifier {
    pub params: BoosterParams,
    trees: Vec<LGBNode>,
    base_prediction: f64,
    n_features: usize,
}

impl LightGBMClassifier {
    pub fn new(params: BoosterParams) -> Self {
        Self { params, trees: Vec::new(), base_prediction: 0.0, n_features: 0 }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Fit `n_rounds` trees on a 0/1 label
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>, n_rounds: usize) -> Result<()> {
        let n = x.nrows();
        if n == 0 { return Err(FraudBenchError::TrainingError("Empty dataset".into())); }
        if y.len() != n {
            return Err(FraudBenchError::ShapeError {
                expected: format!("{} labels", n),
                actual: format!("{} labels", y.len()),
            });
        }
        if let Some(bad) = y.iter().find(|&&v| v != 0.0 && v != 1.0) {
            return Err(FraudBenchError::TrainingError(format!("label {} is not 0/1", bad)));
        }
        self.params.validate()?;

        let params = &self.params;
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(params.seed);
        let data = BinnedMatrix::new(x, params.max_bin);

        let pos = y.iter().filter(|&&v| v > 0.5).count() as f64;
        let neg = n as f64 - pos;
        let base = (pos.max(1e-10) / neg.max(1e-10)).ln();
        let mut raw = Array1::from_elem(n, base);
        let mut trees = Vec::with_capacity(n_rounds);

        for _ in 0..n_rounds {
            let probs: Vec<f64> = raw.iter().map(|&r| sigmoid(r)).collect();
            let mut gradients: Vec<f64> = probs.iter().zip(y.iter()).map(|(&p, &yi)| p - yi).collect();
            let mut hessians: Vec<f64> = probs.iter().map(|&p| (p * (1.0 - p)).max(1e-16)).collect();

            let indices = match params.boosting {
                BoostingType::Goss => goss_sample(&mut gradients, &mut hessians, params.top_rate, params.other_rate, &mut rng),
                BoostingType::Gbdt if params.subsample < 1.0 => {
                    let k = (n as f64 * params.subsample).ceil() as usize;
                    let mut idx: Vec<usize> = (0..n).collect();
                    idx.shuffle(&mut rng);
                    idx.truncate(k);
                    idx
                }
                BoostingType::Gbdt => (0..n).collect(),
            };

            let tree = build_lgb_tree(&data, &gradients, &hessians, indices, params, &mut rng);
            for (i, row) in x.rows().into_iter().enumerate() {
                raw[i] += params.learning_rate * with_row(row, |s| tree.predict(s));
            }
            trees.push(tree);
        }

        self.base_prediction = base;
        self.trees = trees;
        self.n_features = x.ncols();
        Ok(())
    }

    /// Fraud probability per row, in [0, 1]
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        Ok(self.predict_raw(x)?.mapv(sigmoid))
    }

    fn predict_raw(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if x.ncols() != self.n_features {
            return Err(FraudBenchError::ShapeError {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }
        let lr = self.params.learning_rate;
        let raw: Vec<f64> = x
            .rows()
            .into_iter()
            .map(|row| {
                with_row(row, |s| {
                    self.base_prediction + self.trees.iter().map(|t| lr * t.predict(s)).sum::<f64>()
                })
            })
            .collect();
        Ok(Array1::from_vec(raw))
    }

    /// Leaf count per tree
    #[cfg(test)]
    fn tree_sizes(&self) -> Vec<usize> {
        self.trees.iter().map(LGBNode::n_leaves).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_classification_data() -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_vec((100, 2), (0..200).map(|i| (i as f64) / 100.0).collect()).unwrap();
        let y = Array1::from_vec((0..100).map(|i| if i < 50 { 0.0 } else { 1.0 }).collect());
        (x, y)
    }

    fn small_params() -> BoosterParams {
        BoosterParams::default().with_num_leaves(8).with_min_child_samples(2)
    }

    #[test]
    fn test_bin_mapper() {
        let m = BinMapper::fit([3.0, 1.0, 2.0, f64::NAN, 2.0].into_iter(), 255);
        assert_eq!(m.n_bins(), 3);
        assert_eq!(m.bin(1.0), 0);
        assert_eq!(m.bin(2.0), 1);
        assert_eq!(m.bin(100.0), 2);
        assert_eq!(m.bin(f64::NAN), 3);

        let m = BinMapper::fit((0..1000).map(|i| i as f64), 16);
        assert!(m.n_bins() <= 16);
    }

    #[test]
    fn test_classifier_separates_classes() {
        let (x, y) = make_classification_data();
        let mut model = LightGBMClassifier::new(small_params());
        model.fit(&x, &y, 30).unwrap();
        assert_eq!(model.n_trees(), 30);
        let proba = model.predict_proba(&x).unwrap();
        let acc = proba.iter().zip(y.iter()).filter(|(&p, &t)| (p >= 0.5) == (t > 0.5)).count() as f64 / 100.0;
        assert!(acc > 0.9, "Accuracy too low: {}", acc);
    }

    #[test]
    fn test_proba_in_unit_interval() {
        let (x, y) = make_classification_data();
        let mut model = LightGBMClassifier::new(small_params());
        model.fit(&x, &y, 10).unwrap();
        let proba = model.predict_proba(&x).unwrap();
        assert_eq!(proba.len(), 100);
        assert!(proba.iter().all(|&p| (0.0..=1.0).contains(&p)));
    }

    #[test]
    fn test_num_leaves_bound() {
        let (x, y) = make_classification_data();
        let mut model = LightGBMClassifier::new(small_params().with_num_leaves(4));
        model.fit(&x, &y, 5).unwrap();
        assert!(model.tree_sizes().iter().all(|&n| n <= 4));
    }

    #[test]
    fn test_missing_values_route_consistently() {
        // Positive rows have the feature missing
        let mut values = Vec::new();
        let mut labels = Vec::new();
        for i in 0..80 {
            let positive = i % 2 == 0;
            values.push(if positive { f64::NAN } else { i as f64 });
            labels.push(if positive { 1.0 } else { 0.0 });
        }
        let x = Array2::from_shape_vec((80, 1), values).unwrap();
        let y = Array1::from_vec(labels);
        let mut model = LightGBMClassifier::new(small_params());
        model.fit(&x, &y, 20).unwrap();

        let probe = Array2::from_shape_vec((2, 1), vec![f64::NAN, 3.0]).unwrap();
        let p = model.predict_proba(&probe).unwrap();
        assert!(p[0] > 0.5 && p[1] < 0.5, "{:?}", p);
    }

    #[test]
    fn test_goss() {
        let (x, y) = make_classification_data();
        let mut params = small_params().with_boosting(BoostingType::Goss);
        params.top_rate = 0.3;
        params.other_rate = 0.2;
        let mut model = LightGBMClassifier::new(params);
        model.fit(&x, &y, 10).unwrap();
        assert_eq!(model.predict_proba(&x).unwrap().len(), 100);
    }

    #[test]
    fn test_rejects_non_binary_labels() {
        let (x, _) = make_classification_data();
        let y = Array1::from_elem(100, 2.0);
        let mut model = LightGBMClassifier::new(small_params());
        assert!(matches!(model.fit(&x, &y, 1), Err(FraudBenchError::TrainingError(_))));
    }

    #[test]
    fn test_predict_checks_width() {
        let (x, y) = make_classification_data();
        let mut model = LightGBMClassifier::new(small_params());
        model.fit(&x, &y, 2).unwrap();
        let wide = Array2::zeros((3, 5));
        assert!(matches!(model.predict_proba(&wide), Err(FraudBenchError::ShapeError { .. })));
    }
}
