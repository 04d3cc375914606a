//! Evaluation of exported scikit-learn estimators.
//!
//! Trees use the `tree_` array layout: node `i` is a leaf when
//! `children_left[i] < 0`, otherwise `x[feature[i]] <= threshold[i]` goes left.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    /// Per-node output: one value for regression, class counts for classification.
    pub value: Vec<Vec<f64>>,
}

impl Tree {
    /// Structural checks done once at load so traversal cannot panic or loop.
    pub fn check(&self, n_features: usize, value_width: usize) -> Result<(), String> {
        let n = self.children_left.len();
        if n == 0 {
            return Err("tree has no nodes".to_string());
        }
        if self.children_right.len() != n
            || self.feature.len() != n
            || self.threshold.len() != n
            || self.value.len() != n
        {
            return Err(format!("tree arrays disagree on node count ({n})"));
        }
        for node in 0..n {
            if self.value[node].len() != value_width {
                return Err(format!(
                    "node {node} has {} outputs, expected {value_width}",
                    self.value[node].len()
                ));
            }
            let (left, right) = (self.children_left[node], self.children_right[node]);
            if left < 0 {
                if right >= 0 {
                    return Err(format!("node {node} has only a right child"));
                }
                continue;
            }
            // Children always come after their parent in depth-first export.
            for child in [left, right] {
                if child <= node as i64 || child >= n as i64 {
                    return Err(format!("node {node} has child {child} out of range"));
                }
            }
            let f = self.feature[node];
            if f < 0 || f as usize >= n_features {
                return Err(format!("node {node} splits on feature {f} of {n_features}"));
            }
        }
        Ok(())
    }

    pub fn leaf(&self, x: &[f64]) -> &[f64] {
        let mut node = 0usize;
        loop {
            let left = self.children_left[node];
            if left < 0 {
                return &self.value[node];
            }
            let f = self.feature[node] as usize;
            node = if x[f] <= self.threshold[node] {
                left as usize
            } else {
                self.children_right[node] as usize
            };
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub intercept: f64,
    pub coeffs: Vec<f64>,
}

impl LinearModel {
    pub fn predict(&self, x: &[f64]) -> f64 {
        self.intercept + dot(&self.coeffs, x)
    }
}

/// Multinomial logistic regression: one coefficient row per class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    pub coef: Vec<Vec<f64>>,
    pub intercept: Vec<f64>,
}

impl LogisticModel {
    pub fn check(&self, n_features: usize, n_classes: usize) -> Result<(), String> {
        if self.coef.len() != n_classes || self.intercept.len() != n_classes {
            return Err(format!(
                "logistic model has {} coefficient rows and {} intercepts for {n_classes} classes",
                self.coef.len(),
                self.intercept.len()
            ));
        }
        if let Some(row) = self.coef.iter().find(|r| r.len() != n_features) {
            return Err(format!(
                "coefficient row has {} entries, expected {n_features}",
                row.len()
            ));
        }
        Ok(())
    }

    pub fn predict_proba(&self, x: &[f64]) -> Vec<f64> {
        let logits: Vec<f64> = self
            .coef
            .iter()
            .zip(&self.intercept)
            .map(|(row, b)| b + dot(row, x))
            .collect();
        softmax(&logits)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestModel {
    pub trees: Vec<Tree>,
}

impl ForestModel {
    pub fn check(&self, n_features: usize, value_width: usize) -> Result<(), String> {
        if self.trees.is_empty() {
            return Err("forest has no trees".to_string());
        }
        for (idx, tree) in self.trees.iter().enumerate() {
            tree.check(n_features, value_width)
                .map_err(|e| format!("tree {idx}: {e}"))?;
        }
        Ok(())
    }

    /// Mean of the leaf values.
    pub fn predict(&self, x: &[f64]) -> f64 {
        let total: f64 = self.trees.iter().map(|t| t.leaf(x)[0]).sum();
        total / self.trees.len() as f64
    }

    /// Leaf class counts normalized per tree, then averaged.
    pub fn predict_proba(&self, x: &[f64], n_classes: usize) -> Vec<f64> {
        let mut acc = vec![0.0; n_classes];
        for tree in &self.trees {
            let counts = tree.leaf(x);
            let total: f64 = counts.iter().sum();
            for (slot, c) in acc.iter_mut().zip(counts) {
                *slot += if total > 0.0 {
                    c / total
                } else {
                    1.0 / n_classes as f64
                };
            }
        }
        let n = self.trees.len() as f64;
        acc.iter_mut().for_each(|p| *p /= n);
        acc
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

pub fn softmax(logits: &[f64]) -> Vec<f64> {
    let max = logits.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|l| (l - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.iter().map(|e| e / sum).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// x0 <= 0.5 -> 1.0, else 3.0
    fn stump() -> Tree {
        Tree {
            children_left: vec![1, -1, -1],
            children_right: vec![2, -1, -1],
            feature: vec![0, -2, -2],
            threshold: vec![0.5, -2.0, -2.0],
            value: vec![vec![2.0], vec![1.0], vec![3.0]],
        }
    }

    #[test]
    fn tree_routes_on_threshold_inclusively() {
        let t = stump();
        assert_eq!(t.leaf(&[0.5]), &[1.0]);
        assert_eq!(t.leaf(&[0.51]), &[3.0]);
    }

    #[test]
    fn tree_check_rejects_backward_child() {
        let mut t = stump();
        t.children_left[0] = 0;
        assert!(t.check(1, 1).is_err());
    }

    #[test]
    fn tree_check_rejects_unknown_feature() {
        let t = stump();
        assert!(t.check(0, 1).is_err());
        assert!(t.check(1, 1).is_ok());
    }

    #[test]
    fn forest_averages_trees() {
        let mut other = stump();
        other.value = vec![vec![0.0], vec![5.0], vec![7.0]];
        let forest = ForestModel {
            trees: vec![stump(), other],
        };
        assert_eq!(forest.predict(&[0.0]), 3.0);
        assert_eq!(forest.predict(&[1.0]), 5.0);
    }

    #[test]
    fn forest_proba_normalizes_counts() {
        let t = Tree {
            children_left: vec![-1],
            children_right: vec![-1],
            feature: vec![-2],
            threshold: vec![-2.0],
            value: vec![vec![30.0, 10.0, 10.0]],
        };
        let forest = ForestModel { trees: vec![t] };
        let p = forest.predict_proba(&[], 3);
        assert!((p[0] - 0.6).abs() < 1e-12);
        assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn softmax_is_stable_for_large_logits() {
        let p = softmax(&[1000.0, 1000.0, 999.0]);
        assert!(p.iter().all(|v| v.is_finite()));
        assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!((p[0] - p[1]).abs() < 1e-12);
    }

    #[test]
    fn logistic_check_matches_dimensions() {
        let m = LogisticModel {
            coef: vec![vec![0.1, 0.2]; 3],
            intercept: vec![0.0; 3],
        };
        assert!(m.check(2, 3).is_ok());
        assert!(m.check(3, 3).is_err());
        assert!(m.check(2, 2).is_err());
    }
}
