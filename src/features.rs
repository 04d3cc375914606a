use std::collections::HashMap;

use tracing::debug;

/// Added to every ratio denominator so an empty league table (Played = 0) or a
/// zero position never divides by zero.
pub const EPS: f64 = 1e-6;

pub fn safe_div(num: f64, den: f64) -> f64 {
    num / (den + EPS)
}

/// Named feature values in assembly order. Scoring never reads this by
/// position; it is always reindexed against a model's column list first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureRow {
    entries: Vec<(String, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlignedRow {
    pub values: Vec<f64>,
    /// Model columns the row did not supply; scored as zero.
    pub zero_filled: Vec<String>,
    /// Row columns the model does not know; ignored.
    pub dropped: Vec<String>,
}

impl FeatureRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            entries: Vec::with_capacity(cap),
        }
    }

    /// Inserts or overwrites `name`.
    pub fn set(&mut self, name: impl Into<String>, value: f64) {
        let name = name.into();
        if let Some(slot) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.entries.push((name, value));
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lays the row out in exactly `columns` order, zero-filling anything absent.
    pub fn align(&self, columns: &[String]) -> AlignedRow {
        let by_name: HashMap<&str, f64> = self
            .entries
            .iter()
            .map(|(n, v)| (n.as_str(), *v))
            .collect();

        let mut values = Vec::with_capacity(columns.len());
        let mut zero_filled = Vec::new();
        for col in columns {
            match by_name.get(col.as_str()) {
                Some(v) => values.push(*v),
                None => {
                    values.push(0.0);
                    zero_filled.push(col.clone());
                }
            }
        }

        let dropped = self
            .entries
            .iter()
            .filter(|(n, _)| !columns.iter().any(|c| c == n))
            .map(|(n, _)| n.clone())
            .collect::<Vec<_>>();

        if !zero_filled.is_empty() {
            debug!("zero-filled {} model columns: {:?}", zero_filled.len(), zero_filled);
        }
        if !dropped.is_empty() {
            debug!("dropped {} columns unknown to the model: {:?}", dropped.len(), dropped);
        }

        AlignedRow {
            values,
            zero_filled,
            dropped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn align_follows_model_order_not_insert_order() {
        let mut row = FeatureRow::new();
        row.set("b", 2.0);
        row.set("a", 1.0);
        let aligned = row.align(&cols(&["a", "b"]));
        assert_eq!(aligned.values, vec![1.0, 2.0]);
        assert!(aligned.zero_filled.is_empty());
        assert!(aligned.dropped.is_empty());
    }

    #[test]
    fn align_zero_fills_and_drops() {
        let mut row = FeatureRow::new();
        row.set("a", 1.0);
        row.set("extra", 9.0);
        let aligned = row.align(&cols(&["a", "missing"]));
        assert_eq!(aligned.values, vec![1.0, 0.0]);
        assert_eq!(aligned.zero_filled, cols(&["missing"]));
        assert_eq!(aligned.dropped, cols(&["extra"]));
    }

    #[test]
    fn set_overwrites_existing_name() {
        let mut row = FeatureRow::new();
        row.set("a", 1.0);
        row.set("a", 3.0);
        assert_eq!(row.len(), 1);
        assert_eq!(row.get("a"), Some(3.0));
    }

    #[test]
    fn safe_div_survives_zero_denominator() {
        let v = safe_div(0.0, 0.0);
        assert!(v.is_finite());
        assert_eq!(v, 0.0);
        assert!(safe_div(3.0, 0.0).is_finite());
    }
}
