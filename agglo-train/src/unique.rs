//! Deduplicated training rows.
//!
//! Rows are keyed by every column except the trailing label, so the same
//! feature vector observed twice contributes one row and keeps its
//! first-seen label. Insertion order is preserved for reproducible
//! training sets.

use crate::{TrainError, TrainResult};
use ndarray::Array2;
use std::collections::HashSet;

/// Set of feature rows, each carrying the edge label as its final column.
#[derive(Debug, Clone, Default)]
pub struct UniqueRowSet {
    rows: Vec<Vec<f64>>,
    seen: HashSet<Vec<u64>>,
}

impl UniqueRowSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a row whose final column is the label. Returns true when the
    /// feature prefix was new.
    pub fn insert(&mut self, row: Vec<f64>) -> bool {
        if row.is_empty() {
            return false;
        }
        let key: Vec<u64> = row[..row.len() - 1].iter().map(|v| v.to_bits()).collect();
        if self.seen.insert(key) {
            self.rows.push(row);
            true
        } else {
            false
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn clear(&mut self) {
        self.rows.clear();
        self.seen.clear();
    }

    /// Rows in insertion order
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Split into a feature matrix and the label column.
    pub fn feature_label_matrix(&self) -> TrainResult<(Array2<f64>, Vec<i32>)> {
        if self.rows.is_empty() {
            return Ok((Array2::zeros((0, 0)), Vec::new()));
        }
        let width = self.rows[0].len() - 1;
        let mut flat = Vec::with_capacity(self.rows.len() * width);
        let mut labels = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            if row.len() != width + 1 {
                return Err(TrainError::Classifier(format!(
                    "inconsistent row width: {} vs {}",
                    row.len(),
                    width + 1
                )));
            }
            flat.extend_from_slice(&row[..width]);
            labels.push(row[width] as i32);
        }
        let features = Array2::from_shape_vec((self.rows.len(), width), flat)
            .map_err(|e| TrainError::Classifier(e.to_string()))?;
        Ok((features, labels))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_prefix_discarded() {
        let mut set = UniqueRowSet::new();
        assert!(set.insert(vec![1.0, 2.0, -1.0]));
        assert!(!set.insert(vec![1.0, 2.0, 1.0]));
        assert_eq!(set.len(), 1);
        // first-seen label wins
        assert_eq!(set.rows()[0][2], -1.0);
    }

    #[test]
    fn test_distinct_prefixes_kept() {
        let mut set = UniqueRowSet::new();
        set.insert(vec![1.0, 2.0, -1.0]);
        set.insert(vec![1.0, 2.5, 1.0]);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_feature_label_split() {
        let mut set = UniqueRowSet::new();
        set.insert(vec![1.0, 2.0, -1.0]);
        set.insert(vec![3.0, 4.0, 1.0]);
        let (x, y) = set.feature_label_matrix().unwrap();
        assert_eq!(x.dim(), (2, 2));
        assert_eq!(x[[1, 0]], 3.0);
        assert_eq!(y, vec![-1, 1]);
    }

    #[test]
    fn test_empty_set_yields_empty_matrix() {
        let set = UniqueRowSet::new();
        let (x, y) = set.feature_label_matrix().unwrap();
        assert_eq!(x.nrows(), 0);
        assert!(y.is_empty());
    }

    #[test]
    fn test_clear_resets_dedup() {
        let mut set = UniqueRowSet::new();
        set.insert(vec![1.0, -1.0]);
        set.clear();
        assert!(set.is_empty());
        assert!(set.insert(vec![1.0, -1.0]));
    }
}
