//! Edge classifier seam.
//!
//! The agglomeration engine treats the classifier as a black box with
//! `learn`, `predict` and `is_trained`. A minimal nearest-centroid
//! implementation is provided so the training loops can run end to end;
//! production models plug in through the same trait.

use crate::{TrainError, TrainResult};
use ndarray::{Array1, ArrayView2};

/// Binary edge classifier over feature vectors.
///
/// `predict` returns the probability in [0, 1] that the edge separates two
/// distinct bodies (label `+1`); values at or below the decision threshold
/// read as "same body" (label `-1`).
pub trait EdgeClassifier {
    /// Fit on a feature matrix and the matching `-1`/`+1` labels
    fn learn(&mut self, features: ArrayView2<'_, f64>, labels: &[i32]) -> TrainResult<()>;

    /// Probability that the edge should be kept (distinct bodies)
    fn predict(&self, feature: &[f64]) -> f64;

    /// True once `learn` has produced a usable model
    fn is_trained(&self) -> bool;
}

/// Nearest-centroid classifier: one mean feature vector per class, with a
/// distance-ratio probability.
#[derive(Debug, Clone, Default)]
pub struct CentroidClassifier {
    merge_centroid: Option<Array1<f64>>,
    keep_centroid: Option<Array1<f64>>,
}

impl CentroidClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    fn class_mean(features: ArrayView2<'_, f64>, labels: &[i32], class: i32) -> Option<Array1<f64>> {
        let mut sum = Array1::<f64>::zeros(features.ncols());
        let mut count = 0usize;
        for (row, &label) in features.rows().into_iter().zip(labels) {
            if label == class {
                sum += &row;
                count += 1;
            }
        }
        if count == 0 {
            None
        } else {
            Some(sum / count as f64)
        }
    }

    fn distance(a: &[f64], b: &Array1<f64>) -> f64 {
        a.iter()
            .zip(b.iter())
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f64>()
            .sqrt()
    }
}

impl EdgeClassifier for CentroidClassifier {
    fn learn(&mut self, features: ArrayView2<'_, f64>, labels: &[i32]) -> TrainResult<()> {
        if features.nrows() != labels.len() {
            return Err(TrainError::Classifier(format!(
                "{} feature rows but {} labels",
                features.nrows(),
                labels.len()
            )));
        }
        if labels.is_empty() {
            return Err(TrainError::Classifier("empty training set".into()));
        }
        self.merge_centroid = Self::class_mean(features, labels, -1);
        self.keep_centroid = Self::class_mean(features, labels, 1);
        Ok(())
    }

    fn predict(&self, feature: &[f64]) -> f64 {
        match (&self.merge_centroid, &self.keep_centroid) {
            (Some(merge), Some(keep)) => {
                let dm = Self::distance(feature, merge);
                let dk = Self::distance(feature, keep);
                if dm + dk == 0.0 {
                    0.5
                } else {
                    dm / (dm + dk)
                }
            }
            (Some(_), None) => 0.0,
            (None, Some(_)) => 1.0,
            (None, None) => 0.5,
        }
    }

    fn is_trained(&self) -> bool {
        self.merge_centroid.is_some() || self.keep_centroid.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_untrained_by_default() {
        let clf = CentroidClassifier::new();
        assert!(!clf.is_trained());
        assert_eq!(clf.predict(&[1.0, 2.0]), 0.5);
    }

    #[test]
    fn test_learn_separates_classes() {
        let x = array![[0.0, 0.0], [0.2, 0.0], [10.0, 10.0], [9.8, 10.0]];
        let y = vec![-1, -1, 1, 1];
        let mut clf = CentroidClassifier::new();
        clf.learn(x.view(), &y).unwrap();

        assert!(clf.is_trained());
        assert!(clf.predict(&[0.1, 0.0]) < 0.5);
        assert!(clf.predict(&[9.9, 10.0]) > 0.5);
    }

    #[test]
    fn test_single_class_saturates() {
        let x = array![[1.0, 1.0], [1.5, 1.0]];
        let mut clf = CentroidClassifier::new();
        clf.learn(x.view(), &[-1, -1]).unwrap();
        assert_eq!(clf.predict(&[0.0, 0.0]), 0.0);

        let mut clf = CentroidClassifier::new();
        clf.learn(x.view(), &[1, 1]).unwrap();
        assert_eq!(clf.predict(&[0.0, 0.0]), 1.0);
    }

    #[test]
    fn test_mismatched_lengths_rejected() {
        let x = array![[1.0, 1.0]];
        let mut clf = CentroidClassifier::new();
        assert!(clf.learn(x.view(), &[-1, 1]).is_err());
    }

    #[test]
    fn test_empty_training_set_rejected() {
        let x = ndarray::Array2::<f64>::zeros((0, 3));
        let mut clf = CentroidClassifier::new();
        assert!(clf.learn(x.view(), &[]).is_err());
    }
}
