//! Core traits for WD-OCAS

use crate::core::{Labels, Result};

/// Source of fixed-alphabet symbol strings
///
/// Symbols are already mapped to `0..alphabet_size()`.
pub trait StringFeatures: Send + Sync {
    /// Number of strings
    fn num_vectors(&self) -> usize;

    /// Symbols of string `i`
    ///
    /// # Panics
    /// Panics if i >= num_vectors()
    fn feature_vector(&self, i: usize) -> &[u8];

    /// Length of string `i`
    fn vector_length(&self, i: usize) -> usize {
        self.feature_vector(i).len()
    }

    /// Number of distinct symbols
    fn alphabet_size(&self) -> usize;

    /// Common length of all strings, or `None` if lengths differ or there are no strings
    fn fixed_length(&self) -> Option<usize> {
        let n = self.num_vectors();
        if n == 0 {
            return None;
        }
        let len = self.vector_length(0);
        (1..n).all(|i| self.vector_length(i) == len).then_some(len)
    }

    fn is_empty(&self) -> bool {
        self.num_vectors() == 0
    }
}

/// A trained linear decision function over symbol strings
pub trait DecisionFunction: Send + Sync {
    /// Decision value for one string
    fn decision_value(&self, symbols: &[u8]) -> Result<f64>;

    /// Decision values for every string of a feature set
    fn decision_values<F: StringFeatures>(&self, features: &F) -> Result<Labels> {
        (0..features.num_vectors())
            .map(|i| self.decision_value(features.feature_vector(i)))
            .collect::<Result<Vec<_>>>()
            .map(Labels::new)
    }

    /// Bias term
    fn bias(&self) -> f64;
}
