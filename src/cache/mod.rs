//! Derived-value cache for the classifier facade
//!
//! Holds the WD weights, normalization constant and feature layout computed
//! from the current hyper-parameters. Each entry remembers the parameters it
//! was computed from and is recomputed when they no longer match.

use crate::core::Result;
use crate::kernel::{normalization_const, wd_weights, WdLayout};

/// Compute-if-stale cache of derived WD quantities
#[derive(Debug, Default, Clone)]
pub struct DerivedCache {
    weights: Option<((usize, usize), Vec<f64>)>,
    normalization: Option<(NormKey, f64)>,
    layout: Option<WdLayout>,
    hits: u64,
    misses: u64,
}

/// Parameters the normalization constant depends on
#[derive(Debug, Clone, PartialEq)]
struct NormKey {
    weights: Vec<f64>,
    string_length: usize,
}

impl DerivedCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default WD weights for `(degree, from_degree)`
    pub fn wd_weights(&mut self, degree: usize, from_degree: usize) -> Result<&[f64]> {
        let key = (degree, from_degree);
        let entry = match self.weights.take() {
            Some((k, w)) if k == key => {
                self.hits += 1;
                (k, w)
            }
            _ => {
                self.misses += 1;
                (key, wd_weights(degree, from_degree)?)
            }
        };
        Ok(&self.weights.insert(entry).1)
    }

    /// Normalization constant for the given weights and string length
    pub fn normalization_const(&mut self, weights: &[f64], string_length: usize) -> f64 {
        let fresh = matches!(
            &self.normalization,
            Some((k, _)) if k.string_length == string_length && k.weights == weights
        );
        if fresh {
            self.hits += 1;
        } else {
            self.misses += 1;
            let value = normalization_const(weights, string_length);
            self.normalization = Some((
                NormKey {
                    weights: weights.to_vec(),
                    string_length,
                },
                value,
            ));
        }
        self.normalization.as_ref().map_or(0.0, |(_, v)| *v)
    }

    /// Feature layout for `(alphabet_size, degree, string_length)`
    pub fn layout(
        &mut self,
        alphabet_size: usize,
        degree: usize,
        string_length: usize,
    ) -> Result<&WdLayout> {
        let layout = match self.layout.take() {
            Some(l)
                if l.alphabet_size() == alphabet_size
                    && l.degree() == degree
                    && l.string_length() == string_length =>
            {
                self.hits += 1;
                l
            }
            _ => {
                self.misses += 1;
                WdLayout::new(alphabet_size, degree, string_length)?
            }
        };
        Ok(self.layout.insert(layout))
    }

    /// Drop every cached value
    pub fn invalidate(&mut self) {
        self.weights = None;
        self.normalization = None;
        self.layout = None;
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
