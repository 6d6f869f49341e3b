//! Weighted-Degree scoring against an explicit weight vector
//!
//! Every routine here walks the same (position, degree) slots in the same
//! order, so training-time outputs, cut construction and inference agree
//! exactly. Cost is O(string_length * degree) per string, independent of the
//! size of the feature space.

use crate::core::{Result, WDError};
use crate::kernel::{normalization_const, validate_weights, WdLayout};
use serde::{Deserialize, Serialize};

/// Linear scorer over the implicit WD feature map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WdScorer {
    layout: WdLayout,
    wd_weights: Vec<f64>,
    normalization_const: f64,
}

impl WdScorer {
    /// Create a scorer; `wd_weights` must have one entry per degree
    pub fn new(layout: WdLayout, wd_weights: Vec<f64>) -> Result<Self> {
        validate_weights(&wd_weights, layout.degree())?;
        let normalization_const = normalization_const(&wd_weights, layout.string_length());
        Ok(Self {
            layout,
            wd_weights,
            normalization_const,
        })
    }

    pub fn layout(&self) -> &WdLayout {
        &self.layout
    }

    pub fn wd_weights(&self) -> &[f64] {
        &self.wd_weights
    }

    pub fn normalization_const(&self) -> f64 {
        self.normalization_const
    }

    /// Check that a string can be scored with this layout
    pub fn validate(&self, symbols: &[u8]) -> Result<()> {
        if symbols.len() != self.layout.string_length() {
            return Err(WDError::LengthMismatch {
                expected: self.layout.string_length(),
                actual: symbols.len(),
            });
        }
        let alphabet_size = self.layout.alphabet_size();
        match symbols.iter().find(|&&s| usize::from(s) >= alphabet_size) {
            Some(&symbol) => Err(WDError::SymbolOutOfRange {
                symbol,
                alphabet_size,
            }),
            None => Ok(()),
        }
    }

    /// Normalized linear score `<w, phi(symbols)>`, without bias
    ///
    /// The string must already satisfy [`WdScorer::validate`].
    pub fn score(&self, symbols: &[u8], w: &[f64]) -> f64 {
        let string_length = self.layout.string_length();
        let alphabet_size = self.layout.alphabet_size();
        let degree = self.layout.degree();
        let offsets = self.layout.offsets();
        let single = self.layout.w_dim_single_char();

        let mut sum = 0.0;
        for j in 0..string_length {
            let mut offs = single * j;
            let mut val = 0usize;
            for k in 0..degree.min(string_length - j) {
                val = val * alphabet_size + usize::from(symbols[j + k]);
                sum += self.wd_weights[k] * w[offs + val];
                offs += offsets[k];
            }
        }
        sum / self.normalization_const
    }

    /// Validating variant of [`WdScorer::score`]
    pub fn score_checked(&self, symbols: &[u8], w: &[f64]) -> Result<f64> {
        self.validate(symbols)?;
        Ok(self.score(symbols, w))
    }

    /// Add `scale * phi(symbols)` restricted to one position slab
    ///
    /// `slab` is the `w_dim_single_char`-sized window of the weight vector
    /// belonging to `position`.
    pub fn accumulate_position(&self, symbols: &[u8], position: usize, scale: f64, slab: &mut [f64]) {
        let string_length = self.layout.string_length();
        let alphabet_size = self.layout.alphabet_size();
        let offsets = self.layout.offsets();
        let scale = scale / self.normalization_const;

        let mut offs = 0usize;
        let mut val = 0usize;
        for k in 0..self.layout.degree().min(string_length - position) {
            val = val * alphabet_size + usize::from(symbols[position + k]);
            slab[offs + val] += scale * self.wd_weights[k];
            offs += offsets[k];
        }
    }

    /// Add `scale * phi(symbols)` into a full-size dense vector
    pub fn accumulate(&self, symbols: &[u8], scale: f64, dst: &mut [f64]) {
        let single = self.layout.w_dim_single_char();
        for (j, slab) in dst.chunks_mut(single).enumerate() {
            self.accumulate_position(symbols, j, scale, slab);
        }
    }
}
