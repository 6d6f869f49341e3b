//! Weight-vector layout of the Weighted-Degree feature space
//!
//! The explicit WD feature vector has one slab per string position. Inside a
//! slab, degree k owns a block of `alphabet_size^k` slots, blocks ordered by
//! increasing degree. A k-mer starting at position j lands at
//!
//! `j * w_dim_single_char + (sum of the block sizes of degrees < k) + value`
//!
//! where `value` is the base-`alphabet_size` encoding of the k-mer, built
//! incrementally as `value = value * alphabet_size + symbol`.

use crate::core::{Result, WDError};
use serde::{Deserialize, Serialize};

/// Per-degree offsets and dimensions of the WD weight vector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WdLayout {
    alphabet_size: usize,
    degree: usize,
    string_length: usize,
    /// `w_offsets[k] = alphabet_size^(k+1)`, the size of the degree-(k+1) block
    w_offsets: Vec<usize>,
    w_dim_single_char: usize,
    w_dim: usize,
}

impl WdLayout {
    /// Compute the layout for the given alphabet, degree and string length
    pub fn new(alphabet_size: usize, degree: usize, string_length: usize) -> Result<Self> {
        if alphabet_size == 0 {
            return Err(WDError::InvalidAlphabet(
                "alphabet size must be positive".to_string(),
            ));
        }
        if alphabet_size > usize::from(u8::MAX) + 1 {
            return Err(WDError::InvalidAlphabet(format!(
                "alphabet size {alphabet_size} exceeds the 256 representable symbols"
            )));
        }
        if degree == 0 {
            return Err(WDError::InvalidParameter(
                "Degree must be at least 1".to_string(),
            ));
        }
        if degree > string_length {
            return Err(WDError::DegreeExceedsLength {
                degree,
                string_length,
            });
        }

        let overflow = || WDError::DimensionOverflow {
            alphabet_size,
            degree,
            string_length,
        };

        let mut w_offsets = Vec::with_capacity(degree);
        let mut block = 1usize;
        let mut w_dim_single_char = 0usize;
        for _ in 0..degree {
            block = block.checked_mul(alphabet_size).ok_or_else(overflow)?;
            w_offsets.push(block);
            w_dim_single_char = w_dim_single_char
                .checked_add(block)
                .ok_or_else(overflow)?;
        }
        let w_dim = w_dim_single_char
            .checked_mul(string_length)
            .ok_or_else(overflow)?;

        Ok(Self {
            alphabet_size,
            degree,
            string_length,
            w_offsets,
            w_dim_single_char,
            w_dim,
        })
    }

    pub fn alphabet_size(&self) -> usize {
        self.alphabet_size
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn string_length(&self) -> usize {
        self.string_length
    }

    /// Block size per degree, `alphabet_size^(k+1)` at index k
    pub fn offsets(&self) -> &[usize] {
        &self.w_offsets
    }

    /// Size of one position slab
    pub fn w_dim_single_char(&self) -> usize {
        self.w_dim_single_char
    }

    /// Size of the whole weight vector
    pub fn w_dim(&self) -> usize {
        self.w_dim
    }

    /// Start of the block for k-mers of length `kmer_len` within a slab
    pub fn block_start(&self, kmer_len: usize) -> usize {
        self.w_offsets[..kmer_len.saturating_sub(1)].iter().sum()
    }

    /// Weight-vector slot of `kmer` placed at `position`
    ///
    /// Returns `None` if the k-mer is empty, longer than the degree, runs
    /// past the end of the string, or contains an out-of-alphabet symbol.
    pub fn slot(&self, position: usize, kmer: &[u8]) -> Option<usize> {
        if kmer.is_empty() || kmer.len() > self.degree || position + kmer.len() > self.string_length
        {
            return None;
        }
        let mut value = 0usize;
        for &symbol in kmer {
            let symbol = usize::from(symbol);
            if symbol >= self.alphabet_size {
                return None;
            }
            value = value * self.alphabet_size + symbol;
        }
        Some(position * self.w_dim_single_char + self.block_start(kmer.len()) + value)
    }
}
