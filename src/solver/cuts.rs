//! Cutting-plane buffer
//!
//! Each cut is a sparse subgradient of the hinge loss in WD feature space
//! plus its bias component and constant offset. The store keeps the Gram
//! matrix of all stored cuts up to date as cuts are added and evicted.

/// One cutting plane `b - <a, w>` of the empirical risk
#[derive(Debug, Clone, PartialEq)]
pub struct Cut {
    /// Sorted indices of non-zero entries of `a`
    indices: Vec<usize>,
    values: Vec<f64>,
    /// Component of `a` along the bias dimension
    bias: f64,
    /// Constant term `b`
    offset: f64,
}

impl Cut {
    /// Compress a dense accumulation buffer into a sparse cut
    pub fn from_dense(dense: &[f64], bias: f64, offset: f64) -> Self {
        let (indices, values) = dense
            .iter()
            .enumerate()
            .filter(|&(_, &v)| v != 0.0)
            .map(|(i, &v)| (i, v))
            .unzip();
        Self {
            indices,
            values,
            bias,
            offset,
        }
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Number of non-zero weight-vector entries
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// `<self, dense> + bias * dense_bias`
    pub fn dot_dense(&self, dense: &[f64], dense_bias: f64) -> f64 {
        self.indices
            .iter()
            .zip(&self.values)
            .map(|(&i, &v)| v * dense[i])
            .sum::<f64>()
            + self.bias * dense_bias
    }

    /// Squared norm including the bias component
    pub fn sq_norm(&self) -> f64 {
        self.values.iter().map(|v| v * v).sum::<f64>() + self.bias * self.bias
    }

    /// `dst += scale * a`
    pub fn add_scaled_to(&self, scale: f64, dst: &mut [f64]) {
        for (&i, &v) in self.indices.iter().zip(&self.values) {
            dst[i] += scale * v;
        }
    }
}

/// Bounded buffer of cuts with their Gram matrix
#[derive(Debug)]
pub struct CutStore {
    cuts: Vec<Cut>,
    /// Symmetric, `gram[i][j] = <cut_i, cut_j>`
    gram: Vec<Vec<f64>>,
    /// Consecutive iterations each cut carried zero weight
    idle: Vec<usize>,
    capacity: usize,
}

impl CutStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            cuts: Vec::with_capacity(capacity),
            gram: Vec::with_capacity(capacity),
            idle: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.cuts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cuts.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.cuts.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn cuts(&self) -> &[Cut] {
        &self.cuts
    }

    pub fn gram(&self) -> &[Vec<f64>] {
        &self.gram
    }

    /// Constant terms of all stored cuts
    pub fn offsets(&self) -> Vec<f64> {
        self.cuts.iter().map(Cut::offset).collect()
    }

    /// Store the cut accumulated in `dense`, extending the Gram matrix
    ///
    /// Returns the new cut's index. The new Gram column is computed against
    /// the dense buffer, costing the total number of stored non-zeros.
    /// The caller makes room first: the store must not be full.
    pub fn add_cut(&mut self, dense: &[f64], bias: f64, offset: f64) -> usize {
        debug_assert!(!self.is_full(), "cut buffer full ({} cuts)", self.capacity);

        let cut = Cut::from_dense(dense, bias, offset);
        let new_col: Vec<f64> = self
            .cuts
            .iter()
            .map(|stored| stored.dot_dense(dense, bias))
            .collect();
        let diag = cut.sq_norm();

        for (row, &h) in self.gram.iter_mut().zip(&new_col) {
            row.push(h);
        }
        let mut new_row = new_col;
        new_row.push(diag);
        self.gram.push(new_row);
        self.cuts.push(cut);
        self.idle.push(0);

        self.cuts.len() - 1
    }

    /// Update idle counters from the current cut weights
    pub fn record_activity(&mut self, alpha: &[f64]) {
        for (idle, &a) in self.idle.iter_mut().zip(alpha) {
            if a > 0.0 {
                *idle = 0;
            } else {
                *idle += 1;
            }
        }
    }

    /// Remove the zero-weight cut that has been idle longest
    ///
    /// `alpha` is shrunk in step with the store. Returns the removed index,
    /// or `None` when every cut carries weight.
    pub fn evict_idle(&mut self, alpha: &mut Vec<f64>) -> Option<usize> {
        let victim = self
            .idle
            .iter()
            .enumerate()
            .filter(|&(i, _)| alpha[i] <= 0.0)
            .max_by_key(|&(i, &idle)| (idle, std::cmp::Reverse(i)))
            .map(|(i, _)| i)?;

        self.cuts.remove(victim);
        self.idle.remove(victim);
        self.gram.remove(victim);
        for row in &mut self.gram {
            row.remove(victim);
        }
        alpha.remove(victim);
        Some(victim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_cut_from_dense() {
        let cut = Cut::from_dense(&[0.0, 2.0, 0.0, -1.0], 3.0, 5.0);
        assert_eq!(cut.nnz(), 2);
        assert_eq!(cut.sq_norm(), 4.0 + 1.0 + 9.0);
        assert_eq!(cut.dot_dense(&[1.0, 1.0, 1.0, 1.0], 2.0), 2.0 - 1.0 + 6.0);

        let mut dst = vec![0.0; 4];
        cut.add_scaled_to(0.5, &mut dst);
        assert_eq!(dst, vec![0.0, 1.0, 0.0, -0.5]);
    }

    #[test]
    fn test_gram_matrix() {
        let mut store = CutStore::new(4);
        store.add_cut(&[1.0, 0.0, 2.0], 1.0, 3.0);
        store.add_cut(&[0.0, 3.0, 1.0], -1.0, 2.0);

        let gram = store.gram();
        assert_relative_eq!(gram[0][0], 1.0 + 4.0 + 1.0);
        assert_relative_eq!(gram[1][1], 9.0 + 1.0 + 1.0);
        assert_relative_eq!(gram[0][1], 2.0 - 1.0);
        assert_relative_eq!(gram[1][0], gram[0][1]);
        assert_eq!(store.offsets(), vec![3.0, 2.0]);
    }

    #[test]
    fn test_capacity_respected() {
        let mut store = CutStore::new(2);
        store.add_cut(&[1.0], 0.0, 1.0);
        store.add_cut(&[2.0], 0.0, 1.0);
        assert!(store.is_full());
        assert_eq!(store.len(), 2);
        assert_eq!(store.capacity(), 2);

        // An idle cut frees a slot for the next one
        let mut alpha = vec![0.0, 1.0];
        store.record_activity(&alpha);
        assert_eq!(store.evict_idle(&mut alpha), Some(0));
        assert_eq!(store.add_cut(&[3.0], 0.0, 1.0), 1);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_evict_longest_idle() {
        let mut store = CutStore::new(3);
        store.add_cut(&[1.0, 0.0], 0.0, 1.0);
        store.add_cut(&[0.0, 1.0], 0.0, 1.0);
        store.add_cut(&[1.0, 1.0], 0.0, 1.0);

        let mut alpha = vec![0.0, 0.0, 1.0];
        store.record_activity(&alpha);
        alpha = vec![0.0, 0.5, 0.5];
        store.record_activity(&alpha);

        // Cut 0 has been idle twice, cut 1 was reset by the second round
        let removed = store.evict_idle(&mut alpha);
        assert_eq!(removed, Some(0));
        assert_eq!(store.len(), 2);
        assert_eq!(alpha, vec![0.5, 0.5]);
        assert_eq!(store.gram().len(), 2);
        assert!(store.gram().iter().all(|row| row.len() == 2));
        assert_relative_eq!(store.gram()[0][1], 1.0);
    }

    #[test]
    fn test_no_eviction_when_all_active() {
        let mut store = CutStore::new(2);
        store.add_cut(&[1.0], 0.0, 1.0);
        store.add_cut(&[2.0], 0.0, 1.0);
        let mut alpha = vec![0.3, 0.7];
        store.record_activity(&alpha);
        assert_eq!(store.evict_idle(&mut alpha), None);
        assert_eq!(store.len(), 2);
    }
}
