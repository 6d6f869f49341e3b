//! Dense vector helpers shared by the solver and the model

/// Inner product of two equally sized vectors
pub fn dot(x: &[f64], y: &[f64]) -> f64 {
    debug_assert_eq!(x.len(), y.len());
    x.iter().zip(y).map(|(a, b)| a * b).sum()
}

/// Squared Euclidean norm
pub fn sq_norm(x: &[f64]) -> f64 {
    x.iter().map(|v| v * v).sum()
}

/// `x = (1 - t) * old + t * x`, returning the squared norm of the result
pub fn interpolate(x: &mut [f64], old: &[f64], t: f64) -> f64 {
    debug_assert_eq!(x.len(), old.len());
    let mut sq = 0.0;
    for (xi, &oi) in x.iter_mut().zip(old) {
        *xi = oi * (1.0 - t) + t * *xi;
        sq += *xi * *xi;
    }
    sq
}

/// Sort `keys` ascending, applying the same permutation to `payload`
///
/// NaN keys are ordered last.
pub fn sort_with_payload(keys: &mut [f64], payload: &mut [f64]) {
    debug_assert_eq!(keys.len(), payload.len());
    let mut pairs: Vec<(f64, f64)> = keys.iter().copied().zip(payload.iter().copied()).collect();
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
    for (i, (k, p)) in pairs.into_iter().enumerate() {
        keys[i] = k;
        payload[i] = p;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dot_and_norm() {
        let x = [1.0, 2.0, 3.0];
        let y = [4.0, -5.0, 6.0];
        assert_eq!(dot(&x, &y), 12.0);
        assert_eq!(sq_norm(&x), 14.0);
    }

    #[test]
    fn test_interpolate() {
        let mut x = vec![2.0, 4.0];
        let old = [0.0, 2.0];
        let sq = interpolate(&mut x, &old, 0.5);
        assert_eq!(x, vec![1.0, 3.0]);
        assert_eq!(sq, 10.0);
    }

    #[test]
    fn test_sort_with_payload() {
        let mut keys = vec![3.0, 1.0, 2.0, 0.5];
        let mut payload = vec![30.0, 10.0, 20.0, 5.0];
        sort_with_payload(&mut keys, &mut payload);
        assert_eq!(keys, vec![0.5, 1.0, 2.0, 3.0]);
        assert_eq!(payload, vec![5.0, 10.0, 20.0, 30.0]);
    }
}
