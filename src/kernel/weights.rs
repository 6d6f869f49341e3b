//! Per-degree weighting of the Weighted-Degree kernel

use crate::core::{Result, WDError};

/// Default per-degree weights
///
/// `w[i] = sqrt(2 (from_degree - i) / (from_degree (from_degree + 1)))` for
/// i in 0..degree. Shorter k-mers weigh more; when `from_degree == degree`
/// the squared weights sum to one.
pub fn wd_weights(degree: usize, from_degree: usize) -> Result<Vec<f64>> {
    if degree == 0 {
        return Err(WDError::InvalidParameter(
            "Degree must be at least 1".to_string(),
        ));
    }
    if from_degree < degree {
        return Err(WDError::InvalidParameter(format!(
            "from_degree ({from_degree}) must be at least degree ({degree})"
        )));
    }

    let from = from_degree as f64;
    let denominator = from * (from + 1.0);
    Ok((0..degree)
        .map(|i| (2.0 * (from - i as f64) / denominator).sqrt())
        .collect())
}

/// Check explicitly supplied weights against the degree
pub fn validate_weights(weights: &[f64], degree: usize) -> Result<()> {
    if weights.len() != degree {
        return Err(WDError::InvalidParameter(format!(
            "Expected {degree} degree weights, got {}",
            weights.len()
        )));
    }
    if let Some(bad) = weights.iter().find(|w| !(w.is_finite() && **w >= 0.0)) {
        return Err(WDError::InvalidParameter(format!(
            "Degree weights must be finite and non-negative, got {bad}"
        )));
    }
    if weights.iter().all(|&w| w == 0.0) {
        return Err(WDError::InvalidParameter(
            "At least one degree weight must be positive".to_string(),
        ));
    }
    Ok(())
}

/// `sqrt(sum_i (string_length - i) * weights[i]^2)`
///
/// The squared norm of any string's WD feature vector, so dividing scores by
/// it yields a normalized kernel.
pub fn normalization_const(weights: &[f64], string_length: usize) -> f64 {
    weights
        .iter()
        .enumerate()
        .take(string_length)
        .map(|(i, &w)| (string_length - i) as f64 * w * w)
        .sum::<f64>()
        .sqrt()
}
