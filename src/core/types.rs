//! Core type definitions for WD-OCAS

use crate::core::{Result, WDError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Flat array of labels or decision values aligned with example indices
///
/// Training labels must be exactly +1 or -1. Classification output reuses
/// the same container to carry raw decision values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Labels {
    values: Vec<f64>,
}

impl Labels {
    /// Create a label container from raw values
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    /// Create a container of binary labels, rejecting anything other than +1/-1
    pub fn binary(values: Vec<f64>) -> Result<Self> {
        let labels = Self::new(values);
        labels.validate_binary()?;
        Ok(labels)
    }

    /// Check that every value is exactly +1 or -1
    pub fn validate_binary(&self) -> Result<()> {
        match self.values.iter().find(|&&v| v != 1.0 && v != -1.0) {
            Some(&bad) => Err(WDError::InvalidLabel(bad)),
            None => Ok(()),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at index `i`, if present
    pub fn get(&self, i: usize) -> Option<f64> {
        self.values.get(i).copied()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().copied()
    }

    /// Sign of each value as a class label (0 maps to +1)
    pub fn predicted_classes(&self) -> Vec<f64> {
        self.values
            .iter()
            .map(|&v| if v >= 0.0 { 1.0 } else { -1.0 })
            .collect()
    }

    /// Number of positive and negative entries
    pub fn class_counts(&self) -> (usize, usize) {
        let positives = self.values.iter().filter(|&&v| v > 0.0).count();
        (positives, self.values.len() - positives)
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.values
    }
}

impl From<Vec<f64>> for Labels {
    fn from(values: Vec<f64>) -> Self {
        Self::new(values)
    }
}

/// Strategy used to pick the next iterate and the next cut
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Method {
    /// Plain cutting-plane method (SVMperf / BMRM style): the next iterate
    /// is the minimizer of the reduced problem
    CuttingPlane,
    /// OCAS: line search between the best-so-far iterate and the reduced
    /// problem minimizer
    #[default]
    Ocas,
}

/// Configuration for training
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcasConfig {
    /// Misclassification cost for positive examples
    pub c1: f64,
    /// Misclassification cost for negative examples
    pub c2: f64,
    /// Relative tolerance on the gap between primal objective and lower bound
    pub epsilon: f64,
    /// Absolute tolerance on the same gap (0 disables)
    pub tol_abs: f64,
    /// Stop once the primal objective falls below this value
    pub qp_bound: f64,
    /// Maximum number of cuts kept in the buffer
    pub bufsize: usize,
    /// Maximum number of bundle iterations
    pub max_iterations: usize,
    /// Wall-clock limit for training
    pub max_time: Option<Duration>,
    /// Learn a bias term, regularized as one extra constant feature
    pub use_bias: bool,
    /// Iterate update strategy
    pub method: Method,
    /// Maximum k-mer length
    pub degree: usize,
    /// Degree used to derive the default per-degree weights
    pub from_degree: usize,
}

impl Default for OcasConfig {
    fn default() -> Self {
        Self {
            c1: 1.0,
            c2: 1.0,
            epsilon: 0.001,
            tol_abs: 0.0,
            qp_bound: f64::NEG_INFINITY,
            bufsize: 3000,
            max_iterations: 10000,
            max_time: None,
            use_bias: true,
            method: Method::Ocas,
            degree: 6,
            from_degree: 40,
        }
    }
}

impl OcasConfig {
    /// Check the numeric parameters that do not depend on the data
    pub fn validate(&self) -> Result<()> {
        if !(self.c1 > 0.0 && self.c1.is_finite()) || !(self.c2 > 0.0 && self.c2.is_finite()) {
            return Err(WDError::InvalidParameter(format!(
                "C1 and C2 must be positive and finite, got C1={}, C2={}",
                self.c1, self.c2
            )));
        }
        if !(self.epsilon >= 0.0) || !(self.tol_abs >= 0.0) {
            return Err(WDError::InvalidParameter(format!(
                "Tolerances must be non-negative, got epsilon={}, tol_abs={}",
                self.epsilon, self.tol_abs
            )));
        }
        if self.bufsize < 2 {
            return Err(WDError::InvalidParameter(format!(
                "Buffer size must hold at least 2 cuts, got {}",
                self.bufsize
            )));
        }
        if self.max_iterations == 0 {
            return Err(WDError::InvalidParameter(
                "Maximum iterations must be positive".to_string(),
            ));
        }
        if self.degree == 0 {
            return Err(WDError::InvalidParameter(
                "Degree must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Why the bundle loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitStatus {
    /// Relative gap below epsilon
    Converged,
    /// Absolute gap below tol_abs
    AbsoluteTolerance,
    /// Primal objective below qp_bound
    ObjectiveBound,
    /// Iteration cap reached first
    MaxIterations,
    /// Time limit reached first
    MaxTime,
    /// Cut buffer full with every cut still active
    BufferFull,
}

impl ExitStatus {
    /// Whether the reported solution meets one of the requested tolerances
    pub fn is_converged(&self) -> bool {
        matches!(
            self,
            ExitStatus::Converged | ExitStatus::AbsoluteTolerance | ExitStatus::ObjectiveBound
        )
    }
}

/// Objective bookkeeping for one bundle iteration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IterationStats {
    pub iteration: usize,
    /// Regularized hinge-loss objective at the committed iterate
    pub primal_objective: f64,
    /// Cutting-plane lower bound
    pub dual_objective: f64,
    pub cut_count: usize,
    /// Examples with non-positive margin at the committed iterate
    pub training_errors: usize,
}

/// Result of a training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub status: ExitStatus,
    pub iterations: usize,
    pub primal_objective: f64,
    pub dual_objective: f64,
    pub cut_count: usize,
    pub training_errors: usize,
    pub elapsed: Duration,
    pub trace: Vec<IterationStats>,
}

impl TrainingReport {
    pub fn is_converged(&self) -> bool {
        self.status.is_converged()
    }

    /// Gap between primal objective and lower bound, relative to the primal
    pub fn relative_gap(&self) -> f64 {
        if self.primal_objective == 0.0 {
            0.0
        } else {
            (self.primal_objective - self.dual_objective) / self.primal_objective.abs()
        }
    }
}
