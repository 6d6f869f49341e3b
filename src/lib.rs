//! Weighted-Degree string kernel SVM trained with OCAS
//!
//! Based on "Optimized Cutting Plane Algorithm for Large-Scale Risk
//! Minimization" by Vojtěch Franc and Sören Sonnenburg, with the
//! Weighted-Degree kernel of Rätsch and Sonnenburg evaluated in its explicit
//! feature space.

pub mod api;
pub mod cache;
pub mod core;
pub mod data;
pub mod kernel;
pub mod optimizer;
pub mod persistence;
pub mod solver;
pub mod utils;

// Re-export main types for convenience
pub use crate::api::{EvaluationMetrics, WDSvmOcas};
pub use crate::cache::{CacheStats, DerivedCache};
pub use crate::core::traits::*;
pub use crate::core::types::*;
pub use crate::core::{ErrorKind, Result, WDError};
pub use crate::data::{Alphabet, SequenceDataset};
pub use crate::kernel::{WdLayout, WdScorer};
pub use crate::optimizer::{WDModel, WDOptimizer};
pub use crate::persistence::SerializableModel;
pub use crate::solver::{OcasSolution, OcasSolver};

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
