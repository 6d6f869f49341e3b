//! High-level API for WD string classification
//!
//! [`WDSvmOcas`] binds a feature set and labels, owns the hyper-parameters
//! and keeps the last trained model for inference.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use wdocas::api::WDSvmOcas;
//! use wdocas::data::{Alphabet, SequenceDataset};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let train = SequenceDataset::from_file("train.seq", Alphabet::Dna)?;
//! let mut svm = WDSvmOcas::from_dataset(train)
//!     .with_c(1.0)
//!     .with_degree(8, 8);
//! let report = svm.train(None)?;
//! println!("converged: {}", report.is_converged());
//!
//! let test = SequenceDataset::from_file("test.seq", Alphabet::Dna)?;
//! let metrics = svm.evaluate(&test, test.labels())?;
//! println!("Accuracy: {:.2}%", metrics.accuracy() * 100.0);
//! # Ok(())
//! # }
//! ```

use crate::cache::{CacheStats, DerivedCache};
use crate::core::{
    DecisionFunction, Labels, Method, OcasConfig, Result, StringFeatures, TrainingReport, WDError,
};
use crate::data::SequenceDataset;
use crate::kernel::{validate_weights, WdLayout, WdScorer};
use crate::optimizer::{common_length, WDModel, WDOptimizer};
use std::time::Duration;

/// WD string-kernel SVM trained with OCAS
pub struct WDSvmOcas<F: StringFeatures = SequenceDataset> {
    config: OcasConfig,
    features: Option<F>,
    labels: Option<Labels>,
    explicit_weights: Option<Vec<f64>>,
    cache: DerivedCache,
    model: Option<WDModel>,
    last_report: Option<TrainingReport>,
}

impl WDSvmOcas<SequenceDataset> {
    /// Create a classifier with default parameters and no data
    pub fn new() -> Self {
        Self::from_config(OcasConfig::default())
    }

    /// Create a classifier bound to a labeled sequence set
    pub fn from_dataset(dataset: SequenceDataset) -> Self {
        let labels = dataset.labels().clone();
        Self::new().with_features(dataset).with_labels(labels)
    }
}

impl Default for WDSvmOcas<SequenceDataset> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: StringFeatures> WDSvmOcas<F> {
    /// Create a classifier from an explicit configuration
    pub fn from_config(config: OcasConfig) -> Self {
        Self {
            config,
            features: None,
            labels: None,
            explicit_weights: None,
            cache: DerivedCache::new(),
            model: None,
            last_report: None,
        }
    }

    /// Set the same cost C for both classes
    pub fn with_c(mut self, c: f64) -> Self {
        self.set_c(c, c);
        self
    }

    /// Set separate costs for positive (C1) and negative (C2) examples
    pub fn with_c1_c2(mut self, c1: f64, c2: f64) -> Self {
        self.set_c(c1, c2);
        self
    }

    /// Set the relative convergence tolerance
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.config.epsilon = epsilon;
        self
    }

    pub fn with_bufsize(mut self, bufsize: usize) -> Self {
        self.config.bufsize = bufsize;
        self
    }

    pub fn with_bias(mut self, enabled: bool) -> Self {
        self.set_bias_enabled(enabled);
        self
    }

    pub fn with_degree(mut self, degree: usize, from_degree: usize) -> Self {
        self.set_degree(degree, from_degree);
        self
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.config.method = method;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iterations = max_iterations;
        self
    }

    /// Set a wall-clock limit for training
    pub fn with_max_time(mut self, max_time: Duration) -> Self {
        self.config.max_time = Some(max_time);
        self
    }

    pub fn with_features(mut self, features: F) -> Self {
        self.set_features(features);
        self
    }

    pub fn with_labels(mut self, labels: Labels) -> Self {
        self.set_labels(labels);
        self
    }

    pub fn config(&self) -> &OcasConfig {
        &self.config
    }

    pub fn set_c(&mut self, c1: f64, c2: f64) {
        self.config.c1 = c1;
        self.config.c2 = c2;
    }

    pub fn get_c1(&self) -> f64 {
        self.config.c1
    }

    pub fn get_c2(&self) -> f64 {
        self.config.c2
    }

    pub fn set_epsilon(&mut self, epsilon: f64) {
        self.config.epsilon = epsilon;
    }

    pub fn epsilon(&self) -> f64 {
        self.config.epsilon
    }

    pub fn set_bias_enabled(&mut self, enabled: bool) {
        self.config.use_bias = enabled;
        self.cache.invalidate();
    }

    pub fn bias_enabled(&self) -> bool {
        self.config.use_bias
    }

    pub fn set_bufsize(&mut self, bufsize: usize) {
        self.config.bufsize = bufsize;
    }

    pub fn bufsize(&self) -> usize {
        self.config.bufsize
    }

    pub fn set_method(&mut self, method: Method) {
        self.config.method = method;
    }

    /// Set the maximum k-mer length and the degree the default weights derive from
    ///
    /// Drops explicitly set weights.
    pub fn set_degree(&mut self, degree: usize, from_degree: usize) {
        self.config.degree = degree;
        self.config.from_degree = from_degree;
        self.explicit_weights = None;
        self.cache.invalidate();
    }

    pub fn get_degree(&self) -> usize {
        self.config.degree
    }

    pub fn get_from_degree(&self) -> usize {
        self.config.from_degree
    }

    /// Replace the default per-degree weights; needs one weight per degree
    pub fn set_wd_weights(&mut self, weights: Vec<f64>) -> Result<()> {
        validate_weights(&weights, self.config.degree)?;
        self.explicit_weights = Some(weights);
        self.cache.invalidate();
        Ok(())
    }

    /// Per-degree weights, computed from the degree parameters unless set explicitly
    pub fn wd_weights(&mut self) -> Result<&[f64]> {
        match &self.explicit_weights {
            Some(weights) => Ok(weights.as_slice()),
            None => self
                .cache
                .wd_weights(self.config.degree, self.config.from_degree),
        }
    }

    /// Common length of the bound strings
    pub fn string_length(&self) -> Result<usize> {
        let features = self.features.as_ref().ok_or(WDError::NoFeatures)?;
        common_length(features)
    }

    /// Normalization constant for the current weights and bound strings
    pub fn normalization_const(&mut self) -> Result<f64> {
        let string_length = self.string_length()?;
        let weights = self.wd_weights()?.to_vec();
        Ok(self.cache.normalization_const(&weights, string_length))
    }

    /// Feature layout for the current degree and bound strings
    pub fn layout(&mut self) -> Result<&WdLayout> {
        let string_length = self.string_length()?;
        let alphabet_size = self
            .features
            .as_ref()
            .map(|f| f.alphabet_size())
            .ok_or(WDError::NoFeatures)?;
        self.cache
            .layout(alphabet_size, self.config.degree, string_length)
    }

    /// Bind a new feature set, releasing the previous one
    pub fn set_features(&mut self, features: F) {
        self.features = Some(features);
        self.cache.invalidate();
    }

    pub fn set_labels(&mut self, labels: Labels) {
        self.labels = Some(labels);
    }

    pub fn features(&self) -> Option<&F> {
        self.features.as_ref()
    }

    pub fn labels(&self) -> Option<&Labels> {
        self.labels.as_ref()
    }

    /// Train on the bound data, or on `data` after binding it
    ///
    /// On error the previously trained model is kept.
    pub fn train(&mut self, data: Option<F>) -> Result<TrainingReport> {
        if let Some(features) = data {
            self.set_features(features);
        }
        if self.features.is_none() {
            return Err(WDError::NoFeatures);
        }
        if self.labels.is_none() {
            return Err(WDError::NoLabels);
        }

        let weights = self.wd_weights()?.to_vec();
        let layout = self.layout()?.clone();
        let scorer = WdScorer::new(layout, weights)?;

        let features = self.features.as_ref().ok_or(WDError::NoFeatures)?;
        let labels = self.labels.as_ref().ok_or(WDError::NoLabels)?;
        let optimizer = WDOptimizer::new(self.config.clone());
        let (model, report) = optimizer.train(features, labels, scorer)?;

        self.model = Some(model);
        self.last_report = Some(report.clone());
        Ok(report)
    }

    /// Decision values for every string of `data`
    pub fn classify<D: StringFeatures>(&self, data: &D) -> Result<Labels> {
        self.trained()?.decision_values(data)
    }

    /// Decision values for the bound feature set
    pub fn classify_all(&self) -> Result<Labels> {
        let features = self.features.as_ref().ok_or(WDError::NoFeatures)?;
        self.classify(features)
    }

    /// Decision value of bound example `index`
    pub fn classify_example(&self, index: usize) -> Result<f64> {
        let model = self.trained()?;
        let features = self.features.as_ref().ok_or(WDError::NoFeatures)?;
        if index >= features.num_vectors() {
            return Err(WDError::IndexOutOfRange {
                index,
                len: features.num_vectors(),
            });
        }
        model.decision_value(features.feature_vector(index))
    }

    /// Confusion-matrix metrics of the model on `data`
    pub fn evaluate<D: StringFeatures>(&self, data: &D, truth: &Labels) -> Result<EvaluationMetrics> {
        let values = self.classify(data)?;
        EvaluationMetrics::from_decision_values(&values, truth)
    }

    pub fn model(&self) -> Option<&WDModel> {
        self.model.as_ref()
    }

    pub fn into_model(self) -> Option<WDModel> {
        self.model
    }

    pub fn last_report(&self) -> Option<&TrainingReport> {
        self.last_report.as_ref()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    fn trained(&self) -> Result<&WDModel> {
        self.model.as_ref().ok_or(WDError::ModelNotTrained)
    }
}

/// Detailed evaluation metrics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationMetrics {
    pub true_positives: usize,
    pub true_negatives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
}

impl EvaluationMetrics {
    pub fn new(tp: usize, tn: usize, fp: usize, fn_: usize) -> Self {
        Self {
            true_positives: tp,
            true_negatives: tn,
            false_positives: fp,
            false_negatives: fn_,
        }
    }

    /// Count outcomes of decision values against true labels (value >= 0 is positive)
    pub fn from_decision_values(values: &Labels, truth: &Labels) -> Result<Self> {
        if values.len() != truth.len() {
            return Err(WDError::LabelCountMismatch {
                features: values.len(),
                labels: truth.len(),
            });
        }

        let mut metrics = Self::new(0, 0, 0, 0);
        for (value, actual) in values.iter().zip(truth.iter()) {
            match (value >= 0.0, actual > 0.0) {
                (true, true) => metrics.true_positives += 1,
                (false, false) => metrics.true_negatives += 1,
                (true, false) => metrics.false_positives += 1,
                (false, true) => metrics.false_negatives += 1,
            }
        }
        Ok(metrics)
    }

    pub fn total(&self) -> usize {
        self.true_positives + self.true_negatives + self.false_positives + self.false_negatives
    }

    /// Calculate accuracy: (TP + TN) / (TP + TN + FP + FN)
    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            (self.true_positives + self.true_negatives) as f64 / total as f64
        }
    }

    /// Calculate precision: TP / (TP + FP)
    pub fn precision(&self) -> f64 {
        let denominator = self.true_positives + self.false_positives;
        if denominator == 0 {
            0.0
        } else {
            self.true_positives as f64 / denominator as f64
        }
    }

    /// Calculate recall (sensitivity): TP / (TP + FN)
    pub fn recall(&self) -> f64 {
        let denominator = self.true_positives + self.false_negatives;
        if denominator == 0 {
            0.0
        } else {
            self.true_positives as f64 / denominator as f64
        }
    }

    pub fn f1_score(&self) -> f64 {
        let p = self.precision();
        let r = self.recall();
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * (p * r) / (p + r)
        }
    }

    /// Calculate specificity: TN / (TN + FP)
    pub fn specificity(&self) -> f64 {
        let denominator = self.true_negatives + self.false_positives;
        if denominator == 0 {
            0.0
        } else {
            self.true_negatives as f64 / denominator as f64
        }
    }
}

/// Convenience functions for file-based workflows
pub mod quick {
    use super::*;
    use crate::data::Alphabet;
    use std::path::Path;

    /// Train on a sequence file with default parameters
    pub fn train_file<P: AsRef<Path>>(path: P, alphabet: Alphabet) -> Result<WDSvmOcas> {
        let dataset = SequenceDataset::from_file(path, alphabet)?;
        let mut svm = WDSvmOcas::from_dataset(dataset);
        svm.train(None)?;
        Ok(svm)
    }

    /// Train on one file and report test metrics on another
    pub fn evaluate_split<P1: AsRef<Path>, P2: AsRef<Path>>(
        train_path: P1,
        test_path: P2,
        alphabet: Alphabet,
    ) -> Result<EvaluationMetrics> {
        let svm = train_file(train_path, alphabet)?;
        let test = SequenceDataset::from_file(test_path, alphabet)?;
        svm.evaluate(&test, test.labels())
    }
}
