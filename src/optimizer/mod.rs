//! Training entry point and the trained model
//!
//! [`WDOptimizer`] checks the training data against the configuration,
//! derives the scorer and runs the bundle solver. The result is a [`WDModel`]
//! that owns everything needed to score new strings.

use crate::core::{
    DecisionFunction, Labels, OcasConfig, Result, StringFeatures, TrainingReport, WDError,
};
use crate::kernel::{validate_weights, wd_weights, WdLayout, WdScorer};
use crate::solver::OcasSolver;
use log::info;
use serde::{Deserialize, Serialize};

/// High-level optimizer that validates inputs and runs OCAS
#[derive(Debug, Clone, Default)]
pub struct WDOptimizer {
    config: OcasConfig,
}

impl WDOptimizer {
    pub fn new(config: OcasConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OcasConfig {
        &self.config
    }

    /// Build the scorer for strings of `string_length` over `alphabet_size` symbols
    ///
    /// Uses `weights` when given, otherwise the default weights derived from
    /// `degree` and `from_degree`.
    pub fn build_scorer(
        &self,
        alphabet_size: usize,
        string_length: usize,
        weights: Option<&[f64]>,
    ) -> Result<WdScorer> {
        let layout = WdLayout::new(alphabet_size, self.config.degree, string_length)?;
        let weights = match weights {
            Some(w) => {
                validate_weights(w, self.config.degree)?;
                w.to_vec()
            }
            None => wd_weights(self.config.degree, self.config.from_degree)?,
        };
        WdScorer::new(layout, weights)
    }

    /// Check that `features` and `labels` can be trained with `scorer`
    pub fn validate_training_data<F: StringFeatures>(
        &self,
        features: &F,
        labels: &Labels,
        scorer: &WdScorer,
    ) -> Result<()> {
        self.config.validate()?;
        if features.is_empty() {
            return Err(WDError::EmptyDataset);
        }
        if features.num_vectors() != labels.len() {
            return Err(WDError::LabelCountMismatch {
                features: features.num_vectors(),
                labels: labels.len(),
            });
        }
        labels.validate_binary()?;

        let layout = scorer.layout();
        if features.alphabet_size() != layout.alphabet_size() {
            return Err(WDError::InvalidAlphabet(format!(
                "features use {} symbols, scorer expects {}",
                features.alphabet_size(),
                layout.alphabet_size()
            )));
        }
        if layout.degree() != self.config.degree {
            return Err(WDError::InvalidParameter(format!(
                "scorer degree {} differs from configured degree {}",
                layout.degree(),
                self.config.degree
            )));
        }

        let expected = layout.string_length();
        for i in 0..features.num_vectors() {
            let actual = features.vector_length(i);
            if actual != expected {
                return Err(WDError::InconsistentLength {
                    index: i,
                    expected,
                    actual,
                });
            }
            scorer.validate(features.feature_vector(i))?;
        }
        Ok(())
    }

    /// Train with an explicit scorer
    pub fn train<F: StringFeatures>(
        &self,
        features: &F,
        labels: &Labels,
        scorer: WdScorer,
    ) -> Result<(WDModel, TrainingReport)> {
        self.validate_training_data(features, labels, &scorer)?;

        let (positives, negatives) = labels.class_counts();
        info!(
            "Training WD model: {} strings of length {} ({} positive, {} negative), degree {}",
            features.num_vectors(),
            scorer.layout().string_length(),
            positives,
            negatives,
            scorer.layout().degree()
        );

        let solution =
            OcasSolver::new(features, labels.values(), &scorer, &self.config)?.solve()?;
        let model = WDModel::new(scorer, solution.w, solution.bias)?;
        Ok((model, solution.report))
    }

    /// Train with the scorer derived from the configuration and the data
    pub fn fit<F: StringFeatures>(
        &self,
        features: &F,
        labels: &Labels,
    ) -> Result<(WDModel, TrainingReport)> {
        let string_length = common_length(features)?;
        let scorer = self.build_scorer(features.alphabet_size(), string_length, None)?;
        self.train(features, labels, scorer)
    }
}

/// Length shared by every string of `features`
pub(crate) fn common_length<F: StringFeatures>(features: &F) -> Result<usize> {
    if features.is_empty() {
        return Err(WDError::EmptyDataset);
    }
    let expected = features.vector_length(0);
    match (1..features.num_vectors())
        .map(|i| (i, features.vector_length(i)))
        .find(|&(_, len)| len != expected)
    {
        Some((index, actual)) => Err(WDError::InconsistentLength {
            index,
            expected,
            actual,
        }),
        None => Ok(expected),
    }
}

/// A trained WD classifier: scorer tables, weight vector and bias
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WDModel {
    scorer: WdScorer,
    w: Vec<f64>,
    bias: f64,
}

impl WDModel {
    /// Assemble a model; `w` must match the scorer's feature dimension
    pub fn new(scorer: WdScorer, w: Vec<f64>, bias: f64) -> Result<Self> {
        let w_dim = scorer.layout().w_dim();
        if w.len() != w_dim {
            return Err(WDError::InvalidParameter(format!(
                "weight vector has {} entries, layout needs {}",
                w.len(),
                w_dim
            )));
        }
        Ok(Self { scorer, w, bias })
    }

    pub fn scorer(&self) -> &WdScorer {
        &self.scorer
    }

    pub fn weights(&self) -> &[f64] {
        &self.w
    }

    pub fn string_length(&self) -> usize {
        self.scorer.layout().string_length()
    }

    pub fn degree(&self) -> usize {
        self.scorer.layout().degree()
    }

    pub fn alphabet_size(&self) -> usize {
        self.scorer.layout().alphabet_size()
    }

    /// Predicted class (+1 or -1) for one string
    pub fn predict(&self, symbols: &[u8]) -> Result<f64> {
        let value = self.decision_value(symbols)?;
        Ok(if value >= 0.0 { 1.0 } else { -1.0 })
    }

    /// Number of non-zero weights
    pub fn nnz(&self) -> usize {
        self.w.iter().filter(|&&v| v != 0.0).count()
    }
}

impl DecisionFunction for WDModel {
    fn decision_value(&self, symbols: &[u8]) -> Result<f64> {
        Ok(self.scorer.score_checked(symbols, &self.w)? + self.bias)
    }

    fn bias(&self) -> f64 {
        self.bias
    }
}
