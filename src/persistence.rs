//! Model serialization and persistence
//!
//! Saves a trained [`WDModel`] together with the alphabet it was trained on,
//! the training parameters and a summary of the run as pretty JSON.

use crate::core::{DecisionFunction, Method, OcasConfig, Result, TrainingReport, WDError};
use crate::data::Alphabet;
use crate::kernel::{WdLayout, WdScorer};
use crate::optimizer::WDModel;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Serializable representation of a trained WD model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializableModel {
    pub model: WDModel,
    /// Alphabet used to encode the training strings
    pub alphabet: Alphabet,
    pub metadata: ModelMetadata,
}

/// Model metadata for tracking and validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Library version used to create the model
    pub library_version: String,
    /// Training parameters used
    pub training_params: TrainingParams,
    /// Outcome of the training run, when known
    pub training_summary: Option<TrainingSummary>,
    /// Creation timestamp
    pub created_at: String,
}

/// Training parameters for reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingParams {
    pub c1: f64,
    pub c2: f64,
    pub epsilon: f64,
    pub bufsize: usize,
    pub max_iterations: usize,
    pub use_bias: bool,
    pub method: Method,
    pub degree: usize,
    pub from_degree: usize,
}

impl From<&OcasConfig> for TrainingParams {
    fn from(config: &OcasConfig) -> Self {
        Self {
            c1: config.c1,
            c2: config.c2,
            epsilon: config.epsilon,
            bufsize: config.bufsize,
            max_iterations: config.max_iterations,
            use_bias: config.use_bias,
            method: config.method,
            degree: config.degree,
            from_degree: config.from_degree,
        }
    }
}

impl TrainingParams {
    /// Configuration with these parameters and defaults for the rest
    pub fn to_config(&self) -> OcasConfig {
        OcasConfig {
            c1: self.c1,
            c2: self.c2,
            epsilon: self.epsilon,
            bufsize: self.bufsize,
            max_iterations: self.max_iterations,
            use_bias: self.use_bias,
            method: self.method,
            degree: self.degree,
            from_degree: self.from_degree,
            ..OcasConfig::default()
        }
    }
}

/// Condensed [`TrainingReport`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub status: String,
    pub converged: bool,
    pub iterations: usize,
    pub primal_objective: f64,
    pub dual_objective: f64,
    pub training_errors: usize,
    pub elapsed_secs: f64,
}

impl From<&TrainingReport> for TrainingSummary {
    fn from(report: &TrainingReport) -> Self {
        Self {
            status: format!("{:?}", report.status),
            converged: report.is_converged(),
            iterations: report.iterations,
            primal_objective: report.primal_objective,
            dual_objective: report.dual_objective,
            training_errors: report.training_errors,
            elapsed_secs: report.elapsed.as_secs_f64(),
        }
    }
}

impl SerializableModel {
    /// Wrap a trained model; `alphabet` must match the model's symbol count
    pub fn new(
        model: &WDModel,
        alphabet: Alphabet,
        config: &OcasConfig,
        report: Option<&TrainingReport>,
    ) -> Result<Self> {
        check_alphabet(model, alphabet)?;
        Ok(Self {
            model: model.clone(),
            alphabet,
            metadata: ModelMetadata {
                library_version: env!("CARGO_PKG_VERSION").to_string(),
                training_params: TrainingParams::from(config),
                training_summary: report.map(TrainingSummary::from),
                created_at: chrono::Utc::now().to_rfc3339(),
            },
        })
    }

    /// Save model to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path).map_err(WDError::IoError)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)
            .map_err(|e| WDError::SerializationError(e.to_string()))?;
        Ok(())
    }

    /// Load model from file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path).map_err(WDError::IoError)?;
        let reader = BufReader::new(file);
        let model = serde_json::from_reader(reader)
            .map_err(|e| WDError::SerializationError(e.to_string()))?;
        Ok(model)
    }

    /// Rebuild a usable model, recomputing the scorer tables from the stored parameters
    pub fn to_model(&self) -> Result<WDModel> {
        check_alphabet(&self.model, self.alphabet)?;
        let stored = self.model.scorer();
        let layout = WdLayout::new(
            stored.layout().alphabet_size(),
            stored.layout().degree(),
            stored.layout().string_length(),
        )?;
        let scorer = WdScorer::new(layout, stored.wd_weights().to_vec())?;
        WDModel::new(scorer, self.model.weights().to_vec(), self.model.bias())
    }

    /// Print model summary
    pub fn print_summary(&self) {
        let params = &self.metadata.training_params;
        println!("=== WD-OCAS Model Summary ===");
        println!("Alphabet: {} ({} symbols)", self.alphabet, self.alphabet.size());
        println!("String Length: {}", self.model.string_length());
        println!("Degree: {}", self.model.degree());
        println!("Weights: {} ({} non-zero)", self.model.weights().len(), self.model.nnz());
        println!("Bias: {:.6}", self.model.bias());
        println!("Library Version: {}", self.metadata.library_version);
        println!("Created: {}", self.metadata.created_at);
        println!("Training Parameters:");
        println!("  C1: {}", params.c1);
        println!("  C2: {}", params.c2);
        println!("  Epsilon: {}", params.epsilon);
        println!("  Method: {:?}", params.method);
        println!("  From Degree: {}", params.from_degree);
        println!("  Buffer Size: {}", params.bufsize);
        if let Some(summary) = &self.metadata.training_summary {
            println!("Training Run:");
            println!("  Status: {}", summary.status);
            println!("  Iterations: {}", summary.iterations);
            println!("  Primal Objective: {:.6}", summary.primal_objective);
            println!("  Dual Objective: {:.6}", summary.dual_objective);
            println!("  Training Errors: {}", summary.training_errors);
            println!("  Time: {:.3}s", summary.elapsed_secs);
        }
    }
}

fn check_alphabet(model: &WDModel, alphabet: Alphabet) -> Result<()> {
    if alphabet.size() != model.alphabet_size() {
        return Err(WDError::InvalidAlphabet(format!(
            "{} alphabet has {} symbols, model was trained on {}",
            alphabet,
            alphabet.size(),
            model.alphabet_size()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Labels;
    use crate::data::SequenceDataset;
    use crate::optimizer::WDOptimizer;
    use approx::assert_relative_eq;
    use tempfile::NamedTempFile;

    fn trained() -> (WDModel, OcasConfig, TrainingReport) {
        let dataset =
            SequenceDataset::from_strings(Alphabet::Dna, &["ACGTA", "TGCAT"], vec![1.0, -1.0])
                .unwrap();
        let config = OcasConfig {
            degree: 3,
            from_degree: 5,
            ..OcasConfig::default()
        };
        let labels: Labels = dataset.labels().clone();
        let (model, report) = WDOptimizer::new(config.clone())
            .fit(&dataset, &labels)
            .unwrap();
        (model, config, report)
    }

    #[test]
    fn test_model_serialization() -> Result<()> {
        let (model, config, report) = trained();
        let serializable = SerializableModel::new(&model, Alphabet::Dna, &config, Some(&report))?;

        let temp_file = NamedTempFile::new().expect("Failed to create temp file");
        serializable.save_to_file(temp_file.path())?;
        let loaded = SerializableModel::load_from_file(temp_file.path())?;

        assert_eq!(loaded.alphabet, Alphabet::Dna);
        assert_eq!(loaded.metadata.training_params, TrainingParams::from(&config));
        assert_eq!(
            loaded.metadata.training_summary.as_ref().map(|s| s.iterations),
            Some(report.iterations)
        );

        let restored = loaded.to_model()?;
        for symbols in [[0u8, 1, 2, 3, 0], [3, 2, 1, 0, 3], [0, 0, 1, 1, 2]] {
            assert_relative_eq!(
                restored.decision_value(&symbols)?,
                model.decision_value(&symbols)?,
                epsilon = 1e-12
            );
        }
        Ok(())
    }

    #[test]
    fn test_alphabet_must_match() {
        let (model, config, _) = trained();
        let err = SerializableModel::new(&model, Alphabet::Protein, &config, None).unwrap_err();
        assert!(matches!(err, WDError::InvalidAlphabet(_)));
    }

    #[test]
    fn test_params_round_into_config() {
        let config = OcasConfig {
            c1: 3.0,
            method: Method::CuttingPlane,
            ..OcasConfig::default()
        };
        assert_eq!(TrainingParams::from(&config).to_config(), config);
    }

    #[test]
    fn test_load_missing_file() {
        let result = SerializableModel::load_from_file("/nonexistent/model.json");
        assert!(matches!(result, Err(WDError::IoError(_))));
    }
}
