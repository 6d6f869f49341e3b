//! Integration tests for the wdocas library
//!
//! These tests verify end-to-end functionality across multiple modules
//! and validate real-world usage scenarios.

use approx::assert_relative_eq;
use std::io::Write;
use tempfile::NamedTempFile;
use wdocas::api::{quick, WDSvmOcas};
use wdocas::kernel::WdLayout;
use wdocas::{
    Alphabet, DecisionFunction, ErrorKind, ExitStatus, Labels, Method, OcasConfig,
    SequenceDataset, SerializableModel, StringFeatures, WDError, WDModel, WDOptimizer,
};

const MOTIF: &[u8] = b"TATAAT";

/// Deterministic DNA strings of length 30; positives carry a motif at position 8
fn motif_dataset(n: usize, seed: u64) -> SequenceDataset {
    let mut state = seed;
    let mut sequences = Vec::with_capacity(n);
    let mut labels = Vec::with_capacity(n);
    for i in 0..n {
        let mut seq: Vec<u8> = (0..30)
            .map(|_| {
                state = state
                    .wrapping_mul(6_364_136_223_846_793_005)
                    .wrapping_add(1_442_695_040_888_963_407);
                b"ACGT"[(state >> 62) as usize]
            })
            .collect();
        let positive = i % 2 == 0;
        if positive {
            seq[8..8 + MOTIF.len()].copy_from_slice(MOTIF);
        }
        sequences.push(String::from_utf8(seq).expect("ascii"));
        labels.push(if positive { 1.0 } else { -1.0 });
    }
    SequenceDataset::from_strings(Alphabet::Dna, &sequences, labels).expect("valid dataset")
}

/// `1/2 (|w|^2 + b^2) + sum_i c_i max(0, 1 - y_i f(x_i))` of a trained model
fn training_objective(model: &WDModel, data: &SequenceDataset, c1: f64, c2: f64) -> f64 {
    let w = model.weights();
    let b = model.bias();
    let regularizer = 0.5 * (w.iter().map(|v| v * v).sum::<f64>() + b * b);
    let loss: f64 = data
        .labels()
        .iter()
        .enumerate()
        .map(|(i, y)| {
            let f = model.decision_value(data.feature_vector(i)).unwrap();
            let c = if y > 0.0 { c1 } else { c2 };
            c * (1.0 - y * f).max(0.0)
        })
        .sum();
    regularizer + loss
}

/// Two strings, AAAA positive and TTTT negative
#[test]
fn test_aaaa_tttt_scenario() {
    let dataset =
        SequenceDataset::from_strings(Alphabet::Dna, &["AAAA", "TTTT"], vec![1.0, -1.0])
            .expect("valid dataset");

    let mut svm = WDSvmOcas::from_dataset(dataset)
        .with_c(1.0)
        .with_epsilon(1e-3)
        .with_bias(true)
        .with_degree(2, 2);
    let report = svm.train(None).expect("Training should succeed");

    assert!(report.is_converged());
    assert!(report.iterations <= 10, "took {} iterations", report.iterations);
    assert!(svm.classify_example(0).unwrap() > 0.0);
    assert!(svm.classify_example(1).unwrap() < 0.0);
}

/// Degree equal to the string length scores whole strings one-hot
#[test]
fn test_full_length_kmer_is_one_hot() {
    let strings: Vec<String> = ["ACG", "AAT", "CCC", "GTA", "TTT", "CAG"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let dataset = SequenceDataset::from_strings(
        Alphabet::Dna,
        &strings,
        vec![1.0, 1.0, 1.0, -1.0, -1.0, -1.0],
    )
    .unwrap();

    let mut svm = WDSvmOcas::from_dataset(dataset).with_degree(3, 3);
    svm.set_wd_weights(vec![0.0, 0.0, 1.0]).unwrap();
    svm.train(None).expect("Training should succeed");
    let model = svm.model().expect("trained");

    let layout = WdLayout::new(4, 3, 3).unwrap();
    for a in 0..4u8 {
        for b in 0..4u8 {
            for c in 0..4u8 {
                let kmer = [a, b, c];
                let slot = layout.slot(0, &kmer).expect("valid kmer");
                let expected = model.weights()[slot] + model.bias();
                assert_relative_eq!(
                    model.decision_value(&kmer).unwrap(),
                    expected,
                    epsilon = 1e-12
                );
            }
        }
    }
    let values = svm.classify_all().unwrap();
    assert_eq!(
        values.predicted_classes(),
        vec![1.0, 1.0, 1.0, -1.0, -1.0, -1.0]
    );
}

/// Scoring a string of the wrong length is a precondition error
#[test]
fn test_length_mismatch_on_classify() {
    let train = SequenceDataset::from_strings(Alphabet::Dna, &["AAAA", "TTTT"], vec![1.0, -1.0])
        .unwrap();
    let mut svm = WDSvmOcas::from_dataset(train).with_degree(2, 2);
    svm.train(None).unwrap();

    let short = SequenceDataset::from_strings(Alphabet::Dna, &["AAA"], vec![1.0]).unwrap();
    let err = svm.classify(&short).unwrap_err();
    assert!(matches!(
        err,
        WDError::LengthMismatch {
            expected: 4,
            actual: 3
        }
    ));
    assert_eq!(err.kind(), ErrorKind::Precondition);
}

/// The lower bound never decreases and the committed objective never increases
#[test]
fn test_objective_bounds_are_monotone() {
    let dataset = motif_dataset(60, 7);
    for method in [Method::Ocas, Method::CuttingPlane] {
        let mut svm = WDSvmOcas::from_dataset(dataset.clone())
            .with_degree(4, 4)
            .with_c(2.0)
            .with_method(method);
        let report = svm.train(None).expect("Training should succeed");

        assert!(report.is_converged(), "{method:?}: {:?}", report.status);
        for pair in report.trace.windows(2) {
            let tol = 1e-9 * pair[0].primal_objective.abs().max(1.0);
            assert!(pair[1].dual_objective >= pair[0].dual_objective - tol);
            assert!(pair[1].primal_objective <= pair[0].primal_objective + tol);
        }
        for stats in &report.trace {
            assert!(stats.dual_objective <= stats.primal_objective + 1e-9);
        }
    }
}

/// Cut count stays within the buffer
#[test]
fn test_bufsize_respected() {
    let dataset = motif_dataset(40, 11);
    let mut svm = WDSvmOcas::from_dataset(dataset)
        .with_degree(3, 3)
        .with_bufsize(4)
        .with_epsilon(0.0)
        .with_max_iterations(30);
    let report = svm.train(None).expect("Training should succeed");

    assert!(report.cut_count <= 4);
    assert!(report.trace.iter().all(|s| s.cut_count <= 4));
    assert!(report.iterations <= 30);
}

/// The motif is learned and generalizes to fresh strings
#[test]
fn test_motif_generalizes() {
    let train = motif_dataset(80, 1);
    let test = motif_dataset(40, 99);

    let mut svm = WDSvmOcas::from_dataset(train)
        .with_degree(6, 6)
        .with_c(5.0);
    let report = svm.train(None).expect("Training should succeed");
    assert_eq!(report.training_errors, 0);

    let metrics = svm.evaluate(&test, test.labels()).unwrap();
    assert!(
        metrics.accuracy() >= 0.9,
        "test accuracy {}",
        metrics.accuracy()
    );
}

#[test]
fn test_normalization_follows_degree() {
    let dataset = motif_dataset(4, 3);
    let mut svm = WDSvmOcas::from_dataset(dataset).with_degree(3, 3);
    let weights = svm.wd_weights().unwrap().to_vec();
    let expected: f64 = weights
        .iter()
        .enumerate()
        .map(|(i, w)| (30 - i) as f64 * w * w)
        .sum::<f64>()
        .sqrt();
    assert_relative_eq!(svm.normalization_const().unwrap(), expected, epsilon = 1e-12);

    svm.set_degree(5, 5);
    assert!((svm.normalization_const().unwrap() - expected).abs() > 1e-6);
}

#[test]
fn test_asymmetric_costs_shift_predictions() {
    let dataset = motif_dataset(40, 5);
    let labels = dataset.labels().clone();
    let base = OcasConfig {
        degree: 3,
        from_degree: 3,
        ..OcasConfig::default()
    };

    let (balanced, _) = WDOptimizer::new(base.clone()).fit(&dataset, &labels).unwrap();
    let (favor_pos, report) = WDOptimizer::new(OcasConfig {
        c1: 10.0,
        c2: 0.1,
        ..base
    })
    .fit(&dataset, &labels)
    .unwrap();

    let positives = |values: &Labels| values.iter().filter(|&v| v >= 0.0).count();
    let balanced_pos = positives(&balanced.decision_values(&dataset).unwrap());
    let favored_pos = positives(&favor_pos.decision_values(&dataset).unwrap());
    assert!(favored_pos >= balanced_pos);

    assert_relative_eq!(
        training_objective(&favor_pos, &dataset, 10.0, 0.1),
        report.primal_objective,
        max_relative = 1e-8
    );
}

/// The reported objective charges C1 on positives and C2 on negatives
#[test]
fn test_asymmetric_costs_enter_objective() {
    let dataset =
        SequenceDataset::from_strings(Alphabet::Dna, &["AAAA", "TTTT"], vec![1.0, -1.0])
            .unwrap();
    let labels = dataset.labels().clone();
    let base = OcasConfig {
        degree: 2,
        from_degree: 2,
        ..OcasConfig::default()
    };

    let (symmetric, symmetric_report) =
        WDOptimizer::new(base.clone()).fit(&dataset, &labels).unwrap();
    let (asymmetric, asymmetric_report) = WDOptimizer::new(OcasConfig {
        c1: 3.0,
        c2: 0.5,
        ..base
    })
    .fit(&dataset, &labels)
    .unwrap();

    assert_relative_eq!(
        training_objective(&symmetric, &dataset, 1.0, 1.0),
        symmetric_report.primal_objective,
        max_relative = 1e-8
    );
    let objective = training_objective(&asymmetric, &dataset, 3.0, 0.5);
    assert_relative_eq!(objective, asymmetric_report.primal_objective, max_relative = 1e-8);

    // Optimum: positive on the margin, negative at margin 1/4, objective 13/16
    assert_relative_eq!(objective, 0.8125, max_relative = 1e-2);
    assert_relative_eq!(symmetric_report.primal_objective, 1.0, max_relative = 1e-2);
    assert!((objective - training_objective(&asymmetric, &dataset, 1.0, 1.0)).abs() > 0.1);
}

/// A feature space too large to allocate is a configuration error, not an abort
#[test]
fn test_unallocatable_feature_space_is_an_error() {
    let dataset =
        SequenceDataset::from_strings(Alphabet::Raw, &["abcdefgh", "hgfedcba"], vec![1.0, -1.0])
            .unwrap();
    let labels = dataset.labels().clone();

    let err = WDOptimizer::new(OcasConfig::default())
        .fit(&dataset, &labels)
        .unwrap_err();
    assert!(matches!(
        err,
        WDError::DimensionOverflow {
            alphabet_size: 256,
            degree: 6,
            string_length: 8
        }
    ));
    assert_eq!(err.kind(), ErrorKind::Configuration);

    let mut svm = WDSvmOcas::from_dataset(dataset);
    assert!(svm.train(None).is_err());
    assert!(svm.model().is_none());
}

#[test]
fn test_time_limit_stops_training() {
    let dataset = motif_dataset(40, 13);
    let labels = dataset.labels().clone();
    let config = OcasConfig {
        degree: 3,
        from_degree: 3,
        epsilon: 0.0,
        max_time: Some(std::time::Duration::ZERO),
        ..OcasConfig::default()
    };
    let (_, report) = WDOptimizer::new(config).fit(&dataset, &labels).unwrap();
    assert!(matches!(
        report.status,
        ExitStatus::MaxTime | ExitStatus::Converged
    ));
    assert_eq!(report.iterations, 1);
}

/// Save, load and reuse a model through the file-based helpers
#[test]
fn test_complete_workflow_with_persistence() {
    let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
    writeln!(temp_file, "# promoter fragments").expect("Failed to write");
    writeln!(temp_file, "+1 GGTATAATCC").expect("Failed to write");
    writeln!(temp_file, "+1 CATATAATGG").expect("Failed to write");
    writeln!(temp_file, "+1 ACTATAATTA").expect("Failed to write");
    writeln!(temp_file, "-1 GGCGCGCTCC").expect("Failed to write");
    writeln!(temp_file, "-1 CACGCGCTGG").expect("Failed to write");
    writeln!(temp_file, "-1 ACCGCGCTTA").expect("Failed to write");
    temp_file.flush().expect("Failed to flush");

    let svm = quick::train_file(temp_file.path(), Alphabet::Dna).expect("Training should succeed");
    let model = svm.model().expect("trained");
    let report = svm.last_report().expect("report");

    let model_file = NamedTempFile::new().expect("Failed to create temp file");
    SerializableModel::new(model, Alphabet::Dna, svm.config(), Some(report))
        .unwrap()
        .save_to_file(model_file.path())
        .unwrap();
    let restored = SerializableModel::load_from_file(model_file.path())
        .unwrap()
        .to_model()
        .unwrap();

    let dataset = SequenceDataset::from_file(temp_file.path(), Alphabet::Dna).unwrap();
    let original = model.decision_values(&dataset).unwrap();
    let reloaded = restored.decision_values(&dataset).unwrap();
    for (a, b) in original.iter().zip(reloaded.iter()) {
        assert_relative_eq!(a, b, epsilon = 1e-12);
    }
    assert_eq!(original.predicted_classes(), dataset.labels().values());
}
