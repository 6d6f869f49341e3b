//! WD-OCAS Command Line Interface
//!
//! Trains Weighted-Degree string-kernel SVMs on labeled sequence files and
//! uses the saved models for prediction and evaluation.

use clap::{Args, Parser, Subcommand, ValueEnum};
use env_logger::Env;
use log::{error, info, warn};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use wdocas::api::{EvaluationMetrics, WDSvmOcas};
use wdocas::core::{DecisionFunction, Labels, Method, Result, WDError};
use wdocas::data::{Alphabet, SequenceDataset};
use wdocas::persistence::SerializableModel;

#[derive(Parser)]
#[command(name = "wdocas")]
#[command(about = "Weighted-Degree string kernel SVM trained with OCAS")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a new model
    Train(TrainArgs),
    /// Make predictions using a trained model
    Predict(PredictArgs),
    /// Evaluate a model on labeled test data
    Evaluate(EvaluateArgs),
    /// Display model information
    Info(InfoArgs),
}

#[derive(Args)]
struct TrainArgs {
    /// Training data file, one `label sequence` pair per line
    #[arg(long)]
    data: PathBuf,

    /// Output model file
    #[arg(short, long)]
    output: PathBuf,

    /// Sequence alphabet
    #[arg(short, long, default_value = "dna")]
    alphabet: CliAlphabet,

    /// Cost for positive examples (and negative ones unless --c2 is given)
    #[arg(short = 'C', long, default_value = "1.0")]
    c: f64,

    /// Cost for negative examples
    #[arg(long)]
    c2: Option<f64>,

    /// Relative tolerance on the primal-dual gap
    #[arg(short, long, default_value = "0.001")]
    epsilon: f64,

    /// Maximum k-mer length
    #[arg(long, default_value = "6")]
    degree: usize,

    /// Degree the default k-mer weights are derived from
    #[arg(long, default_value = "40")]
    from_degree: usize,

    /// Maximum number of cutting planes kept
    #[arg(long, default_value = "3000")]
    bufsize: usize,

    /// Maximum iterations
    #[arg(short, long, default_value = "10000")]
    max_iterations: usize,

    /// Time limit in seconds
    #[arg(long)]
    max_time: Option<f64>,

    /// Optimization method
    #[arg(long, default_value = "ocas")]
    method: CliMethod,

    /// Train without a bias term
    #[arg(long)]
    no_bias: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CliAlphabet {
    Dna,
    Rna,
    Protein,
    Raw,
}

impl From<CliAlphabet> for Alphabet {
    fn from(cli_alphabet: CliAlphabet) -> Self {
        match cli_alphabet {
            CliAlphabet::Dna => Alphabet::Dna,
            CliAlphabet::Rna => Alphabet::Rna,
            CliAlphabet::Protein => Alphabet::Protein,
            CliAlphabet::Raw => Alphabet::Raw,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CliMethod {
    /// Line search between successive iterates (default)
    #[value(name = "ocas")]
    Ocas,
    /// Plain cutting-plane iterations (SVMperf / BMRM style)
    #[value(name = "cutting-plane")]
    CuttingPlane,
}

impl From<CliMethod> for Method {
    fn from(cli_method: CliMethod) -> Self {
        match cli_method {
            CliMethod::Ocas => Method::Ocas,
            CliMethod::CuttingPlane => Method::CuttingPlane,
        }
    }
}

#[derive(Args)]
struct PredictArgs {
    /// Trained model file
    #[arg(short, long)]
    model: PathBuf,

    /// Input data file
    #[arg(long)]
    data: PathBuf,

    /// Output predictions file (optional, prints to stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Show decision values
    #[arg(long)]
    decision_values: bool,
}

#[derive(Args)]
struct EvaluateArgs {
    /// Trained model file
    #[arg(short, long)]
    model: PathBuf,

    /// Test data file
    #[arg(long)]
    data: PathBuf,

    /// Show detailed metrics
    #[arg(long)]
    detailed: bool,
}

#[derive(Args)]
struct InfoArgs {
    /// Model file
    model: PathBuf,
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };

    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    let result = match cli.command {
        Commands::Train(args) => train_command(args),
        Commands::Predict(args) => predict_command(args),
        Commands::Evaluate(args) => evaluate_command(args),
        Commands::Info(args) => info_command(args),
    };

    if let Err(e) = result {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn train_command(args: TrainArgs) -> Result<()> {
    let alphabet = Alphabet::from(args.alphabet);
    let c2 = args.c2.unwrap_or(args.c);
    info!("Training WD model...");
    info!("Data file: {:?}", args.data);
    info!(
        "Parameters: C1={}, C2={}, epsilon={}, degree={}, from_degree={}, method={:?}",
        args.c, c2, args.epsilon, args.degree, args.from_degree, args.method
    );

    let dataset = SequenceDataset::from_file(&args.data, alphabet)?;
    info!(
        "Loaded {} sequences over the {} alphabet",
        dataset.len(),
        alphabet
    );

    let mut svm = WDSvmOcas::from_dataset(dataset)
        .with_c1_c2(args.c, c2)
        .with_epsilon(args.epsilon)
        .with_degree(args.degree, args.from_degree)
        .with_bufsize(args.bufsize)
        .with_max_iterations(args.max_iterations)
        .with_method(args.method.into())
        .with_bias(!args.no_bias);
    if let Some(seconds) = args.max_time {
        let limit = Duration::try_from_secs_f64(seconds).map_err(|_| {
            WDError::InvalidParameter(format!("Invalid time limit: {seconds}"))
        })?;
        svm = svm.with_max_time(limit);
    }

    let report = svm.train(None)?;
    if report.is_converged() {
        info!(
            "Training completed in {} iterations ({:?})",
            report.iterations, report.status
        );
    } else {
        warn!(
            "Training stopped early ({:?}), relative gap {:.3e}",
            report.status,
            report.relative_gap()
        );
    }

    let model = svm.model().ok_or(WDError::ModelNotTrained)?;
    info!("Bias: {:.6}", model.bias());

    let serializable = SerializableModel::new(model, alphabet, svm.config(), Some(&report))?;
    serializable.save_to_file(&args.output)?;
    info!("Model saved to: {:?}", args.output);

    let values = svm.classify_all()?;
    let labels = svm.labels().ok_or(WDError::NoLabels)?;
    let metrics = EvaluationMetrics::from_decision_values(&values, labels)?;
    info!("Training accuracy: {:.2}%", metrics.accuracy() * 100.0);

    Ok(())
}

fn predict_command(args: PredictArgs) -> Result<()> {
    info!("Loading model from: {:?}", args.model);
    let serializable_model = SerializableModel::load_from_file(&args.model)?;
    let model = serializable_model.to_model()?;

    info!("Loading prediction data from: {:?}", args.data);
    let dataset = SequenceDataset::from_file(&args.data, serializable_model.alphabet)?;
    let values = model.decision_values(&dataset)?;

    match args.output {
        Some(output_path) => {
            let file = File::create(&output_path).map_err(WDError::IoError)?;
            let mut writer = BufWriter::new(file);
            write_predictions(&mut writer, &values, args.decision_values)
                .map_err(WDError::IoError)?;
            writer.flush().map_err(WDError::IoError)?;
            info!("Predictions saved to: {output_path:?}");
        }
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            write_predictions(&mut handle, &values, args.decision_values)
                .map_err(WDError::IoError)?;
        }
    }

    Ok(())
}

fn write_predictions<W: Write>(
    writer: &mut W,
    values: &Labels,
    decision_values: bool,
) -> std::io::Result<()> {
    writeln!(writer, "# Predictions for {} sequences", values.len())?;
    writeln!(
        writer,
        "# Format: sequence_index predicted_label{}",
        if decision_values { " decision_value" } else { "" }
    )?;
    for (i, (value, label)) in values
        .iter()
        .zip(values.predicted_classes())
        .enumerate()
    {
        if decision_values {
            writeln!(writer, "{i} {label:.0} {value:.6}")?;
        } else {
            writeln!(writer, "{i} {label:.0}")?;
        }
    }
    Ok(())
}

fn evaluate_command(args: EvaluateArgs) -> Result<()> {
    info!("Loading model from: {:?}", args.model);
    let serializable_model = SerializableModel::load_from_file(&args.model)?;
    let model = serializable_model.to_model()?;

    info!("Loading test data from: {:?}", args.data);
    let dataset = SequenceDataset::from_file(&args.data, serializable_model.alphabet)?;
    let values = model.decision_values(&dataset)?;
    let metrics = EvaluationMetrics::from_decision_values(&values, dataset.labels())?;

    println!("=== Model Evaluation ===");
    serializable_model.print_summary();

    println!("\nTest Results:");
    println!("  Sequences: {}", metrics.total());
    println!("  Accuracy: {:.2}%", metrics.accuracy() * 100.0);

    if args.detailed {
        println!("\nDetailed Metrics:");
        println!("  True Positives:  {}", metrics.true_positives);
        println!("  True Negatives:  {}", metrics.true_negatives);
        println!("  False Positives: {}", metrics.false_positives);
        println!("  False Negatives: {}", metrics.false_negatives);
        println!("  Precision:       {:.4}", metrics.precision());
        println!("  Recall:          {:.4}", metrics.recall());
        println!("  F1 Score:        {:.4}", metrics.f1_score());
        println!("  Specificity:     {:.4}", metrics.specificity());
    }

    Ok(())
}

fn info_command(args: InfoArgs) -> Result<()> {
    info!("Loading model from: {:?}", args.model);
    let serializable_model = SerializableModel::load_from_file(&args.model)?;

    serializable_model.print_summary();

    let scorer = serializable_model.model.scorer();
    println!("\nFeature Space:");
    println!("  Dimension: {}", scorer.layout().w_dim());
    println!("  Per Position: {}", scorer.layout().w_dim_single_char());
    println!("  Normalization: {:.6}", scorer.normalization_const());
    println!("\nDegree Weights:");
    for (k, weight) in scorer.wd_weights().iter().enumerate() {
        println!("  k={}: {weight:.6}", k + 1);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alphabet_conversion() {
        assert_eq!(Alphabet::from(CliAlphabet::Dna), Alphabet::Dna);
        assert_eq!(Alphabet::from(CliAlphabet::Protein), Alphabet::Protein);
        assert_eq!(Method::from(CliMethod::CuttingPlane), Method::CuttingPlane);
    }

    #[test]
    fn test_write_predictions() {
        let values = Labels::new(vec![0.25, -1.5]);
        let mut out = Vec::new();
        write_predictions(&mut out, &values, true).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("0 1 0.250000"));
        assert!(text.contains("1 -1 -1.500000"));
    }
}
