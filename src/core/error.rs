//! Error types for WD-OCAS training and inference

use thiserror::Error;

/// Broad classification of a [`WDError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad parameters or malformed training input, detected before optimization starts
    Configuration,
    /// Inference or accessor called in a state that cannot serve it
    Precondition,
    /// Reading, parsing or writing data and models
    Io,
}

#[derive(Error, Debug)]
pub enum WDError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Degree {degree} exceeds string length {string_length}")]
    DegreeExceedsLength { degree: usize, string_length: usize },

    #[error("Invalid alphabet: {0}")]
    InvalidAlphabet(String),

    #[error("Feature weight dimension too large for alphabet size {alphabet_size}, degree {degree}, string length {string_length}")]
    DimensionOverflow {
        alphabet_size: usize,
        degree: usize,
        string_length: usize,
    },

    #[error("Number of labels ({labels}) does not match number of feature vectors ({features})")]
    LabelCountMismatch { features: usize, labels: usize },

    #[error("String {index} has length {actual}, expected {expected}")]
    InconsistentLength {
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Symbol {symbol} out of range for alphabet of size {alphabet_size}")]
    SymbolOutOfRange { symbol: u8, alphabet_size: usize },

    #[error("Invalid label: expected -1 or +1, got {0}")]
    InvalidLabel(f64),

    #[error("Empty dataset")]
    EmptyDataset,

    #[error("Model not trained")]
    ModelNotTrained,

    #[error("No string features bound to the classifier")]
    NoFeatures,

    #[error("No labels bound to the classifier")]
    NoLabels,

    #[error("String length mismatch: model was trained on length {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Example index {index} out of range for {len} feature vectors")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl WDError {
    /// Which class of failure this error belongs to
    pub fn kind(&self) -> ErrorKind {
        match self {
            WDError::InvalidParameter(_)
            | WDError::DegreeExceedsLength { .. }
            | WDError::InvalidAlphabet(_)
            | WDError::DimensionOverflow { .. }
            | WDError::LabelCountMismatch { .. }
            | WDError::InconsistentLength { .. }
            | WDError::SymbolOutOfRange { .. }
            | WDError::InvalidLabel(_)
            | WDError::EmptyDataset => ErrorKind::Configuration,
            WDError::ModelNotTrained
            | WDError::NoFeatures
            | WDError::NoLabels
            | WDError::LengthMismatch { .. }
            | WDError::IndexOutOfRange { .. } => ErrorKind::Precondition,
            WDError::IoError(_) | WDError::ParseError(_) | WDError::SerializationError(_) => {
                ErrorKind::Io
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, WDError>;
