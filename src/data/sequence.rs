//! Labeled sequence dataset
//!
//! Text format, one example per line:
//! label sequence
//!
//! Example:
//! +1 ACGTTGCA
//! -1 TTGCAACG
//!
//! Blank lines and lines starting with `#` are skipped.

use crate::core::{Labels, Result, StringFeatures, WDError};
use crate::data::Alphabet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// In-memory labeled strings over a fixed alphabet
#[derive(Debug, Clone)]
pub struct SequenceDataset {
    alphabet: Alphabet,
    sequences: Vec<Vec<u8>>,
    labels: Labels,
}

impl SequenceDataset {
    /// Create a dataset from already encoded symbol strings
    pub fn new(alphabet: Alphabet, sequences: Vec<Vec<u8>>, labels: Vec<f64>) -> Result<Self> {
        if sequences.len() != labels.len() {
            return Err(WDError::LabelCountMismatch {
                features: sequences.len(),
                labels: labels.len(),
            });
        }
        let size = alphabet.size();
        for sequence in &sequences {
            if let Some(&symbol) = sequence.iter().find(|&&s| usize::from(s) >= size) {
                return Err(WDError::SymbolOutOfRange {
                    symbol,
                    alphabet_size: size,
                });
            }
        }
        Ok(Self {
            alphabet,
            sequences,
            labels: Labels::new(labels),
        })
    }

    /// Create a dataset from text sequences
    pub fn from_strings<S: AsRef<str>>(
        alphabet: Alphabet,
        sequences: &[S],
        labels: Vec<f64>,
    ) -> Result<Self> {
        let encoded = sequences
            .iter()
            .map(|s| alphabet.encode(s.as_ref().as_bytes()))
            .collect::<Result<Vec<_>>>()?;
        Self::new(alphabet, encoded, labels)
    }

    /// Load a dataset from a file in the line format
    pub fn from_file<P: AsRef<Path>>(path: P, alphabet: Alphabet) -> Result<Self> {
        let file = File::open(path).map_err(WDError::IoError)?;
        let reader = BufReader::new(file);
        Self::from_reader(reader, alphabet)
    }

    /// Load a dataset from a reader (for testing and flexibility)
    pub fn from_reader<R: BufRead>(reader: R, alphabet: Alphabet) -> Result<Self> {
        let mut sequences = Vec::new();
        let mut labels = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(WDError::IoError)?;
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            match Self::parse_line(line, alphabet) {
                Ok((label, symbols)) => {
                    labels.push(label);
                    sequences.push(symbols);
                }
                Err(e) => {
                    return Err(WDError::ParseError(format!(
                        "Error parsing line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }

        if sequences.is_empty() {
            return Err(WDError::EmptyDataset);
        }

        Self::new(alphabet, sequences, labels)
    }

    /// Parse a single `label sequence` line
    fn parse_line(line: &str, alphabet: Alphabet) -> Result<(f64, Vec<u8>)> {
        let mut parts = line.split_whitespace();

        let label_str = parts
            .next()
            .ok_or_else(|| WDError::ParseError("Empty line".to_string()))?;
        let label = label_str
            .parse::<f64>()
            .map_err(|_| WDError::ParseError(format!("Invalid label: {label_str}")))?;
        if label == 0.0 || !label.is_finite() {
            return Err(WDError::ParseError(format!(
                "Label must be a non-zero number, got {label_str}"
            )));
        }
        let label = if label > 0.0 { 1.0 } else { -1.0 };

        let sequence = parts
            .next()
            .ok_or_else(|| WDError::ParseError("Missing sequence".to_string()))?;
        if let Some(extra) = parts.next() {
            return Err(WDError::ParseError(format!(
                "Unexpected trailing field: {extra}"
            )));
        }

        let symbols = alphabet.encode(sequence.as_bytes())?;
        Ok((label, symbols))
    }

    pub fn alphabet(&self) -> Alphabet {
        self.alphabet
    }

    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    /// Text form of sequence `i`
    pub fn sequence_string(&self, i: usize) -> Result<String> {
        let symbols = self.sequences.get(i).ok_or(WDError::IndexOutOfRange {
            index: i,
            len: self.sequences.len(),
        })?;
        let bytes = self.alphabet.decode(symbols)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl StringFeatures for SequenceDataset {
    fn num_vectors(&self) -> usize {
        self.sequences.len()
    }

    fn feature_vector(&self, i: usize) -> &[u8] {
        &self.sequences[i]
    }

    fn alphabet_size(&self) -> usize {
        self.alphabet.size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_line_basic() {
        let (label, symbols) = SequenceDataset::parse_line("+1 ACGT", Alphabet::Dna).unwrap();
        assert_eq!(label, 1.0);
        assert_eq!(symbols, vec![0, 1, 2, 3]);

        let (label, _) = SequenceDataset::parse_line("-1 tgca", Alphabet::Dna).unwrap();
        assert_eq!(label, -1.0);
    }

    #[test]
    fn test_parse_line_binary_conversion() {
        let (label, _) = SequenceDataset::parse_line("2 AC", Alphabet::Dna).unwrap();
        assert_eq!(label, 1.0);
        let (label, _) = SequenceDataset::parse_line("-3 AC", Alphabet::Dna).unwrap();
        assert_eq!(label, -1.0);
    }

    #[test]
    fn test_parse_line_invalid() {
        assert!(SequenceDataset::parse_line("+1", Alphabet::Dna).is_err());
        assert!(SequenceDataset::parse_line("abc ACGT", Alphabet::Dna).is_err());
        assert!(SequenceDataset::parse_line("0 ACGT", Alphabet::Dna).is_err());
        assert!(SequenceDataset::parse_line("+1 ACGX", Alphabet::Dna).is_err());
        assert!(SequenceDataset::parse_line("+1 ACGT TT", Alphabet::Dna).is_err());
    }

    #[test]
    fn test_from_reader_with_comments() {
        let data = "# header\n+1 AAAA\n\n-1 TTTT\n# trailing\n";
        let dataset = SequenceDataset::from_reader(Cursor::new(data), Alphabet::Dna).unwrap();

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.labels().values(), &[1.0, -1.0]);
        assert_eq!(dataset.feature_vector(1), &[3, 3, 3, 3]);
        assert_eq!(dataset.fixed_length(), Some(4));
        assert_eq!(dataset.sequence_string(0).unwrap(), "AAAA");
        assert!(matches!(
            dataset.sequence_string(2),
            Err(WDError::IndexOutOfRange { index: 2, len: 2 })
        ));
    }

    #[test]
    fn test_from_reader_reports_line_number() {
        let data = "+1 AAAA\n-1 TTNT\n";
        let err = SequenceDataset::from_reader(Cursor::new(data), Alphabet::Dna).unwrap_err();
        match err {
            WDError::ParseError(msg) => assert!(msg.contains("line 2"), "{msg}"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_from_reader_empty() {
        let result = SequenceDataset::from_reader(Cursor::new("# nothing\n\n"), Alphabet::Dna);
        assert!(matches!(result, Err(WDError::EmptyDataset)));
    }

    #[test]
    fn test_variable_lengths_detected() {
        let dataset =
            SequenceDataset::from_strings(Alphabet::Dna, &["ACGT", "ACG"], vec![1.0, -1.0])
                .unwrap();
        assert_eq!(dataset.fixed_length(), None);
    }

    #[test]
    fn test_label_count_mismatch() {
        let result = SequenceDataset::from_strings(Alphabet::Dna, &["ACGT"], vec![1.0, -1.0]);
        assert!(matches!(
            result,
            Err(WDError::LabelCountMismatch {
                features: 1,
                labels: 2
            })
        ));
    }
}
