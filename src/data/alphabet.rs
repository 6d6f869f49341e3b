//! Symbol alphabets for string features
//!
//! Maps raw bytes to dense symbol indices `0..size()` and back.

use crate::core::{Result, WDError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const DNA: &[u8] = b"ACGT";
const RNA: &[u8] = b"ACGU";
const PROTEIN: &[u8] = b"ACDEFGHIKLMNPQRSTVWY";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Alphabet {
    /// A, C, G, T (case-insensitive)
    Dna,
    /// A, C, G, U (case-insensitive)
    Rna,
    /// The 20 standard amino acids (case-insensitive)
    Protein,
    /// Every byte is its own symbol
    Raw,
}

impl Alphabet {
    /// Number of distinct symbols
    pub fn size(&self) -> usize {
        match self {
            Alphabet::Dna => DNA.len(),
            Alphabet::Rna => RNA.len(),
            Alphabet::Protein => PROTEIN.len(),
            Alphabet::Raw => 256,
        }
    }

    fn letters(&self) -> Option<&'static [u8]> {
        match self {
            Alphabet::Dna => Some(DNA),
            Alphabet::Rna => Some(RNA),
            Alphabet::Protein => Some(PROTEIN),
            Alphabet::Raw => None,
        }
    }

    /// Symbol index of one byte
    pub fn encode_byte(&self, byte: u8) -> Option<u8> {
        match self.letters() {
            Some(letters) => {
                let upper = byte.to_ascii_uppercase();
                letters.iter().position(|&l| l == upper).map(|p| p as u8)
            }
            None => Some(byte),
        }
    }

    /// Symbol indices of a whole sequence
    pub fn encode(&self, sequence: &[u8]) -> Result<Vec<u8>> {
        sequence
            .iter()
            .map(|&b| {
                self.encode_byte(b).ok_or_else(|| {
                    WDError::InvalidAlphabet(format!(
                        "character '{}' is not in the {} alphabet",
                        char::from(b).escape_default(),
                        self
                    ))
                })
            })
            .collect()
    }

    /// Bytes of a symbol sequence
    pub fn decode(&self, symbols: &[u8]) -> Result<Vec<u8>> {
        match self.letters() {
            Some(letters) => symbols
                .iter()
                .map(|&s| {
                    letters
                        .get(usize::from(s))
                        .copied()
                        .ok_or(WDError::SymbolOutOfRange {
                            symbol: s,
                            alphabet_size: letters.len(),
                        })
                })
                .collect(),
            None => Ok(symbols.to_vec()),
        }
    }
}

impl fmt::Display for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Alphabet::Dna => "dna",
            Alphabet::Rna => "rna",
            Alphabet::Protein => "protein",
            Alphabet::Raw => "raw",
        };
        f.write_str(name)
    }
}

impl FromStr for Alphabet {
    type Err = WDError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "dna" => Ok(Alphabet::Dna),
            "rna" => Ok(Alphabet::Rna),
            "protein" => Ok(Alphabet::Protein),
            "raw" => Ok(Alphabet::Raw),
            other => Err(WDError::InvalidAlphabet(format!(
                "unknown alphabet '{other}', expected dna, rna, protein or raw"
            ))),
        }
    }
}
