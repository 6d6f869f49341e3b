//! Data loading and string feature implementations
//!
//! This module provides the alphabets that map raw characters to symbols and
//! an in-memory labeled sequence set implementing `StringFeatures`.

pub mod alphabet;
pub mod sequence;

pub use self::alphabet::*;
pub use self::sequence::*;
