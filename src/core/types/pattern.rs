//! Byte signatures with wildcard positions

use std::fmt;
use thiserror::Error;

/// One position of a [`Pattern`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternByte {
    /// The remote byte must equal this value
    Exact(u8),
    /// Any remote byte matches
    Wildcard,
}

impl PatternByte {
    pub fn is_wildcard(&self) -> bool {
        matches!(self, PatternByte::Wildcard)
    }

    pub fn matches(&self, byte: u8) -> bool {
        match self {
            PatternByte::Exact(expected) => *expected == byte,
            PatternByte::Wildcard => true,
        }
    }
}

/// Error returned by [`Pattern::from_hex_string`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternParseError {
    #[error("empty pattern")]
    Empty,

    #[error("invalid hex byte {0:?}: must be two hex digits or a wildcard")]
    InvalidByte(String),
}

/// An ordered sequence of bytes to match at consecutive addresses.
///
/// Built from explicit `(byte, is_wildcard)` pairs, a builder, an IDA-style
/// signature string, or the classic `(mask, bytes)` form where `'x'` means
/// "must match" and any other mask character is a wildcard.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Pattern {
    bytes: Vec<PatternByte>,
}

impl Pattern {
    pub fn new(bytes: Vec<PatternByte>) -> Self {
        Pattern { bytes }
    }

    pub fn builder() -> PatternBuilder {
        PatternBuilder::default()
    }

    /// Pattern with no wildcards
    pub fn exact(bytes: &[u8]) -> Self {
        Pattern::new(bytes.iter().copied().map(PatternByte::Exact).collect())
    }

    /// Build from `(byte, is_wildcard)` pairs
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (u8, bool)>,
    {
        Pattern::new(
            pairs
                .into_iter()
                .map(|(byte, wildcard)| {
                    if wildcard {
                        PatternByte::Wildcard
                    } else {
                        PatternByte::Exact(byte)
                    }
                })
                .collect(),
        )
    }

    /// Build from a mask string and the signature bytes.
    ///
    /// Returns `None` when the mask and byte counts differ.
    pub fn from_mask(mask: &str, bytes: &[u8]) -> Option<Self> {
        if mask.len() != bytes.len() {
            return None;
        }

        Some(Pattern::from_pairs(
            bytes.iter().copied().zip(mask.bytes().map(|m| m != b'x')),
        ))
    }

    /// Parse a signature such as `"48 8B ?? ?? 89"`
    pub fn from_hex_string(pattern: &str) -> Result<Self, PatternParseError> {
        let mut bytes = Vec::new();

        for part in pattern.split_whitespace() {
            if part == "??" || part == "?" {
                bytes.push(PatternByte::Wildcard);
                continue;
            }

            let mut byte = [0u8; 1];
            hex::decode_to_slice(part, &mut byte)
                .map_err(|_| PatternParseError::InvalidByte(part.to_string()))?;
            bytes.push(PatternByte::Exact(byte[0]));
        }

        if bytes.is_empty() {
            return Err(PatternParseError::Empty);
        }

        Ok(Pattern::new(bytes))
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn bytes(&self) -> &[PatternByte] {
        &self.bytes
    }

    /// Mask string in `x`/`?` form
    pub fn mask(&self) -> String {
        self.bytes
            .iter()
            .map(|b| if b.is_wildcard() { '?' } else { 'x' })
            .collect()
    }

    /// Check the pattern against a local buffer starting at its first byte
    pub fn matches(&self, data: &[u8]) -> bool {
        data.len() >= self.bytes.len()
            && self.bytes.iter().zip(data).all(|(p, &b)| p.matches(b))
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.bytes.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            match byte {
                PatternByte::Exact(b) => write!(f, "{:02X}", b)?,
                PatternByte::Wildcard => f.write_str("??")?,
            }
        }
        Ok(())
    }
}

impl std::str::FromStr for Pattern {
    type Err = PatternParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Pattern::from_hex_string(s)
    }
}

/// Incremental [`Pattern`] construction
#[derive(Debug, Clone, Default)]
pub struct PatternBuilder {
    bytes: Vec<PatternByte>,
}

impl PatternBuilder {
    pub fn byte(mut self, value: u8) -> Self {
        self.bytes.push(PatternByte::Exact(value));
        self
    }

    pub fn bytes(mut self, values: &[u8]) -> Self {
        self.bytes
            .extend(values.iter().copied().map(PatternByte::Exact));
        self
    }

    pub fn wildcard(mut self) -> Self {
        self.bytes.push(PatternByte::Wildcard);
        self
    }

    pub fn wildcards(mut self, count: usize) -> Self {
        self.bytes
            .extend(std::iter::repeat(PatternByte::Wildcard).take(count));
        self
    }

    pub fn build(self) -> Pattern {
        Pattern::new(self.bytes)
    }
}
