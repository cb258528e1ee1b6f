//! Memory size parsing for `--mem` and `--mem-per-gpu` values.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Slurm memory size: digits followed by exactly one unit letter.
static MEMORY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(\d+)([KMGTP])$").expect("memory regex is valid"));

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid memory size '{0}': expected digits followed by one of K, M, G, T, P (e.g. 4G)")]
pub struct ParseMemoryError(pub String);

/// Unit letter of a memory size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryUnit {
    K,
    M,
    G,
    T,
    P,
}

impl MemoryUnit {
    fn from_letter(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'K' => Some(Self::K),
            'M' => Some(Self::M),
            'G' => Some(Self::G),
            'T' => Some(Self::T),
            'P' => Some(Self::P),
            _ => None,
        }
    }

    fn letter(self) -> char {
        match self {
            Self::K => 'K',
            Self::M => 'M',
            Self::G => 'G',
            Self::T => 'T',
            Self::P => 'P',
        }
    }
}

/// A memory request such as `4G` or `500m`.
///
/// The magnitude is kept as its digits; Slurm does the arithmetic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemorySize {
    pub magnitude: String,
    pub unit: MemoryUnit,
}

impl MemorySize {
    /// Check a raw memory value.
    ///
    /// An empty (or whitespace-only) value means "unset" and is accepted.
    pub fn validate(s: &str) -> Result<(), ParseMemoryError> {
        if s.trim().is_empty() {
            return Ok(());
        }
        s.parse::<MemorySize>().map(|_| ())
    }
}

impl FromStr for MemorySize {
    type Err = ParseMemoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = MEMORY_RE
            .captures(s)
            .ok_or_else(|| ParseMemoryError(s.to_string()))?;

        let magnitude = caps[1].to_string();
        let unit = caps[2]
            .chars()
            .next()
            .and_then(MemoryUnit::from_letter)
            .ok_or_else(|| ParseMemoryError(s.to_string()))?;

        Ok(Self { magnitude, unit })
    }
}

impl fmt::Display for MemorySize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.magnitude, self.unit.letter())
    }
}
