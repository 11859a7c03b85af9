//! Dotted-integer versions used to pick request dialects
//!
//! A [`Version`] is parsed once and never mutated. Comparing two versions of
//! different lengths needs a fill value for the missing trailing components:
//! the shorter side is padded with its own fill value, or with the other
//! side's when it has none. With no fill value on either side the comparison
//! is an error rather than a guess.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct Version {
    text: String,
    components: Vec<u64>,
    fill: Option<u64>,
}

impl Version {
    /// Parse a dotted version such as `"3.7.9"`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidVersion`] if the text is empty or any
    /// component is not a non-negative integer.
    pub fn parse(text: &str, fill: Option<u64>) -> Result<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(Error::invalid_version(text, "empty version"));
        }

        let components = trimmed
            .split('.')
            .map(|part| {
                part.parse::<u64>().map_err(|e| {
                    Error::invalid_version(text, format!("component {part:?}: {e}"))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            text: trimmed.to_string(),
            components,
            fill,
        })
    }

    /// Build a version from already-validated components.
    pub fn from_components(components: &[u64]) -> Self {
        let text = components
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(".");
        Self {
            text,
            components: components.to_vec(),
            fill: None,
        }
    }

    /// Return a copy of this version that pads missing components with `fill`.
    pub fn with_fill(mut self, fill: u64) -> Self {
        self.fill = Some(fill);
        self
    }

    pub fn components(&self) -> &[u64] {
        &self.components
    }

    pub fn fill(&self) -> Option<u64> {
        self.fill
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Three-way comparison walking component pairs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::VersionMismatch`] when the lengths differ and no fill
    /// value is available for the shorter side.
    pub fn compare(&self, other: &Version) -> Result<Ordering> {
        let len = self.components.len().max(other.components.len());
        for i in 0..len {
            let a = self.component_or_fill(i, other)?;
            let b = other.component_or_fill(i, self)?;
            match a.cmp(&b) {
                Ordering::Equal => continue,
                ord => return Ok(ord),
            }
        }
        Ok(Ordering::Equal)
    }

    /// `lower <= self < upper`
    pub fn in_range(&self, lower: &Version, upper: &Version) -> Result<bool> {
        Ok(self.compare(lower)? != Ordering::Less && self.compare(upper)? == Ordering::Less)
    }

    fn component_or_fill(&self, index: usize, other: &Version) -> Result<u64> {
        self.components
            .get(index)
            .copied()
            .or(self.fill)
            .or(other.fill)
            .ok_or_else(|| Error::VersionMismatch {
                left: self.text.clone(),
                right: other.text.clone(),
            })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Version::parse(s, None)
    }
}

/// Equality holds only when [`Version::compare`] succeeds with `Equal`.
impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        matches!(self.compare(other), Ok(Ordering::Equal))
    }
}

/// Incomparable versions (mismatched lengths, no fill) yield `None`, so every
/// ordering operator returns `false` for them.
impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.compare(other).ok()
    }
}
