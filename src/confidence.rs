//! Confidence scores for alias mappings and owner merges.
//!
//! A [`Confidence`] is a validated value in `[0.0, 1.0]`. Curator-assigned
//! alias confidence and linkage edge weights share this type so thresholds
//! compare like with like.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A validated certainty score in `[0.0, 1.0]`.
///
/// # Examples
///
/// ```
/// use canoniq::Confidence;
///
/// let conf = Confidence::new(0.95).unwrap();
/// assert_eq!(conf.value(), 0.95);
/// assert!(Confidence::new(1.5).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f32", into = "f32")]
pub struct Confidence(f32);

impl Confidence {
    /// Minimum valid confidence value.
    pub const MIN_VALUE: f32 = 0.0;

    /// Maximum valid confidence value.
    pub const MAX_VALUE: f32 = 1.0;

    /// Creates a new confidence with validation.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::ConfidenceOutOfRange` if the value is NaN
    /// or not in [0.0, 1.0].
    pub fn new(value: f32) -> Result<Self, ValidationError> {
        if value.is_nan() || !(Self::MIN_VALUE..=Self::MAX_VALUE).contains(&value) {
            return Err(ValidationError::ConfidenceOutOfRange { value });
        }
        Ok(Self(value))
    }

    /// Creates a confidence by clamping into range; NaN clamps to zero.
    ///
    /// For scores computed from float arithmetic where a validation error
    /// would be noise.
    #[must_use]
    pub fn clamped(value: f32) -> Self {
        if value.is_nan() {
            return Self::zero();
        }
        Self(value.clamp(Self::MIN_VALUE, Self::MAX_VALUE))
    }

    /// Creates a zero confidence (complete uncertainty).
    #[must_use]
    pub const fn zero() -> Self {
        Self(0.0)
    }

    /// Creates a full confidence (complete certainty).
    #[must_use]
    pub const fn one() -> Self {
        Self(1.0)
    }

    /// Returns the underlying value.
    #[must_use]
    pub const fn value(&self) -> f32 {
        self.0
    }

    /// Returns true if this confidence is at or above the given threshold.
    #[must_use]
    pub fn clears(&self, threshold: Self) -> bool {
        self.0 >= threshold.0
    }
}

impl Default for Confidence {
    fn default() -> Self {
        Self::zero()
    }
}

impl Eq for Confidence {}

// NaN is rejected at construction, so a total order exists.
impl Ord for Confidence {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.partial_cmp(&other.0).unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for Confidence {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl TryFrom<f32> for Confidence {
    type Error = ValidationError;

    fn try_from(value: f32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Confidence> for f32 {
    fn from(conf: Confidence) -> Self {
        conf.0
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_valid_values() {
        assert!(Confidence::new(0.0).is_ok());
        assert!(Confidence::new(0.5).is_ok());
        assert!(Confidence::new(1.0).is_ok());
    }

    #[test]
    fn test_confidence_invalid_values() {
        assert!(Confidence::new(-0.1).is_err());
        assert!(Confidence::new(1.1).is_err());
        assert!(Confidence::new(f32::NAN).is_err());
    }

    #[test]
    fn test_confidence_ordering() {
        let low = Confidence::new(0.3).unwrap();
        let high = Confidence::new(0.9).unwrap();
        assert!(low < high);
        assert!(high.clears(low));
        assert!(!low.clears(high));
        assert!(high.clears(high));
    }

    #[test]
    fn test_confidence_clamped() {
        assert_eq!(Confidence::clamped(1.7), Confidence::one());
        assert_eq!(Confidence::clamped(-0.3), Confidence::zero());
        assert_eq!(Confidence::clamped(f32::NAN), Confidence::zero());
        assert_eq!(Confidence::clamped(0.4).value(), 0.4);
    }

    #[test]
    fn test_confidence_zero_and_one() {
        assert_eq!(Confidence::zero().value(), 0.0);
        assert_eq!(Confidence::one().value(), 1.0);
    }

    #[test]
    fn test_confidence_serde_is_plain_float() {
        let conf = Confidence::new(0.75).unwrap();
        let json = serde_json::to_string(&conf).unwrap();
        assert_eq!(json, "0.75");

        let decoded: Confidence = serde_json::from_str("0.75").unwrap();
        assert_eq!(decoded, conf);

        let rejected: Result<Confidence, _> = serde_json::from_str("1.5");
        assert!(rejected.is_err());
    }

    #[test]
    fn test_confidence_display() {
        let conf = Confidence::new(0.85).unwrap();
        assert_eq!(format!("{conf}"), "0.85");
    }
}
