//! Phone number normalization.
//!
//! Raw buyer/seller phone strings arrive in every imaginable shape:
//! `"050 123 4567"`, `"+97150-123-4567"`, `"971501234567"`. Normalization
//! rewrites all of them to one canonical `+<country><digits>` form so that
//! exact phone equality is a trustworthy linkage signal.
//!
//! Normalization is total and deterministic: every input, including `None`
//! and empty strings, produces a [`PhoneResolution`] without panicking, and
//! normalizing an already-normalized number is a no-op.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Digit-count and prefix rules for one national numbering plan.
///
/// The engine defaults to the UAE plan (`+971`, nine national digits,
/// trunk prefix `0`), matching the data it was built for; other plans are a
/// constructor away.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryProfile {
    /// Country calling code, digits only (no `+`).
    pub country_code: String,

    /// Length of a national subscriber number, excluding trunk prefix.
    pub national_len: usize,

    /// National trunk prefix dialled before local numbers.
    pub trunk_prefix: char,
}

impl CountryProfile {
    /// The UAE numbering plan: `0501234567` ⇔ `+971501234567`.
    #[must_use]
    pub fn uae() -> Self {
        Self {
            country_code: "971".to_string(),
            national_len: 9,
            trunk_prefix: '0',
        }
    }
}

impl Default for CountryProfile {
    fn default() -> Self {
        Self::uae()
    }
}

/// A phone number in canonical `+<country><digits>` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedPhone(String);

impl NormalizedPhone {
    /// Returns the canonical string, e.g. `"+971501234567"`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NormalizedPhone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why a non-empty phone string failed normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhoneInvalidReason {
    /// The string contained no digits at all.
    NoDigits,

    /// Fewer digits than a national number.
    TooShort {
        /// Digit count found.
        digits: usize,
    },

    /// More digits than a full international number.
    TooLong {
        /// Digit count found.
        digits: usize,
    },

    /// Digit count plausible, but no recognized trunk/country prefix shape.
    UnrecognizedFormat {
        /// Digit count found.
        digits: usize,
    },
}

impl fmt::Display for PhoneInvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoDigits => write!(f, "no digits"),
            Self::TooShort { digits } => write!(f, "too short ({digits} digits)"),
            Self::TooLong { digits } => write!(f, "too long ({digits} digits)"),
            Self::UnrecognizedFormat { digits } => {
                write!(f, "unrecognized format ({digits} digits)")
            }
        }
    }
}

/// Outcome of phone normalization.
///
/// Absence of input is not an error, and malformed input is not an
/// exception: both are ordinary values the caller must handle. An invalid
/// phone keeps the raw string for audit; it is never discarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhoneResolution {
    /// Canonical form produced.
    Normalized(NormalizedPhone),

    /// Input present but not a valid number under the profile.
    Invalid {
        /// The original input, preserved verbatim.
        raw: String,
        /// Why it was rejected.
        reason: PhoneInvalidReason,
    },

    /// No input (null or empty string).
    None,
}

impl PhoneResolution {
    /// Returns the normalized phone, if any.
    #[must_use]
    pub fn normalized(&self) -> Option<&NormalizedPhone> {
        match self {
            Self::Normalized(phone) => Some(phone),
            Self::Invalid { .. } | Self::None => None,
        }
    }
}

/// Normalizer bound to one [`CountryProfile`].
#[derive(Debug, Clone, Default)]
pub struct PhoneNormalizer {
    profile: CountryProfile,
}

impl PhoneNormalizer {
    /// Creates a normalizer for the given numbering plan.
    #[must_use]
    pub fn new(profile: CountryProfile) -> Self {
        Self { profile }
    }

    /// Normalizes a raw phone string.
    pub fn resolve(&self, raw: Option<&str>) -> PhoneResolution {
        let Some(raw) = raw else {
            return PhoneResolution::None;
        };
        if raw.trim().is_empty() {
            return PhoneResolution::None;
        }

        let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
        if digits.is_empty() {
            return PhoneResolution::Invalid {
                raw: raw.to_string(),
                reason: PhoneInvalidReason::NoDigits,
            };
        }

        let cc = &self.profile.country_code;
        let national = self.profile.national_len;
        let international_len = cc.len() + national;

        // Already carries the country code, with or without '+'.
        if digits.len() == international_len && digits.starts_with(cc.as_str()) {
            return PhoneResolution::Normalized(NormalizedPhone(format!("+{digits}")));
        }

        // National trunk form: leading 0 plus a full national number.
        if digits.len() == national + 1
            && digits.starts_with(self.profile.trunk_prefix)
        {
            return PhoneResolution::Normalized(NormalizedPhone(format!(
                "+{cc}{}",
                &digits[1..]
            )));
        }

        // Bare national number.
        if digits.len() == national {
            return PhoneResolution::Normalized(NormalizedPhone(format!("+{cc}{digits}")));
        }

        let reason = if digits.len() < national {
            PhoneInvalidReason::TooShort {
                digits: digits.len(),
            }
        } else if digits.len() > international_len {
            PhoneInvalidReason::TooLong {
                digits: digits.len(),
            }
        } else {
            PhoneInvalidReason::UnrecognizedFormat {
                digits: digits.len(),
            }
        };

        PhoneResolution::Invalid {
            raw: raw.to_string(),
            reason,
        }
    }

    /// Returns true if two raw phones normalize to the same canonical form.
    ///
    /// Invalid or absent phones never match anything.
    #[must_use]
    pub fn phones_match(&self, a: Option<&str>, b: Option<&str>) -> bool {
        match (self.resolve(a), self.resolve(b)) {
            (PhoneResolution::Normalized(pa), PhoneResolution::Normalized(pb)) => pa == pb,
            _ => false,
        }
    }
}

/// Normalizes a raw phone string under the default (UAE) profile.
#[must_use]
pub fn resolve_phone(raw: Option<&str>) -> PhoneResolution {
    PhoneNormalizer::default().resolve(raw)
}
