//! Raw owner records as the ingestion pipeline supplies them.
//!
//! One record per transaction side (buyer or seller). Construction
//! normalizes the name and phone once so linkage never re-derives them.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::phone::{NormalizedPhone, PhoneNormalizer, PhoneResolution};

/// Which side of a transaction a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionSide {
    /// The buying party.
    Buyer,

    /// The selling party.
    Seller,
}

impl fmt::Display for TransactionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buyer => write!(f, "buyer"),
            Self::Seller => write!(f, "seller"),
        }
    }
}

/// Stable reference to the ingested transaction side a record came from.
///
/// Ordered by `(recorded_at, transaction_id, side)` so "most recent
/// source ref" tie-breaks are well-defined and deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceRef {
    /// When the transaction was recorded upstream.
    pub recorded_at: DateTime<Utc>,

    /// Upstream transaction identifier.
    pub transaction_id: String,

    /// Buyer or seller side.
    pub side: TransactionSide,
}

impl SourceRef {
    /// Creates a source reference.
    #[must_use]
    pub fn new(
        transaction_id: impl Into<String>,
        side: TransactionSide,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            recorded_at,
            transaction_id: transaction_id.into(),
            side,
        }
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.transaction_id, self.side)
    }
}

/// Legal-entity suffixes dropped during name normalization so
/// "EMAAR PROPERTIES LLC" and "EMAAR PROPERTIES" compare equal.
const LEGAL_SUFFIXES: &[&str] = &["LLC", "LLP", "LIMITED", "LTD", "CO", "COMPANY", "INC"];

/// Normalizes an owner name for matching: uppercase, punctuation dropped,
/// whitespace collapsed, trailing legal suffixes removed.
#[must_use]
pub fn normalize_owner_name(raw: &str) -> String {
    // Periods join abbreviations ("L.L.C" -> "LLC") rather than splitting.
    let upper: String = raw.to_uppercase().replace('.', "");

    upper
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .filter(|t| !LEGAL_SUFFIXES.contains(t))
        .collect::<Vec<_>>()
        .join(" ")
}

/// One raw buyer/seller record, normalized at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnerRecordRaw {
    /// Name exactly as ingested.
    pub raw_name: String,

    /// Phone exactly as ingested, if any.
    pub raw_phone: Option<String>,

    /// Name normalized for matching.
    pub normalized_name: String,

    /// Phone in canonical form; absent when missing or invalid.
    pub normalized_phone: Option<NormalizedPhone>,

    /// Where the record came from.
    pub source_ref: SourceRef,
}

impl OwnerRecordRaw {
    /// Builds a record, normalizing name and phone.
    ///
    /// An invalid phone does not fail the record: linkage simply treats it
    /// as absent, and the raw value stays on the record for audit.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyName` if the name normalizes to
    /// nothing.
    pub fn new(
        raw_name: impl Into<String>,
        raw_phone: Option<&str>,
        source_ref: SourceRef,
        normalizer: &PhoneNormalizer,
    ) -> Result<Self, ValidationError> {
        let raw_name = raw_name.into();
        let normalized_name = normalize_owner_name(&raw_name);
        if normalized_name.is_empty() {
            return Err(ValidationError::EmptyName);
        }

        let normalized_phone = match normalizer.resolve(raw_phone) {
            PhoneResolution::Normalized(phone) => Some(phone),
            PhoneResolution::Invalid { .. } | PhoneResolution::None => None,
        };

        Ok(Self {
            raw_name,
            raw_phone: raw_phone.map(str::to_string),
            normalized_name,
            normalized_phone,
            source_ref,
        })
    }

    /// Returns true if the record carries a usable phone.
    #[must_use]
    pub fn has_phone(&self) -> bool {
        self.normalized_phone.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn source(id: &str) -> SourceRef {
        SourceRef::new(
            id,
            TransactionSide::Buyer,
            Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_normalize_owner_name() {
        assert_eq!(normalize_owner_name("Mohammed Ahmed"), "MOHAMMED AHMED");
        assert_eq!(normalize_owner_name("  mohammed   ahmed "), "MOHAMMED AHMED");
        assert_eq!(
            normalize_owner_name("EMAAR PROPERTIES L.L.C"),
            "EMAAR PROPERTIES"
        );
        assert_eq!(normalize_owner_name("Acme Holding Ltd."), "ACME HOLDING");
    }

    #[test]
    fn test_record_normalizes_phone() {
        let record = OwnerRecordRaw::new(
            "Mohammed Ahmed",
            Some("050 123 4567"),
            source("t1"),
            &PhoneNormalizer::default(),
        )
        .unwrap();
        assert_eq!(
            record.normalized_phone.as_ref().unwrap().as_str(),
            "+971501234567"
        );
        assert!(record.has_phone());
    }

    #[test]
    fn test_invalid_phone_kept_raw_but_unusable() {
        let record = OwnerRecordRaw::new(
            "Mohammed Ahmed",
            Some("12345"),
            source("t1"),
            &PhoneNormalizer::default(),
        )
        .unwrap();
        assert_eq!(record.raw_phone.as_deref(), Some("12345"));
        assert!(!record.has_phone());
    }

    #[test]
    fn test_empty_name_rejected() {
        let result = OwnerRecordRaw::new(
            "  ...  ",
            None,
            source("t1"),
            &PhoneNormalizer::default(),
        );
        assert!(matches!(result, Err(ValidationError::EmptyName)));
    }

    #[test]
    fn test_source_ref_ordering_by_time() {
        let older = SourceRef::new(
            "t1",
            TransactionSide::Buyer,
            Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
        );
        let newer = SourceRef::new(
            "t2",
            TransactionSide::Seller,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        );
        assert!(older < newer);
    }
}
