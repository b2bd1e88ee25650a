//! Alias entries: free-text variants mapped to canonical names.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::confidence::Confidence;
use crate::error::ValidationError;
use crate::text::normalize_text;

/// The entity category an alias applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Master community or sub-community names.
    Community,

    /// Building names.
    Building,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Community => write!(f, "community"),
            Self::Building => write!(f, "building"),
        }
    }
}

/// Where an alias mapping came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AliasProvenance {
    /// Curated by a human.
    Manual,

    /// Imported from an ingested dataset.
    Ingested,

    /// Proposed by an upstream inference process.
    Inferred,
}

/// One alias → canonical mapping with curator-assigned confidence.
///
/// The unique key is `(normalized_alias, scope)`: upserting the same key
/// replaces the entry, never duplicates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AliasEntry {
    /// The alias as supplied, original casing preserved.
    pub alias: String,

    /// The normalized form used as the match key.
    pub normalized_alias: String,

    /// The canonical name this alias maps to.
    pub canonical: String,

    /// Which entity category the mapping applies to.
    pub scope: Scope,

    /// Curator-assigned certainty of the mapping.
    pub confidence: Confidence,

    /// Where the mapping came from.
    pub provenance: AliasProvenance,

    /// Last time the mapping was created or replaced.
    pub updated_at: DateTime<Utc>,
}

impl AliasEntry {
    /// Creates a validated entry, computing the normalized key.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyAlias` or `EmptyCanonical` when
    /// either string normalizes to nothing.
    pub fn new(
        alias: impl Into<String>,
        canonical: impl Into<String>,
        scope: Scope,
        confidence: Confidence,
        provenance: AliasProvenance,
    ) -> Result<Self, ValidationError> {
        let alias = alias.into();
        let canonical = canonical.into();

        let normalized_alias = normalize_text(&alias);
        if normalized_alias.is_empty() {
            return Err(ValidationError::EmptyAlias);
        }
        if canonical.trim().is_empty() {
            return Err(ValidationError::EmptyCanonical);
        }

        Ok(Self {
            alias,
            normalized_alias,
            canonical,
            scope,
            confidence,
            provenance,
            updated_at: Utc::now(),
        })
    }
}
