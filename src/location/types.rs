//! Canonical location types and resolution outcomes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::confidence::Confidence;

/// A fully qualified canonical location.
///
/// The hierarchy runs master community → optional sub-community → optional
/// building. A building never dangles: registry construction rejects any
/// building alias whose canonical has no parent in the location directory,
/// so every `building` here implies a resolvable `master_community`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CanonicalLocation {
    /// Top-level community, e.g. `"Palm Jumeirah"`.
    pub master_community: String,

    /// Optional sub-community, e.g. `"The Crescent"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_community: Option<String>,

    /// Optional building, e.g. `"SEVEN HOTEL & APARTMENTS THE PALM"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub building: Option<String>,
}

impl CanonicalLocation {
    /// A community-level location.
    #[must_use]
    pub fn community(master_community: impl Into<String>) -> Self {
        Self {
            master_community: master_community.into(),
            sub_community: None,
            building: None,
        }
    }

    /// A building-level location under the given parents.
    #[must_use]
    pub fn building(
        master_community: impl Into<String>,
        sub_community: Option<String>,
        building: impl Into<String>,
    ) -> Self {
        Self {
            master_community: master_community.into(),
            sub_community,
            building: Some(building.into()),
        }
    }

    /// The most specific name in the hierarchy.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.building
            .as_deref()
            .or(self.sub_community.as_deref())
            .unwrap_or(&self.master_community)
    }
}

impl fmt::Display for CanonicalLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(building) = &self.building {
            write!(f, "{building}, ")?;
        }
        if let Some(sub) = &self.sub_community {
            write!(f, "{sub}, ")?;
        }
        write!(f, "{}", self.master_community)
    }
}

/// One plausible candidate inside an ambiguous resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmbiguousCandidate {
    /// The candidate location.
    pub location: CanonicalLocation,

    /// How many properties matched the queried unit under this candidate
    /// (zero when no unit was involved).
    pub matched_unit_count: usize,

    /// A ready-to-present disambiguating phrase, e.g. `"905 at Seven Palm"`.
    pub example_phrase: String,
}

/// Outcome of a location resolution.
///
/// Ambiguity is a first-class output: when several canonical candidates are
/// equally plausible the engine never silently picks a winner. Callers must
/// handle all three variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionResult {
    /// Exactly one canonical interpretation cleared the threshold.
    Resolved {
        /// The resolved location.
        location: CanonicalLocation,
        /// Certainty of the match.
        confidence: Confidence,
    },

    /// Two or more canonical interpretations are plausible.
    Ambiguous {
        /// Every plausible candidate, no more and no fewer.
        candidates: Vec<AmbiguousCandidate>,
    },

    /// Nothing cleared the threshold and no store fallback applied.
    Unresolved,
}

impl ResolutionResult {
    /// Returns true for the `Resolved` variant.
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved { .. })
    }

    /// Returns true for the `Ambiguous` variant.
    #[must_use]
    pub const fn is_ambiguous(&self) -> bool {
        matches!(self, Self::Ambiguous { .. })
    }

    /// Returns the resolved location, if any.
    #[must_use]
    pub fn location(&self) -> Option<&CanonicalLocation> {
        match self {
            Self::Resolved { location, .. } => Some(location),
            Self::Ambiguous { .. } | Self::Unresolved => None,
        }
    }
}
