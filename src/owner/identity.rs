//! Canonical owner identities.
//!
//! An identity is the set of raw buyer/seller records believed to denote
//! the same real-world person or company. Membership is append-only:
//! records are added by clustering or incremental assignment, and
//! splitting a cluster is a manual curation operation, never automatic.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::owner::institutional::InstitutionalCategory;
use crate::owner::record::{OwnerRecordRaw, SourceRef};
use crate::phone::NormalizedPhone;

/// Unique identifier for an owner identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerIdentityId(Uuid);

impl OwnerIdentityId {
    /// Creates a new random identity ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for OwnerIdentityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OwnerIdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether an identity is a person or an institution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnerKind {
    /// A natural person, eligible for fuzzy name linkage.
    Individual,

    /// An institution, matched by exact name only.
    Institutional {
        /// Detected category.
        category: InstitutionalCategory,
    },
}

/// A canonical owner: one person or company across many raw records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnerIdentity {
    /// Stable identifier.
    pub id: OwnerIdentityId,

    /// Display name chosen from the most frequent raw variant.
    pub representative_name: String,

    /// Person or institution.
    pub kind: OwnerKind,

    /// Every canonical phone seen across member records.
    pub phones: BTreeSet<NormalizedPhone>,

    /// Every raw name variant seen across member records.
    pub name_variants: BTreeSet<String>,

    /// References to the member records; append-only.
    pub member_record_ids: BTreeSet<SourceRef>,

    /// Set when merge evidence conflicted; cleared only by manual review.
    pub needs_verification: bool,

    /// When the identity was first created.
    pub created_at: DateTime<Utc>,

    /// When a member was last added or a flag changed.
    pub updated_at: DateTime<Utc>,
}

impl OwnerIdentity {
    /// Creates an empty identity.
    #[must_use]
    pub fn new(representative_name: impl Into<String>, kind: OwnerKind) -> Self {
        let now = Utc::now();
        Self {
            id: OwnerIdentityId::new(),
            representative_name: representative_name.into(),
            kind,
            phones: BTreeSet::new(),
            name_variants: BTreeSet::new(),
            member_record_ids: BTreeSet::new(),
            needs_verification: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Absorbs one raw record: phone, name variant, membership.
    pub fn absorb(&mut self, record: &OwnerRecordRaw) {
        if let Some(phone) = &record.normalized_phone {
            self.phones.insert(phone.clone());
        }
        self.name_variants.insert(record.raw_name.clone());
        self.member_record_ids.insert(record.source_ref.clone());
        self.updated_at = Utc::now();
    }

    /// Flags the identity for manual verification.
    pub fn flag_for_verification(&mut self) {
        if !self.needs_verification {
            self.needs_verification = true;
            self.updated_at = Utc::now();
        }
    }

    /// Number of member records.
    #[must_use]
    pub fn member_count(&self) -> usize {
        self.member_record_ids.len()
    }

    /// Returns true if the identity is institutional.
    #[must_use]
    pub const fn is_institutional(&self) -> bool {
        matches!(self.kind, OwnerKind::Institutional { .. })
    }
}

impl Eq for OwnerIdentity {}

impl std::hash::Hash for OwnerIdentity {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
