//! The external property-store hook.
//!
//! The location resolver is the only component allowed to touch the data
//! store, and only through this trait: unit tie-breaks and unit-only
//! disambiguation. The matcher and registry stay pure and in-memory.

use serde::{Deserialize, Serialize};

use crate::error::LookupError;
use crate::text::normalize_text;

/// A property row as the store reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyRef {
    /// Unit identifier within the building.
    pub unit: String,

    /// Canonical building name.
    pub building: String,

    /// Canonical master community name.
    pub community: String,
}

/// Narrows a unit lookup to one interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeHint {
    /// Restrict to properties in this building.
    Building(String),

    /// Restrict to properties in this community.
    Community(String),
}

/// Read-only query hook into the property store.
///
/// Implementations must return every property matching the unit under the
/// hint; the resolver's ambiguity guarantees depend on the result being
/// complete, not truncated.
pub trait PropertyLookup: Send + Sync {
    /// Finds properties by unit identifier, optionally narrowed by scope.
    ///
    /// # Errors
    ///
    /// Returns `LookupError` when the store is unreachable; the resolver
    /// degrades rather than propagating this to its caller.
    fn lookup_by_unit(
        &self,
        unit: &str,
        scope_hint: Option<&ScopeHint>,
    ) -> Result<Vec<PropertyRef>, LookupError>;
}

/// In-memory property index for tests and embedded use.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPropertyIndex {
    rows: Vec<PropertyRef>,
}

impl InMemoryPropertyIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one property row.
    pub fn insert(
        &mut self,
        unit: impl Into<String>,
        building: impl Into<String>,
        community: impl Into<String>,
    ) {
        self.rows.push(PropertyRef {
            unit: unit.into(),
            building: building.into(),
            community: community.into(),
        });
    }

    /// Number of rows in the index.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the index holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl PropertyLookup for InMemoryPropertyIndex {
    fn lookup_by_unit(
        &self,
        unit: &str,
        scope_hint: Option<&ScopeHint>,
    ) -> Result<Vec<PropertyRef>, LookupError> {
        let unit_key = normalize_text(unit);
        Ok(self
            .rows
            .iter()
            .filter(|row| normalize_text(&row.unit) == unit_key)
            .filter(|row| match scope_hint {
                Some(ScopeHint::Building(name)) => {
                    normalize_text(&row.building) == normalize_text(name)
                }
                Some(ScopeHint::Community(name)) => {
                    normalize_text(&row.community) == normalize_text(name)
                }
                None => true,
            })
            .cloned()
            .collect())
    }
}

/// A hook that always fails; exercises the degraded-store paths in tests.
#[derive(Debug, Clone, Default)]
pub struct UnavailableStore;

impl PropertyLookup for UnavailableStore {
    fn lookup_by_unit(
        &self,
        _unit: &str,
        _scope_hint: Option<&ScopeHint>,
    ) -> Result<Vec<PropertyRef>, LookupError> {
        Err(LookupError::Unavailable {
            message: "store offline".to_string(),
        })
    }
}
