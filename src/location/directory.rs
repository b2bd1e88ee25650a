//! The canonical location hierarchy.
//!
//! The directory records which canonical buildings belong to which
//! communities. It is what lets a building-scope alias hit produce a fully
//! qualified [`CanonicalLocation`] without a store round-trip, and what the
//! registry uses to reject dangling building aliases at snapshot build.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::location::types::CanonicalLocation;
use crate::text::normalize_text;

/// Parent pointers for one canonical building.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentRef {
    /// The master community containing the building.
    pub master_community: String,

    /// Optional sub-community between building and master.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_community: Option<String>,
}

/// Canonical communities and buildings with their parent links.
///
/// Keys are normalized names, so lookups are insensitive to case and
/// punctuation; stored values keep the canonical spelling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationDirectory {
    communities: BTreeMap<String, String>,
    buildings: BTreeMap<String, (String, ParentRef)>,
}

impl LocationDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a canonical community.
    pub fn add_community(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.communities.insert(normalize_text(&name), name);
    }

    /// Registers a canonical building under its parent community.
    ///
    /// The parent community is registered implicitly if absent.
    pub fn add_building(
        &mut self,
        building: impl Into<String>,
        master_community: impl Into<String>,
        sub_community: Option<String>,
    ) {
        let building = building.into();
        let master_community = master_community.into();
        if !self.communities.contains_key(&normalize_text(&master_community)) {
            self.add_community(master_community.clone());
        }
        self.buildings.insert(
            normalize_text(&building),
            (
                building,
                ParentRef {
                    master_community,
                    sub_community,
                },
            ),
        );
    }

    /// Returns true if the canonical community is known.
    #[must_use]
    pub fn contains_community(&self, name: &str) -> bool {
        self.communities.contains_key(&normalize_text(name))
    }

    /// Returns the parent of a canonical building, if known.
    #[must_use]
    pub fn parent_of(&self, building: &str) -> Option<&ParentRef> {
        self.buildings
            .get(&normalize_text(building))
            .map(|(_, parent)| parent)
    }

    /// Builds a fully qualified location for a canonical building.
    #[must_use]
    pub fn location_for_building(&self, building: &str) -> Option<CanonicalLocation> {
        let (canonical, parent) = self.buildings.get(&normalize_text(building))?;
        Some(CanonicalLocation::building(
            parent.master_community.clone(),
            parent.sub_community.clone(),
            canonical.clone(),
        ))
    }

    /// Number of registered buildings.
    #[must_use]
    pub fn building_count(&self) -> usize {
        self.buildings.len()
    }

    /// Number of registered communities.
    #[must_use]
    pub fn community_count(&self) -> usize {
        self.communities.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_lookup_building() {
        let mut dir = LocationDirectory::new();
        dir.add_building("Seven Palm", "Palm Jumeirah", None);

        let parent = dir.parent_of("Seven Palm").unwrap();
        assert_eq!(parent.master_community, "Palm Jumeirah");

        // Lookup is normalization-insensitive.
        assert!(dir.parent_of("seven palm").is_some());
        assert!(dir.parent_of("SEVEN  PALM!").is_some());
        assert!(dir.parent_of("Marina Gate").is_none());
    }

    #[test]
    fn test_parent_community_registered_implicitly() {
        let mut dir = LocationDirectory::new();
        dir.add_building("Seven Palm", "Palm Jumeirah", None);
        assert!(dir.contains_community("Palm Jumeirah"));
        assert_eq!(dir.community_count(), 1);
        assert_eq!(dir.building_count(), 1);
    }

    #[test]
    fn test_location_for_building_with_sub_community() {
        let mut dir = LocationDirectory::new();
        dir.add_building(
            "Seven Palm",
            "Palm Jumeirah",
            Some("The Crescent".to_string()),
        );

        let loc = dir.location_for_building("Seven Palm").unwrap();
        assert_eq!(loc.master_community, "Palm Jumeirah");
        assert_eq!(loc.sub_community.as_deref(), Some("The Crescent"));
        assert_eq!(loc.building.as_deref(), Some("Seven Palm"));
    }

    #[test]
    fn test_canonical_spelling_preserved() {
        let mut dir = LocationDirectory::new();
        dir.add_building("SEVEN HOTEL & APARTMENTS THE PALM", "Palm Jumeirah", None);
        let loc = dir
            .location_for_building("seven hotel apartments the palm")
            .unwrap();
        assert_eq!(
            loc.building.as_deref(),
            Some("SEVEN HOTEL & APARTMENTS THE PALM")
        );
    }
}
