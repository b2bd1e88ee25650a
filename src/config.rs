//! Engine configuration.
//!
//! Every tunable threshold in the engine lives here so behavior is explicit
//! and testable: matcher similarity floor, the epsilon for scope ties,
//! linkage thresholds for owner clustering, and the phone numbering plan.
//! All sections have defaults matching the production data the engine was
//! built against.

use serde::{Deserialize, Serialize};

use crate::phone::CountryProfile;

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Fuzzy matcher tunables.
    pub matcher: MatcherConfig,

    /// Location resolver tunables.
    pub resolver: ResolverConfig,

    /// Owner clustering tunables.
    pub clustering: ClusteringConfig,

    /// Phone numbering plan.
    pub phone: CountryProfile,
}

impl EngineConfig {
    /// Parses a configuration from a JSON document.
    ///
    /// Missing fields take their defaults, so `{}` is a valid config.
    ///
    /// # Errors
    ///
    /// Returns the underlying serde error for malformed JSON or
    /// out-of-range confidence values.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Fuzzy matcher tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Minimum combined score an alias candidate must reach.
    pub min_similarity: f32,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            min_similarity: 0.6,
        }
    }
}

/// Location resolver tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Score gap within which a building-scope and a community-scope
    /// interpretation count as tied.
    pub scope_epsilon: f32,

    /// Confidence assigned when a unit-only query resolves through store
    /// uniqueness, with no alias match involved.
    pub unit_only_confidence: f32,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            scope_epsilon: 0.05,
            unit_only_confidence: 0.9,
        }
    }
}

/// Owner clustering tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    /// Minimum edge confidence for an automatic merge. Edges below this are
    /// retained as weak evidence and flag `needs_verification`.
    pub auto_merge_threshold: f32,

    /// Confidence assigned to a name-similarity link where no phone
    /// conflict exists.
    pub name_link_confidence: f32,

    /// Minimum name similarity for a name link to exist at all.
    pub name_similarity_threshold: f32,

    /// Shard count for parallel linkage within one batch run.
    pub shards: usize,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            auto_merge_threshold: 0.9,
            name_link_confidence: 0.75,
            name_similarity_threshold: 0.85,
            shards: 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.matcher.min_similarity, 0.6);
        assert_eq!(config.resolver.scope_epsilon, 0.05);
        assert_eq!(config.clustering.auto_merge_threshold, 0.9);
        assert_eq!(config.clustering.shards, 4);
        assert_eq!(config.phone.country_code, "971");
    }

    #[test]
    fn test_empty_json_is_default() {
        let config = EngineConfig::from_json_str("{}").unwrap();
        assert_eq!(config.matcher.min_similarity, 0.6);
    }

    #[test]
    fn test_partial_override() {
        let config = EngineConfig::from_json_str(
            r#"{"matcher": {"min_similarity": 0.7}, "clustering": {"shards": 8}}"#,
        )
        .unwrap();
        assert_eq!(config.matcher.min_similarity, 0.7);
        assert_eq!(config.clustering.shards, 8);
        // Untouched sections keep defaults.
        assert_eq!(config.clustering.auto_merge_threshold, 0.9);
        assert_eq!(config.resolver.unit_only_confidence, 0.9);
    }

    #[test]
    fn test_malformed_json_rejected() {
        assert!(EngineConfig::from_json_str("{not json").is_err());
    }
}
