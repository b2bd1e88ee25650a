//! The location resolver.
//!
//! Composes the alias registry, the fuzzy matcher, and the property-store
//! hook into one call: free text plus an optional unit in, a
//! [`ResolutionResult`] out. Resolution is a pure function of the registry
//! snapshot and the inputs; repeated calls with an unchanged snapshot
//! return identical results, candidate ordering included.
//!
//! Building scope runs before community scope because building names are
//! the more specific signal. When both interpretations tie within epsilon,
//! the store arbitrates by unit; when the store cannot, the tie surfaces
//! as [`ResolutionResult::Ambiguous`] rather than a silently picked winner.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::alias::{AliasRegistry, Scope, ScoredAlias};
use crate::config::{EngineConfig, MatcherConfig, ResolverConfig};
use crate::confidence::Confidence;
use crate::location::store::{PropertyLookup, ScopeHint};
use crate::location::types::{AmbiguousCandidate, CanonicalLocation, ResolutionResult};
use crate::query::parse_property_query;
use crate::text::{normalize_text, strip_trailing_punctuation};

/// Resolves free-text location references against one registry snapshot.
pub struct LocationResolver {
    registry: Arc<AliasRegistry>,
    store: Arc<dyn PropertyLookup>,
    matcher: MatcherConfig,
    resolver: ResolverConfig,
}

/// One scope interpretation that cleared the threshold.
struct Interpretation {
    location: CanonicalLocation,
    scope: Scope,
    score: f32,
}

impl LocationResolver {
    /// Creates a resolver over a registry snapshot and a store hook.
    #[must_use]
    pub fn new(
        registry: Arc<AliasRegistry>,
        store: Arc<dyn PropertyLookup>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            registry,
            store,
            matcher: config.matcher.clone(),
            resolver: config.resolver.clone(),
        }
    }

    /// The registry snapshot this resolver reads.
    #[must_use]
    pub fn registry(&self) -> &AliasRegistry {
        &self.registry
    }

    /// Resolves free text (plus an optional unit) to a canonical location.
    ///
    /// Never fails: empty input, zero matches, and store outages all map to
    /// the `Unresolved`/`Ambiguous` variants per the error-handling policy.
    #[must_use]
    pub fn resolve_location(&self, free_text: &str, unit: Option<&str>) -> ResolutionResult {
        let text = strip_trailing_punctuation(free_text);
        let parsed = parse_property_query(text);

        // An explicitly supplied unit wins over one parsed out of the text.
        let unit_owned = unit
            .map(|u| strip_trailing_punctuation(u).to_string())
            .filter(|u| !u.is_empty())
            .or(parsed.unit);
        let unit = unit_owned.as_deref();

        // Try the parsed location span first, then the whole text: parsing
        // can shred an alias that itself starts with digits ("7 Palm").
        let mut location_texts: Vec<String> = Vec::new();
        if let Some(span) = parsed.location {
            location_texts.push(span);
        }
        let whole = text.trim();
        let whole_is_unit = unit
            .map_or(false, |u| normalize_text(whole) == normalize_text(u));
        if !whole.is_empty()
            && !whole_is_unit
            && !location_texts
                .iter()
                .any(|t| normalize_text(t) == normalize_text(whole))
        {
            location_texts.push(whole.to_string());
        }

        for loc_text in &location_texts {
            let result = self.resolve_by_alias(loc_text, unit);
            if !matches!(result, ResolutionResult::Unresolved) {
                return result;
            }
        }

        if let Some(unit) = unit {
            return self.resolve_by_unit_only(unit);
        }

        ResolutionResult::Unresolved
    }

    /// Counts store properties matching `unit` under a resolved location.
    ///
    /// Used by the disambiguation protocol to confirm that a resolved
    /// location really contains the queried unit.
    ///
    /// # Errors
    ///
    /// Propagates the store's `LookupError`; callers choose how to degrade.
    pub fn unit_match_count(
        &self,
        location: &CanonicalLocation,
        unit: &str,
    ) -> Result<usize, crate::error::LookupError> {
        let hint = match &location.building {
            Some(building) => ScopeHint::Building(building.clone()),
            None => ScopeHint::Community(location.master_community.clone()),
        };
        Ok(self.store.lookup_by_unit(unit, Some(&hint))?.len())
    }

    /// Alias-driven resolution: building scope first, then community, with
    /// the cross-scope epsilon tie arbitrated by the store.
    fn resolve_by_alias(&self, loc_text: &str, unit: Option<&str>) -> ResolutionResult {
        let min = self.matcher.min_similarity;
        let epsilon = self.resolver.scope_epsilon;

        let building_hits = self.registry.resolve(loc_text, Scope::Building, min);
        let community_hits = self.registry.resolve(loc_text, Scope::Community, min);

        let building = self.leaders(&building_hits, Scope::Building);
        let community = self.leaders(&community_hits, Scope::Community);

        debug!(
            query = loc_text,
            building_candidates = building.len(),
            community_candidates = community.len(),
            "alias resolution"
        );

        match (building.first(), community.first()) {
            (Some(b), Some(c)) if (b.score - c.score).abs() <= epsilon => {
                self.arbitrate_scope_tie(building, community, unit)
            }
            // Building preference holds unless the community interpretation
            // is decisively stronger.
            (Some(b), Some(c)) if c.score > b.score + epsilon => {
                self.conclude_scope(community, unit)
            }
            (Some(_), _) => self.conclude_scope(building, unit),
            (None, Some(_)) => self.conclude_scope(community, unit),
            (None, None) => self.resolve_by_mention(loc_text),
        }
    }

    /// Last alias fallback: a known alias embedded in a longer sentence
    /// ("any villas in JVC?"). Exact substring hit, scored at the stored
    /// confidence.
    fn resolve_by_mention(&self, loc_text: &str) -> ResolutionResult {
        for scope in [Scope::Building, Scope::Community] {
            let Some(entry) = self.registry.infer_scope_mention(loc_text, scope) else {
                continue;
            };
            let location = match scope {
                Scope::Building => self
                    .registry
                    .directory()
                    .location_for_building(&entry.canonical),
                Scope::Community => Some(CanonicalLocation::community(entry.canonical.clone())),
            };
            if let Some(location) = location {
                debug!(alias = %entry.alias, %scope, "resolved via embedded mention");
                return ResolutionResult::Resolved {
                    location,
                    confidence: entry.confidence,
                };
            }
        }
        ResolutionResult::Unresolved
    }

    /// Candidates within epsilon of the scope's best score, mapped to
    /// fully qualified locations.
    fn leaders(&self, hits: &[ScoredAlias<'_>], scope: Scope) -> Vec<Interpretation> {
        let Some(top) = hits.first() else {
            return Vec::new();
        };
        let floor = top.score - self.resolver.scope_epsilon;
        hits.iter()
            .take_while(|hit| hit.score >= floor)
            .filter_map(|hit| {
                let location = match scope {
                    Scope::Building => self
                        .registry
                        .directory()
                        .location_for_building(&hit.entry.canonical)?,
                    Scope::Community => CanonicalLocation::community(hit.entry.canonical.clone()),
                };
                Some(Interpretation {
                    location,
                    scope,
                    score: hit.score,
                })
            })
            .collect()
    }

    /// Single-scope outcome: one leader resolves, several tie ambiguously.
    fn conclude_scope(
        &self,
        leaders: Vec<Interpretation>,
        unit: Option<&str>,
    ) -> ResolutionResult {
        match leaders.len() {
            0 => ResolutionResult::Unresolved,
            1 => {
                let interp = &leaders[0];
                ResolutionResult::Resolved {
                    location: interp.location.clone(),
                    confidence: Confidence::clamped(interp.score),
                }
            }
            _ => ResolutionResult::Ambiguous {
                candidates: leaders
                    .iter()
                    .map(|interp| self.candidate_for(interp, unit))
                    .collect(),
            },
        }
    }

    /// Cross-scope tie: the store arbitrates by unit when it can; both
    /// interpretations surface otherwise.
    fn arbitrate_scope_tie(
        &self,
        building: Vec<Interpretation>,
        community: Vec<Interpretation>,
        unit: Option<&str>,
    ) -> ResolutionResult {
        let tied: Vec<Interpretation> = building.into_iter().chain(community).collect();

        let Some(unit) = unit else {
            return self.ambiguous_over(&tied, None);
        };

        let mut matched: Vec<(usize, usize)> = Vec::new();
        for (idx, interp) in tied.iter().enumerate() {
            let hint = match interp.scope {
                Scope::Building => {
                    ScopeHint::Building(interp.location.building.clone().unwrap_or_default())
                }
                Scope::Community => {
                    ScopeHint::Community(interp.location.master_community.clone())
                }
            };
            match self.store.lookup_by_unit(unit, Some(&hint)) {
                Ok(rows) if !rows.is_empty() => matched.push((idx, rows.len())),
                Ok(_) => {}
                Err(err) => {
                    // Degrade: a dead store must not fail the call.
                    debug!(error = %err, "store unavailable during tie-break");
                    return self.ambiguous_over(&tied, Some(unit));
                }
            }
        }

        if let [(winner, count)] = matched.as_slice() {
            let interp = &tied[*winner];
            debug!(unit, matches = *count, "store arbitrated scope tie");
            return ResolutionResult::Resolved {
                location: interp.location.clone(),
                confidence: Confidence::clamped(interp.score),
            };
        }

        self.ambiguous_over(&tied, Some(unit))
    }

    fn ambiguous_over(
        &self,
        interpretations: &[Interpretation],
        unit: Option<&str>,
    ) -> ResolutionResult {
        ResolutionResult::Ambiguous {
            candidates: interpretations
                .iter()
                .map(|interp| self.candidate_for(interp, unit))
                .collect(),
        }
    }

    fn candidate_for(&self, interp: &Interpretation, unit: Option<&str>) -> AmbiguousCandidate {
        let name = interp.location.display_name().to_string();
        let matched_unit_count = unit
            .and_then(|u| {
                let hint = match interp.scope {
                    Scope::Building => ScopeHint::Building(name.clone()),
                    Scope::Community => ScopeHint::Community(name.clone()),
                };
                self.store.lookup_by_unit(u, Some(&hint)).ok()
            })
            .map_or(0, |rows| rows.len());
        let example_phrase = match unit {
            Some(u) => format!("{u} at {name}"),
            None => format!("in {name}"),
        };
        AmbiguousCandidate {
            location: interp.location.clone(),
            matched_unit_count,
            example_phrase,
        }
    }

    /// Unit-only resolution: the store enumerates every building containing
    /// the unit; uniqueness resolves, plurality surfaces in full.
    fn resolve_by_unit_only(&self, unit: &str) -> ResolutionResult {
        let rows = match self.store.lookup_by_unit(unit, None) {
            Ok(rows) => rows,
            Err(err) => {
                debug!(error = %err, unit, "store unavailable for unit-only lookup");
                return ResolutionResult::Unresolved;
            }
        };

        // Group by distinct (building, community); ordered for determinism.
        let mut by_building: BTreeMap<(String, String), usize> = BTreeMap::new();
        for row in &rows {
            *by_building
                .entry((row.building.clone(), row.community.clone()))
                .or_insert(0) += 1;
        }

        match by_building.len() {
            0 => ResolutionResult::Unresolved,
            1 => {
                let ((building, community), _) =
                    by_building.into_iter().next().unwrap_or_default();
                let location = self
                    .registry
                    .directory()
                    .location_for_building(&building)
                    .unwrap_or_else(|| {
                        CanonicalLocation::building(community, None, building)
                    });
                ResolutionResult::Resolved {
                    location,
                    confidence: Confidence::clamped(self.resolver.unit_only_confidence),
                }
            }
            _ => ResolutionResult::Ambiguous {
                candidates: by_building
                    .into_iter()
                    .map(|((building, community), count)| {
                        let location = self
                            .registry
                            .directory()
                            .location_for_building(&building)
                            .unwrap_or_else(|| {
                                CanonicalLocation::building(community, None, building.clone())
                            });
                        AmbiguousCandidate {
                            example_phrase: format!("{unit} at {building}"),
                            location,
                            matched_unit_count: count,
                        }
                    })
                    .collect(),
            },
        }
    }
}
