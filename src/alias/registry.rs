//! Alias catalog, immutable registry snapshots, and the shared handle.
//!
//! The catalog is the mutable curation surface: `upsert_alias` replaces on
//! the `(normalized_alias, scope)` key. A [`AliasRegistry`] is an immutable
//! snapshot built from the catalog plus the location directory; resolutions
//! run against a snapshot and never observe curation in progress. The
//! [`SharedRegistry`] swaps snapshots atomically on explicit reload.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use tracing::info;

use crate::alias::entry::{AliasEntry, AliasProvenance, Scope};
use crate::confidence::Confidence;
use crate::error::ValidationError;
use crate::location::directory::LocationDirectory;
use crate::text::normalize_text;

/// Mutable alias curation surface.
///
/// Backed by an ordered map so snapshot construction is deterministic.
#[derive(Debug, Clone, Default)]
pub struct AliasCatalog {
    entries: BTreeMap<(Scope, String), AliasEntry>,
}

impl AliasCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the mapping for `(alias, scope)`.
    ///
    /// Idempotent under the same key: upserting twice leaves exactly one
    /// entry reflecting the latest values.
    ///
    /// # Errors
    ///
    /// Returns a validation error for empty alias/canonical strings.
    pub fn upsert_alias(
        &mut self,
        alias: impl Into<String>,
        canonical: impl Into<String>,
        scope: Scope,
        confidence: Confidence,
        provenance: AliasProvenance,
    ) -> Result<(), ValidationError> {
        let entry = AliasEntry::new(alias, canonical, scope, confidence, provenance)?;
        self.entries
            .insert((scope, entry.normalized_alias.clone()), entry);
        Ok(())
    }

    /// Number of distinct `(normalized_alias, scope)` keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the catalog holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Builds an immutable snapshot against the given location directory.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::DanglingBuilding` if a building-scope
    /// alias maps to a canonical with no parent community in the directory.
    pub fn snapshot(
        &self,
        directory: &LocationDirectory,
    ) -> Result<AliasRegistry, ValidationError> {
        for entry in self.entries.values() {
            if entry.scope == Scope::Building && directory.parent_of(&entry.canonical).is_none() {
                return Err(ValidationError::DanglingBuilding {
                    building: entry.canonical.clone(),
                });
            }
        }

        let entries: Vec<AliasEntry> = self.entries.values().cloned().collect();

        let mut exact = HashMap::with_capacity(entries.len());
        let mut token_index: HashMap<(Scope, String), Vec<usize>> = HashMap::new();
        for (idx, entry) in entries.iter().enumerate() {
            exact.insert((entry.scope, entry.normalized_alias.clone()), idx);
            for token in entry.normalized_alias.split_whitespace() {
                token_index
                    .entry((entry.scope, token.to_string()))
                    .or_default()
                    .push(idx);
            }
        }

        info!(
            aliases = entries.len(),
            buildings = directory.building_count(),
            communities = directory.community_count(),
            "built alias registry snapshot"
        );

        Ok(AliasRegistry {
            entries,
            exact,
            token_index,
            directory: directory.clone(),
        })
    }
}

/// Immutable per-session registry snapshot.
///
/// Safe to share across any number of concurrent resolutions without
/// locking; it is never mutated after construction.
#[derive(Debug, Clone)]
pub struct AliasRegistry {
    pub(crate) entries: Vec<AliasEntry>,
    pub(crate) exact: HashMap<(Scope, String), usize>,
    pub(crate) token_index: HashMap<(Scope, String), Vec<usize>>,
    directory: LocationDirectory,
}

impl AliasRegistry {
    /// An empty registry with an empty directory.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
            exact: HashMap::new(),
            token_index: HashMap::new(),
            directory: LocationDirectory::new(),
        }
    }

    /// The location hierarchy this snapshot was built against.
    #[must_use]
    pub fn directory(&self) -> &LocationDirectory {
        &self.directory
    }

    /// All entries, ordered by `(scope, normalized_alias)`.
    #[must_use]
    pub fn entries(&self) -> &[AliasEntry] {
        &self.entries
    }

    /// Number of alias entries in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the snapshot holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reverse lookup: all aliases registered for a canonical name.
    #[must_use]
    pub fn aliases_of(&self, canonical: &str, scope: Scope) -> Vec<&AliasEntry> {
        self.entries
            .iter()
            .filter(|e| e.scope == scope && e.canonical.eq_ignore_ascii_case(canonical))
            .collect()
    }

    /// Finds the longest alias mentioned inside a longer sentence.
    ///
    /// Used when free text embeds a location reference rather than being
    /// one ("looking for something around the marina"). Longest alias wins
    /// so `"dubai marina"` beats `"marina"`.
    #[must_use]
    pub fn infer_scope_mention(&self, text: &str, scope: Scope) -> Option<&AliasEntry> {
        let normalized = normalize_text(text);
        if normalized.is_empty() {
            return None;
        }
        let padded = format!(" {normalized} ");
        self.entries
            .iter()
            .filter(|e| e.scope == scope)
            .filter(|e| padded.contains(&format!(" {} ", e.normalized_alias)))
            .max_by(|a, b| {
                a.normalized_alias
                    .len()
                    .cmp(&b.normalized_alias.len())
                    .then_with(|| b.normalized_alias.cmp(&a.normalized_alias))
            })
    }
}

/// Shared handle over the current registry snapshot.
///
/// Resolutions grab an `Arc` to the current snapshot and keep using it for
/// their whole session; `reload` swaps the snapshot atomically and only
/// affects resolutions that start afterwards.
#[derive(Debug)]
pub struct SharedRegistry {
    inner: RwLock<Arc<AliasRegistry>>,
}

impl SharedRegistry {
    /// Wraps an initial snapshot.
    #[must_use]
    pub fn new(registry: AliasRegistry) -> Self {
        Self {
            inner: RwLock::new(Arc::new(registry)),
        }
    }

    /// Returns the current snapshot.
    ///
    /// # Panics
    ///
    /// Panics only if the inner lock was poisoned by a panicking writer.
    #[must_use]
    pub fn current(&self) -> Arc<AliasRegistry> {
        Arc::clone(&self.inner.read().expect("registry lock poisoned"))
    }

    /// Swaps in a new snapshot.
    ///
    /// # Panics
    ///
    /// Panics only if the inner lock was poisoned by a panicking writer.
    pub fn reload(&self, registry: AliasRegistry) {
        let aliases = registry.len();
        *self.inner.write().expect("registry lock poisoned") = Arc::new(registry);
        info!(aliases, "reloaded alias registry snapshot");
    }
}
