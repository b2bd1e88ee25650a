//! Batch clustering and incremental assignment of owner records.
//!
//! The batch job links records with confidence-weighted edges (exact phone
//! at 1.0, fuzzy name at a configurable lower confidence), computes
//! connectivity with union-find over edges at or above the auto-merge
//! threshold, and emits identities plus an audit report of weak links and
//! conflicts. Records are sharded by phone hash for parallel linkage; one
//! sequential reconciliation pass picks up cross-shard name edges, since
//! phone-based sharding does not keep same-name records together.
//!
//! A run holds an exclusive lock against other runs, may execute
//! concurrently with resolution reads (which only see the last committed
//! snapshot), and cancels cooperatively at shard boundaries without
//! committing partial results.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::thread;

use chrono::{DateTime, Utc};
use crossbeam_channel::bounded;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ClusteringConfig;
use crate::confidence::Confidence;
use crate::error::ClusterError;
use crate::owner::identity::{OwnerIdentity, OwnerIdentityId, OwnerKind};
use crate::owner::institutional::classify;
use crate::owner::linkage::{LinkEdge, LinkEvidence, UnionFind};
use crate::owner::record::{normalize_owner_name, OwnerRecordRaw, SourceRef};
use crate::phone::NormalizedPhone;
use crate::text::similarity;

/// Cooperative cancellation flag for a batch run.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    inner: Arc<AtomicBool>,
}

impl CancelFlag {
    /// Creates a fresh, uncancelled flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation; the run stops at the next shard boundary.
    pub fn cancel(&self) {
        self.inner.store(true, Ordering::SeqCst);
    }

    /// Returns true once cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.load(Ordering::SeqCst)
    }
}

/// Two high-confidence merge decisions that contradict each other.
///
/// Recorded and flagged; the run continues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterConflict {
    /// One side of the contradiction.
    pub left: SourceRef,

    /// The other side.
    pub right: SourceRef,

    /// What contradicted.
    pub kind: ConflictKind,
}

/// The nature of a clustering contradiction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    /// Names demand a merge, phones forbid it.
    PhoneDisagreement {
        /// Phone on the left record.
        left_phone: NormalizedPhone,
        /// Phone on the right record.
        right_phone: NormalizedPhone,
        /// Name similarity that demanded the merge.
        name_similarity: f32,
    },

    /// A merge would have joined components holding disjoint phone sets.
    ComponentPhoneSplit {
        /// Name similarity of the joining edge.
        name_similarity: f32,
    },
}

/// A retained sub-threshold link; evidence, not a merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeakLink {
    /// One endpoint.
    pub left: SourceRef,

    /// The other endpoint.
    pub right: SourceRef,

    /// Edge weight, below the auto-merge threshold.
    pub confidence: Confidence,

    /// What produced the edge.
    pub evidence: LinkEvidence,
}

/// Counters for one batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    /// Records supplied to the run.
    pub records_in: usize,

    /// Records routed to person-style linkage.
    pub individual_records: usize,

    /// Records routed to exact-name institutional buckets.
    pub institutional_records: usize,

    /// Identities emitted.
    pub identities_out: usize,

    /// Edges that produced a merge.
    pub auto_merged_edges: usize,

    /// Sub-threshold edges retained as evidence.
    pub weak_links: usize,

    /// Contradictions recorded.
    pub conflicts: usize,

    /// Shards used for parallel linkage.
    pub shards: usize,
}

/// Everything one batch run produced, including the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterReport {
    /// Unique run identifier.
    pub run_id: Uuid,

    /// When the run started.
    pub started_at: DateTime<Utc>,

    /// When the run committed.
    pub finished_at: DateTime<Utc>,

    /// The identities, committed as the new snapshot.
    pub identities: Vec<OwnerIdentity>,

    /// Retained weak links for review.
    pub weak_links: Vec<WeakLink>,

    /// Contradictions surfaced during the run.
    pub conflicts: Vec<ClusterConflict>,

    /// Run counters.
    pub stats: RunStats,
}

/// Outcome of incrementally assigning one record.
#[derive(Debug, Clone, PartialEq)]
pub enum AssignOutcome {
    /// The record joined (or founded) this identity.
    Assigned(OwnerIdentity),

    /// Evidence was ambiguous or conflicting; the record was not assigned.
    NeedsVerification {
        /// Identities the record plausibly belongs to, flagged for review.
        candidates: Vec<OwnerIdentityId>,
    },
}

/// The clustering engine: batch runs plus incremental assignment over the
/// last committed identity snapshot.
pub struct ClusterEngine {
    config: ClusteringConfig,
    run_lock: Mutex<()>,
    committed: RwLock<Arc<Vec<OwnerIdentity>>>,
}

impl ClusterEngine {
    /// Creates an engine with an empty committed snapshot.
    #[must_use]
    pub fn new(config: ClusteringConfig) -> Self {
        Self {
            config,
            run_lock: Mutex::new(()),
            committed: RwLock::new(Arc::new(Vec::new())),
        }
    }

    /// The last fully committed identity snapshot.
    ///
    /// # Panics
    ///
    /// Panics only if the snapshot lock was poisoned by a panicking writer.
    #[must_use]
    pub fn identities(&self) -> Arc<Vec<OwnerIdentity>> {
        Arc::clone(&self.committed.read().expect("snapshot lock poisoned"))
    }

    /// Runs a batch clustering over the supplied records.
    ///
    /// # Errors
    ///
    /// `ClusterError::RunInProgress` if another batch holds the run lock.
    pub fn cluster_owners(
        &self,
        records: &[OwnerRecordRaw],
    ) -> Result<ClusterReport, ClusterError> {
        self.cluster_owners_with_cancel(records, &CancelFlag::new())
    }

    /// Runs a batch clustering with cooperative cancellation.
    ///
    /// Cancellation is checked at shard boundaries; a cancelled run
    /// discards every uncommitted merge and leaves the committed snapshot
    /// untouched.
    ///
    /// # Errors
    ///
    /// `ClusterError::RunInProgress` if another batch holds the run lock,
    /// `ClusterError::Cancelled` if the flag fired mid-run.
    pub fn cluster_owners_with_cancel(
        &self,
        records: &[OwnerRecordRaw],
        cancel: &CancelFlag,
    ) -> Result<ClusterReport, ClusterError> {
        let _guard = self
            .run_lock
            .try_lock()
            .map_err(|_| ClusterError::RunInProgress)?;

        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(%run_id, records = records.len(), "clustering run started");

        // Institutional records go to exact-name buckets; only individuals
        // enter similarity linkage.
        let mut individual_ids: Vec<usize> = Vec::new();
        let mut institutional: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (idx, record) in records.iter().enumerate() {
            if classify(&record.raw_name).is_some() {
                institutional
                    .entry(record.normalized_name.clone())
                    .or_default()
                    .push(idx);
            } else {
                individual_ids.push(idx);
            }
        }

        let shard_count = self.config.shards.max(1);
        let shards = shard_records(records, &individual_ids, shard_count);
        let shard_of = shard_assignment(records, shard_count);

        // Parallel intra-shard linkage; workers report through a bounded
        // channel and honor the cancel flag at their shard boundary.
        let (tx, rx) = bounded::<(usize, Option<Vec<LinkEdge>>)>(shard_count);
        let config = &self.config;
        thread::scope(|scope| {
            for (shard_idx, shard) in shards.iter().enumerate() {
                let tx = tx.clone();
                let cancel = cancel.clone();
                scope.spawn(move || {
                    if cancel.is_cancelled() {
                        let _ = tx.send((shard_idx, None));
                        return;
                    }
                    let edges = link_within(records, shard, config);
                    let _ = tx.send((shard_idx, Some(edges)));
                });
            }
        });
        drop(tx);

        let mut edges: BTreeMap<(usize, usize), LinkEdge> = BTreeMap::new();
        for (shard_idx, result) in rx {
            match result {
                Some(shard_edges) => {
                    debug!(shard = shard_idx, edges = shard_edges.len(), "shard linked");
                    merge_edges(&mut edges, shard_edges);
                }
                None => return Err(ClusterError::Cancelled { shard: shard_idx }),
            }
        }

        if cancel.is_cancelled() {
            return Err(ClusterError::Cancelled { shard: shard_count });
        }

        // Sequential reconciliation: name edges whose endpoints landed in
        // different shards.
        let cross_edges = link_across(records, &individual_ids, &shard_of, config);
        debug!(edges = cross_edges.len(), "cross-shard reconciliation");
        merge_edges(&mut edges, cross_edges);

        if cancel.is_cancelled() {
            return Err(ClusterError::Cancelled { shard: shard_count });
        }

        // Connectivity over auto-merge edges; everything weaker is audit
        // evidence that flags its endpoints.
        let mut uf = UnionFind::new(records.len());
        let mut flagged = vec![false; records.len()];
        let mut conflicts: Vec<ClusterConflict> = Vec::new();
        let mut weak_links: Vec<WeakLink> = Vec::new();
        let mut auto_merged_edges = 0usize;
        let mut component_phones: HashMap<usize, BTreeSet<NormalizedPhone>> = HashMap::new();
        for &idx in &individual_ids {
            if let Some(phone) = &records[idx].normalized_phone {
                component_phones
                    .entry(idx)
                    .or_default()
                    .insert(phone.clone());
            }
        }

        for edge in edges.values() {
            let strong = edge.confidence.value() >= self.config.auto_merge_threshold;
            match edge.evidence {
                LinkEvidence::NameSimilarityPhoneConflict { score } => {
                    flagged[edge.a] = true;
                    flagged[edge.b] = true;
                    let phones = (
                        records[edge.a].normalized_phone.clone(),
                        records[edge.b].normalized_phone.clone(),
                    );
                    // Both phones are present by construction of this
                    // evidence kind.
                    if let (true, (Some(left_phone), Some(right_phone))) = (strong, phones) {
                        conflicts.push(ClusterConflict {
                            left: records[edge.a].source_ref.clone(),
                            right: records[edge.b].source_ref.clone(),
                            kind: ConflictKind::PhoneDisagreement {
                                left_phone,
                                right_phone,
                                name_similarity: score,
                            },
                        });
                    } else {
                        weak_links.push(weak_link(records, edge));
                    }
                }
                LinkEvidence::PhoneExact | LinkEvidence::NameSimilarity { .. } => {
                    if !strong {
                        flagged[edge.a] = true;
                        flagged[edge.b] = true;
                        weak_links.push(weak_link(records, edge));
                        continue;
                    }

                    // A name edge joining components with disjoint,
                    // non-empty phone sets is contradictory evidence, not
                    // a merge.
                    if let LinkEvidence::NameSimilarity { score } = edge.evidence {
                        let ra = uf.find(edge.a);
                        let rb = uf.find(edge.b);
                        let pa = component_phones.get(&ra);
                        let pb = component_phones.get(&rb);
                        if let (Some(pa), Some(pb)) = (pa, pb) {
                            if !pa.is_empty() && !pb.is_empty() && pa.is_disjoint(pb) {
                                flagged[edge.a] = true;
                                flagged[edge.b] = true;
                                conflicts.push(ClusterConflict {
                                    left: records[edge.a].source_ref.clone(),
                                    right: records[edge.b].source_ref.clone(),
                                    kind: ConflictKind::ComponentPhoneSplit {
                                        name_similarity: score,
                                    },
                                });
                                continue;
                            }
                        }
                    }

                    let ra = uf.find(edge.a);
                    let rb = uf.find(edge.b);
                    if uf.union(edge.a, edge.b) {
                        auto_merged_edges += 1;
                        let merged_root = uf.find(edge.a);
                        let mut phones = component_phones.remove(&ra).unwrap_or_default();
                        if let Some(other) = component_phones.remove(&rb) {
                            phones.extend(other);
                        }
                        component_phones.insert(merged_root, phones);
                    }
                }
            }
        }

        // Materialize identities per component, institutional buckets last.
        let mut components: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for &idx in &individual_ids {
            components.entry(uf.find(idx)).or_default().push(idx);
        }

        let mut identities: Vec<OwnerIdentity> = Vec::with_capacity(
            components.len() + institutional.len(),
        );
        for members in components.values() {
            let representative = representative_name(records, members);
            let mut identity = OwnerIdentity::new(representative, OwnerKind::Individual);
            for &idx in members {
                identity.absorb(&records[idx]);
                if flagged[idx] {
                    identity.flag_for_verification();
                }
            }
            identities.push(identity);
        }

        let institutional_records: usize = institutional.values().map(Vec::len).sum();
        for members in institutional.values() {
            let representative = representative_name(records, members);
            let category = classify(&representative).unwrap_or(
                crate::owner::institutional::InstitutionalCategory::Corporate,
            );
            let mut identity =
                OwnerIdentity::new(representative, OwnerKind::Institutional { category });
            for &idx in members {
                identity.absorb(&records[idx]);
            }
            identities.push(identity);
        }

        identities.sort_by(|a, b| {
            a.representative_name
                .cmp(&b.representative_name)
                .then_with(|| a.member_record_ids.cmp(&b.member_record_ids))
        });

        let stats = RunStats {
            records_in: records.len(),
            individual_records: individual_ids.len(),
            institutional_records,
            identities_out: identities.len(),
            auto_merged_edges,
            weak_links: weak_links.len(),
            conflicts: conflicts.len(),
            shards: shard_count,
        };

        // Commit: the snapshot swap is the only externally visible write.
        *self.committed.write().expect("snapshot lock poisoned") =
            Arc::new(identities.clone());

        let finished_at = Utc::now();
        if conflicts.is_empty() {
            info!(%run_id, identities = stats.identities_out, merges = stats.auto_merged_edges, "clustering run committed");
        } else {
            warn!(%run_id, conflicts = stats.conflicts, "clustering run committed with conflicts");
        }

        Ok(ClusterReport {
            run_id,
            started_at,
            finished_at,
            identities,
            weak_links,
            conflicts,
            stats,
        })
    }

    /// Assigns one record against the committed snapshot.
    ///
    /// Exact phone evidence assigns at confidence 1.0; name-only evidence
    /// assigns only when the configured link confidence clears the
    /// auto-merge threshold, and otherwise parks the record with the
    /// plausible identities flagged for verification.
    ///
    /// # Panics
    ///
    /// Panics only if the snapshot lock was poisoned by a panicking writer.
    pub fn assign_owner(&self, record: &OwnerRecordRaw) -> AssignOutcome {
        let mut guard = self.committed.write().expect("snapshot lock poisoned");
        let identities = Arc::make_mut(&mut guard);

        if let Some(category) = classify(&record.raw_name) {
            // Institutional: exact normalized-name bucket, never fuzzy.
            if let Some(identity) = identities.iter_mut().find(|i| {
                i.is_institutional()
                    && normalize_owner_name(&i.representative_name) == record.normalized_name
            }) {
                identity.absorb(record);
                return AssignOutcome::Assigned(identity.clone());
            }
            let mut identity = OwnerIdentity::new(
                record.raw_name.clone(),
                OwnerKind::Institutional { category },
            );
            identity.absorb(record);
            identities.push(identity.clone());
            return AssignOutcome::Assigned(identity);
        }

        // Exact phone match: link confidence 1.0, assign immediately.
        if let Some(phone) = &record.normalized_phone {
            if let Some(identity) = identities
                .iter_mut()
                .find(|i| !i.is_institutional() && i.phones.contains(phone))
            {
                identity.absorb(record);
                return AssignOutcome::Assigned(identity.clone());
            }
        }

        // Name similarity against every variant of every individual.
        let threshold = self.config.name_similarity_threshold;
        let mut candidates: Vec<usize> = Vec::new();
        for (pos, identity) in identities.iter().enumerate() {
            if identity.is_institutional() {
                continue;
            }
            let best = identity
                .name_variants
                .iter()
                .map(|v| similarity(&record.normalized_name, &normalize_owner_name(v)))
                .fold(0.0_f32, f32::max);
            if best >= threshold {
                candidates.push(pos);
            }
        }

        if candidates.is_empty() {
            let mut identity =
                OwnerIdentity::new(record.raw_name.clone(), OwnerKind::Individual);
            identity.absorb(record);
            identities.push(identity.clone());
            return AssignOutcome::Assigned(identity);
        }

        let phone_conflict = record.normalized_phone.as_ref().map_or(false, |phone| {
            candidates.iter().any(|&pos| {
                let phones = &identities[pos].phones;
                !phones.is_empty() && !phones.contains(phone)
            })
        });

        let auto_mergeable = !phone_conflict
            && candidates.len() == 1
            && self.config.name_link_confidence >= self.config.auto_merge_threshold;

        if auto_mergeable {
            let identity = &mut identities[candidates[0]];
            identity.absorb(record);
            return AssignOutcome::Assigned(identity.clone());
        }

        let ids: Vec<OwnerIdentityId> = candidates
            .iter()
            .map(|&pos| {
                identities[pos].flag_for_verification();
                identities[pos].id
            })
            .collect();
        debug!(record = %record.source_ref, candidates = ids.len(), "assignment needs verification");
        AssignOutcome::NeedsVerification { candidates: ids }
    }
}

/// Shard indices for the individual records by stable phone hash; records
/// without a phone hash by name so re-runs shard identically.
fn shard_records(
    records: &[OwnerRecordRaw],
    individual_ids: &[usize],
    shard_count: usize,
) -> Vec<Vec<usize>> {
    let mut shards: Vec<Vec<usize>> = vec![Vec::new(); shard_count];
    for &idx in individual_ids {
        shards[stable_shard(&records[idx], shard_count)].push(idx);
    }
    shards
}

fn shard_assignment(records: &[OwnerRecordRaw], shard_count: usize) -> Vec<usize> {
    records
        .iter()
        .map(|r| stable_shard(r, shard_count))
        .collect()
}

fn stable_shard(record: &OwnerRecordRaw, shard_count: usize) -> usize {
    let key = record
        .normalized_phone
        .as_ref()
        .map_or(record.normalized_name.as_str(), NormalizedPhone::as_str);
    let hash = blake3::hash(key.as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&hash.as_bytes()[..8]);
    #[allow(clippy::cast_possible_truncation)]
    {
        (u64::from_le_bytes(prefix) % shard_count as u64) as usize
    }
}

/// Intra-shard linkage: exact phone edges plus name-similarity edges.
fn link_within(
    records: &[OwnerRecordRaw],
    shard: &[usize],
    config: &ClusteringConfig,
) -> Vec<LinkEdge> {
    let mut edges = Vec::new();

    // Exact phone: chain every later holder to the first seen.
    let mut first_by_phone: HashMap<&NormalizedPhone, usize> = HashMap::new();
    for &idx in shard {
        if let Some(phone) = &records[idx].normalized_phone {
            match first_by_phone.get(phone) {
                Some(&first) => edges.push(LinkEdge::new(
                    first,
                    idx,
                    Confidence::one(),
                    LinkEvidence::PhoneExact,
                )),
                None => {
                    first_by_phone.insert(phone, idx);
                }
            }
        }
    }

    edges.extend(name_edges(records, shard, config, None));
    edges
}

/// Cross-shard reconciliation: name edges between records whose phone hash
/// put them in different shards.
fn link_across(
    records: &[OwnerRecordRaw],
    individual_ids: &[usize],
    shard_of: &[usize],
    config: &ClusteringConfig,
) -> Vec<LinkEdge> {
    name_edges(records, individual_ids, config, Some(shard_of))
}

/// Name-similarity edges among `indices`, candidate-bounded by shared name
/// tokens. With `cross_shards_only`, pairs inside one shard are skipped
/// (they were already linked in parallel).
fn name_edges(
    records: &[OwnerRecordRaw],
    indices: &[usize],
    config: &ClusteringConfig,
    cross_shards_only: Option<&[usize]>,
) -> Vec<LinkEdge> {
    let mut token_buckets: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for &idx in indices {
        for token in records[idx].normalized_name.split_whitespace() {
            token_buckets.entry(token).or_default().push(idx);
        }
    }

    let mut seen: BTreeSet<(usize, usize)> = BTreeSet::new();
    let mut edges = Vec::new();
    for bucket in token_buckets.values() {
        for (i, &a) in bucket.iter().enumerate() {
            for &b in &bucket[i + 1..] {
                let key = if a <= b { (a, b) } else { (b, a) };
                if !seen.insert(key) {
                    continue;
                }
                if let Some(shard_of) = cross_shards_only {
                    if shard_of[a] == shard_of[b] {
                        continue;
                    }
                }

                let left = &records[key.0];
                let right = &records[key.1];
                let score = similarity(&left.normalized_name, &right.normalized_name);
                if score < config.name_similarity_threshold {
                    continue;
                }

                // Exact-equal names carry full confidence; fuzzy ones carry
                // the configured link confidence.
                let confidence = if left.normalized_name == right.normalized_name {
                    Confidence::one()
                } else {
                    Confidence::clamped(config.name_link_confidence)
                };

                match (&left.normalized_phone, &right.normalized_phone) {
                    // Same phone: the phone edge already carries this pair.
                    (Some(p), Some(q)) if p == q => {}
                    (Some(_), Some(_)) => {
                        edges.push(LinkEdge::new(
                            key.0,
                            key.1,
                            confidence,
                            LinkEvidence::NameSimilarityPhoneConflict { score },
                        ));
                    }
                    _ => {
                        edges.push(LinkEdge::new(
                            key.0,
                            key.1,
                            confidence,
                            LinkEvidence::NameSimilarity { score },
                        ));
                    }
                }
            }
        }
    }
    edges
}

/// Folds new edges in, keeping the strongest evidence per pair.
fn merge_edges(into: &mut BTreeMap<(usize, usize), LinkEdge>, edges: Vec<LinkEdge>) {
    for edge in edges {
        into.entry(edge.key())
            .and_modify(|existing| {
                if edge.confidence > existing.confidence {
                    *existing = edge;
                }
            })
            .or_insert(edge);
    }
}

fn weak_link(records: &[OwnerRecordRaw], edge: &LinkEdge) -> WeakLink {
    WeakLink {
        left: records[edge.a].source_ref.clone(),
        right: records[edge.b].source_ref.clone(),
        confidence: edge.confidence,
        evidence: edge.evidence,
    }
}

/// Most frequent raw variant; ties go to the variant whose latest source
/// ref is most recent, then lexically first for full determinism.
fn representative_name(records: &[OwnerRecordRaw], members: &[usize]) -> String {
    let mut tally: BTreeMap<&str, (usize, &SourceRef)> = BTreeMap::new();
    for &idx in members {
        let record = &records[idx];
        tally
            .entry(record.raw_name.as_str())
            .and_modify(|(count, latest)| {
                *count += 1;
                if record.source_ref > **latest {
                    *latest = &record.source_ref;
                }
            })
            .or_insert((1, &record.source_ref));
    }

    tally
        .iter()
        .max_by(|(name_a, (count_a, latest_a)), (name_b, (count_b, latest_b))| {
            count_a
                .cmp(count_b)
                .then_with(|| latest_a.cmp(latest_b))
                .then_with(|| name_b.cmp(name_a))
        })
        .map(|(name, _)| (*name).to_string())
        .unwrap_or_default()
}
