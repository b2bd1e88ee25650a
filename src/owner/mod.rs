//! Owner identity clustering.
//!
//! Merges raw buyer/seller records into canonical owner identities using
//! confidence-weighted record linkage: exact phone evidence, fuzzy name
//! evidence, institutional exact-name buckets, and union-find connectivity
//! with an explicit auto-merge threshold.

pub mod cluster;
pub mod identity;
pub mod institutional;
pub mod linkage;
pub mod record;

pub use cluster::{
    AssignOutcome, CancelFlag, ClusterConflict, ClusterEngine, ClusterReport, ConflictKind,
    RunStats, WeakLink,
};
pub use identity::{OwnerIdentity, OwnerIdentityId, OwnerKind};
pub use institutional::InstitutionalCategory;
pub use linkage::{LinkEdge, LinkEvidence, UnionFind};
pub use record::{normalize_owner_name, OwnerRecordRaw, SourceRef, TransactionSide};
