//! # canoniq - Identity & Location Resolution Engine
//!
//! canoniq turns noisy free-text references to places and people into
//! canonical, queryable entities with explicit confidence and explicit
//! ambiguity. It is the resolution core behind a property-intelligence
//! system: community/building names typed by users or found in ingested
//! spreadsheets, and raw buyer/seller name+phone pairs.
//!
//! ## Core Concepts
//!
//! - **Alias**: a free-text variant for a canonical community or building,
//!   curated with a confidence score
//! - **Resolution**: fuzzy matching of free text against an immutable
//!   alias registry snapshot, returning `Resolved`, `Ambiguous`, or
//!   `Unresolved` — never a silently picked winner
//! - **Owner identity**: the cluster of raw transaction records believed
//!   to denote one real-world person or company, built by
//!   confidence-weighted record linkage
//!
//! ## Usage
//!
//! ```rust,ignore
//! use canoniq::{
//!     AliasCatalog, AliasProvenance, Confidence, EngineConfig,
//!     InMemoryPropertyIndex, LocationDirectory, LocationResolver, Scope,
//! };
//! use std::sync::Arc;
//!
//! let mut directory = LocationDirectory::new();
//! directory.add_building("SEVEN HOTEL & APARTMENTS THE PALM", "Palm Jumeirah", None);
//!
//! let mut catalog = AliasCatalog::new();
//! catalog.upsert_alias(
//!     "Seven Palm",
//!     "SEVEN HOTEL & APARTMENTS THE PALM",
//!     Scope::Building,
//!     Confidence::one(),
//!     AliasProvenance::Manual,
//! )?;
//!
//! let registry = Arc::new(catalog.snapshot(&directory)?);
//! let resolver = LocationResolver::new(
//!     registry,
//!     Arc::new(InMemoryPropertyIndex::new()),
//!     &EngineConfig::default(),
//! );
//! let result = resolver.resolve_location("Who owns 905 at Seven Palm?", Some("905"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Shared primitives
pub mod confidence;
pub mod config;
pub mod error;
pub mod phone;
pub mod query;
pub mod text;

// Resolution components
pub mod alias;
pub mod location;
pub mod owner;
pub mod protocol;

// Re-export primary types at crate root for convenience
pub use alias::{AliasCatalog, AliasEntry, AliasProvenance, AliasRegistry, Scope, ScoredAlias, SharedRegistry};
pub use confidence::Confidence;
pub use config::{ClusteringConfig, EngineConfig, MatcherConfig, ResolverConfig};
pub use error::{ClusterError, EngineError, EngineResult, LookupError, ValidationError};
pub use location::{
    AmbiguousCandidate, CanonicalLocation, InMemoryPropertyIndex, LocationDirectory,
    LocationResolver, PropertyLookup, PropertyRef, ResolutionResult, ScopeHint,
};
pub use owner::{
    AssignOutcome, CancelFlag, ClusterConflict, ClusterEngine, ClusterReport, ConflictKind,
    InstitutionalCategory, OwnerIdentity, OwnerIdentityId, OwnerKind, OwnerRecordRaw, RunStats,
    SourceRef, TransactionSide, WeakLink,
};
pub use phone::{
    resolve_phone, CountryProfile, NormalizedPhone, PhoneInvalidReason, PhoneNormalizer,
    PhoneResolution,
};
pub use protocol::{disambiguate, ClarificationOption, DisambiguationOutcome};
