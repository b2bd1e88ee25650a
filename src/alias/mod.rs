//! Alias registry and fuzzy text matching.
//!
//! An alias is a free-text variant a user or ingestion source might use
//! for a canonical community or building. The registry stores curated
//! alias → canonical mappings grouped by scope; the matcher scores free
//! text against them with explicit confidence.

pub mod entry;
pub mod matcher;
pub mod registry;

pub use entry::{AliasEntry, AliasProvenance, Scope};
pub use matcher::ScoredAlias;
pub use registry::{AliasCatalog, AliasRegistry, SharedRegistry};
