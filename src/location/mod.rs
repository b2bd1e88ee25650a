//! Location resolution: canonical locations, the store hook, and the
//! resolver that composes registry, matcher, and store.

pub mod directory;
pub mod resolver;
pub mod store;
pub mod types;

pub use directory::{LocationDirectory, ParentRef};
pub use resolver::LocationResolver;
pub use store::{InMemoryPropertyIndex, PropertyLookup, PropertyRef, ScopeHint};
pub use types::{AmbiguousCandidate, CanonicalLocation, ResolutionResult};
