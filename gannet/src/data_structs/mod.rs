//! Core data structures of the `gannet` crate.
//!
//! Key components of this module include:
//!
//! - [`Feature`]: a single annotation record together with its identity block
//!   (`uid`, `aid`, `parent_aid`) and tree links. Decoded rows arrive as
//!   [`FeatureRecord`]s and are turned into features by the
//!   [`IdentityAssigner`].
//! - [`Attributes`]: the ordered ninth column, with case-insensitive lookup.
//! - [`AnnotStore`]: the hierarchical store. It owns every feature, keeps the
//!   identifier lookup, resolves parent references and supports removal,
//!   re-insertion and merging of stores.
//! - [`IntervalIndex`]: per-parent spatial index used to place contained
//!   features (e.g. CDS) under the right container (e.g. exon).
//! - [`SynonymResolver`]: renames a subtree after its counterpart in another
//!   store.
//! - [`partition`]: per-chromosome parallel construction.
//! - [`typedef`]: type aliases and the [`Uid`] newtype.

mod attributes;
mod enums;
mod feature;
mod identity;
mod interval;
pub mod partition;
mod store;
mod synonym;
pub mod typedef;

#[cfg(test)]
mod tests;

pub use attributes::Attributes;
pub use enums::{
    Frame,
    Strand,
};
pub use feature::{
    Feature,
    FeatureFields,
    FeatureRecord,
    FeatureTree,
    FeatureTreeIter,
};
pub use identity::{
    canonical_string,
    Identity,
    IdentityAssigner,
};
pub use interval::IntervalIndex;
pub use partition::PartitionResult;
pub use store::{
    AnnotStore,
    BuildReport,
    Removal,
};
pub use synonym::{
    resolve_synonym,
    AttributeRules,
    SynonymResolution,
    SynonymResolver,
    DEFAULT_RULES_KEY,
};
pub use typedef::{
    Aid,
    PosType,
    ScoreType,
    Uid,
};
