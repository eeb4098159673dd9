//! # gannet
//!
//! `gannet` is a Rust library and command-line tool for loading genome
//! annotations (GFF3 and GTF) into a hierarchical, content-addressed store.
//! Every feature gets a stable `uid` computed from its full record, and parent
//! references from the attribute column are resolved into a gene → transcript
//! → exon → CDS tree that can be queried, edited and merged.
//!
//! ## Key Features
//!
//! * **Content identity**: features are keyed by a SHA-256 hash of their
//!   canonical record, so identical records deduplicate and an attribute edit
//!   yields a new identity ([`IdentityAssigner`]).
//! * **Parent resolution**: identifiers are looked up case-insensitively and
//!   ambiguous references are settled by a positional similarity score
//!   ([`AnnotStore::resolve_aid`]).
//! * **Containment placement**: contained features (e.g. CDS) can be placed
//!   under the container (e.g. exon) they overlap using a per-parent
//!   [`IntervalIndex`].
//! * **Editing**: transactional insertion, cascading or orphaning removal,
//!   re-insertion of subtrees, merging of stores and cross-store renaming
//!   ([`SynonymResolver`]).
//! * **Parallel build**: per-chromosome construction on a rayon thread pool
//!   ([`AnnotStore::from_records_parallel`]).
//! * **Persistence**: a store is saved and loaded as a single `.gix` file.
//!
//! Number of threads to be used can be configured with setting
//! `GANNET_NUM_THREADS` environment variable.
//!
//! ## Structure
//!
//! * [`data_structs`]: features, attributes, the store, the interval index and
//!   the synonym resolver.
//! * [`io`]: GFF3/GTF reader and writer, and `.gix` persistence.
//! * [`config`]: [`StoreConfig`] and the policies it selects.
//! * [`error`]: [`AnnotError`] and [`AnnotWarning`].
//! * [`utils`]: the global thread pool and small macros.
//!
//! ## Usage
//!
//! ### Building a store from a GFF3 file
//!
//! ```no_run
//! use gannet::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = StoreConfig::default().with_containment(Some(
//!         ContainmentConfig::default(),
//!     ));
//!     let (store, report) = AnnotStore::from_path("annotation.gff3", config)?;
//!
//!     println!(
//!         "Loaded {} features ({} warnings)",
//!         store.len(),
//!         report.warnings.len()
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ### Removing a gene with its subtree
//!
//! ```no_run
//! use gannet::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut store = AnnotStore::load_gix("annotation.gix")?;
//!     let uid = store.get_uid("gene1", None)?;
//!
//!     let removal = store.remove(&uid, true)?;
//!     print!("{}", removal.snapshot);
//!     store.save_gix("annotation.gix")?;
//!     Ok(())
//! }
//! ```
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod config;
pub mod data_structs;
pub mod error;
pub mod io;
pub mod prelude;
pub mod utils;

pub use config::{
    AnnotFormat,
    BatchPolicy,
    ContainmentConfig,
    DuplicatePolicy,
    IdentityConfig,
    MergePolicy,
    StoreConfig,
};
pub use data_structs::{
    AnnotStore,
    Attributes,
    Feature,
    FeatureRecord,
    FeatureTree,
    IdentityAssigner,
    IntervalIndex,
    SynonymResolver,
    Uid,
};
pub use error::{
    AnnotError,
    AnnotResult,
    AnnotWarning,
};
