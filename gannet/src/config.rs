//! Store configuration.
//!
//! [`StoreConfig`] is fixed for the lifetime of an
//! [`AnnotStore`](crate::AnnotStore) and is persisted together with it. It can
//! be built with the `with_*` setters or loaded from a JSON file.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{
    Deserialize,
    Serialize,
};

use crate::data_structs::typedef::PosType;
use crate::error::AnnotResult;
use crate::with_field_fn;

/// Input/output convention of the tab-delimited annotation file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AnnotFormat {
    /// `key=value` attribute pairs.
    #[default]
    Gff3,
    /// `key "value"` attribute pairs.
    Gtf,
}

impl AnnotFormat {
    pub fn kv_separator(&self) -> char {
        match self {
            AnnotFormat::Gff3 => '=',
            AnnotFormat::Gtf => ' ',
        }
    }

    /// Guesses the format from a file extension. Anything that is not
    /// `.gtf` is read as GFF3.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        match path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .as_deref()
        {
            Some("gtf") => AnnotFormat::Gtf,
            _ => AnnotFormat::Gff3,
        }
    }
}

/// Attribute keys holding the identifier and the parent reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityConfig {
    pub id_key:     String,
    pub parent_key: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            id_key:     "ID".to_string(),
            parent_key: "Parent".to_string(),
        }
    }
}

impl IdentityConfig {
    with_field_fn!(id_key, String);

    with_field_fn!(parent_key, String);
}

/// What to do when a newly built feature hashes to a uid already present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DuplicatePolicy {
    /// Abort with [`AnnotError::DuplicateUid`](crate::AnnotError).
    #[default]
    Fail,
    /// Append `{sep}{n}` to the identifier and recompute the uid.
    MakeUnique,
    /// Replace the existing feature (later writes win).
    Overwrite,
}

/// Collision handling for [`AnnotStore::merge`](crate::AnnotStore::merge).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MergePolicy {
    #[default]
    Fail,
    Rename,
}

/// Whether a malformed record aborts the whole batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BatchPolicy {
    #[default]
    AllOrNothing,
    /// Malformed records are skipped and reported.
    PartialSuccess,
}

/// Interval-based placement of one feature type inside another, e.g. CDS
/// inside exons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainmentConfig {
    pub container_type: String,
    pub contained_type: String,
    /// Width added to zero-length intervals so they stay queryable.
    pub zero_width_pad: PosType,
}

impl Default for ContainmentConfig {
    fn default() -> Self {
        Self {
            container_type: "exon".to_string(),
            contained_type: "CDS".to_string(),
            zero_width_pad: 1,
        }
    }
}

impl ContainmentConfig {
    with_field_fn!(container_type, String);

    with_field_fn!(contained_type, String);

    with_field_fn!(zero_width_pad, PosType);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub identity:          IdentityConfig,
    pub format:            AnnotFormat,
    pub duplicate_policy:  DuplicatePolicy,
    pub batch_policy:      BatchPolicy,
    pub containment:       Option<ContainmentConfig>,
    pub unique_suffix_sep: String,
    pub merge_suffix:      String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            identity:          IdentityConfig::default(),
            format:            AnnotFormat::default(),
            duplicate_policy:  DuplicatePolicy::default(),
            batch_policy:      BatchPolicy::default(),
            containment:       None,
            unique_suffix_sep: "-".to_string(),
            merge_suffix:      "_merged".to_string(),
        }
    }
}

impl StoreConfig {
    with_field_fn!(identity, IdentityConfig);

    with_field_fn!(format, AnnotFormat);

    with_field_fn!(duplicate_policy, DuplicatePolicy);

    with_field_fn!(batch_policy, BatchPolicy);

    with_field_fn!(containment, Option<ContainmentConfig>);

    with_field_fn!(unique_suffix_sep, String);

    with_field_fn!(merge_suffix, String);

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> AnnotResult<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn from_json_str(s: &str) -> AnnotResult<Self> {
        Ok(serde_json::from_str(s)?)
    }
}
