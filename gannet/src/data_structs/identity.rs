//! Identity assignment.
//!
//! A feature is addressed two ways:
//!
//! - `uid`: SHA-256 over the canonical record (every column, attributes in
//!   key order, joined by tabs). Features with identical content always share
//!   a uid, and editing an attribute yields a new uid.
//! - `aid`/`parent_aid`: values of the configured identifier and parent keys,
//!   matched case-insensitively.

use std::str::FromStr;

use arcstr::ArcStr;
use serde::{
    Deserialize,
    Serialize,
};
use sha2::{
    Digest,
    Sha256,
};

use super::enums::{
    Frame,
    Strand,
};
use super::feature::{
    Feature,
    FeatureRecord,
};
use super::typedef::{
    Aid,
    Uid,
};
use crate::config::{
    AnnotFormat,
    IdentityConfig,
};
use crate::error::{
    AnnotError,
    AnnotResult,
};

const CANONICAL_DELIMITER: &str = "\t";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub uid:        Uid,
    pub aid:        Option<Aid>,
    pub parent_aid: Option<Aid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IdentityAssigner {
    config: IdentityConfig,
}

impl IdentityAssigner {
    pub fn new(config: IdentityConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &IdentityConfig {
        &self.config
    }

    pub fn id_key(&self) -> &str {
        &self.config.id_key
    }

    pub fn parent_key(&self) -> &str {
        &self.config.parent_key
    }

    /// Computes the identity of `draft` without modifying it.
    pub fn assign(
        &self,
        draft: &Feature,
    ) -> AnnotResult<Identity> {
        validate(draft)?;
        let uid = hash_canonical(&canonical_string(draft));
        let aid = non_empty(draft.attributes().get_ci(&self.config.id_key));
        let parent_aid =
            non_empty(draft.attributes().get_ci(&self.config.parent_key));
        Ok(Identity {
            uid,
            aid,
            parent_aid,
        })
    }

    /// Recomputes the identity of a feature after its attributes changed.
    pub fn reassign(
        &self,
        feature: &mut Feature,
    ) -> AnnotResult<()> {
        let identity = self.assign(feature)?;
        feature.set_identity(identity);
        Ok(())
    }

    /// Validates a decoded row and turns it into a feature with identity.
    pub fn build(
        &self,
        record: FeatureRecord,
    ) -> AnnotResult<Feature> {
        if record.chr.is_empty() {
            return Err(AnnotError::malformed("missing chromosome"));
        }
        if record.feature_type.is_empty() {
            return Err(AnnotError::malformed("missing feature type"));
        }
        let strand = Strand::from_str(&record.strand)?;
        let frame = Frame::from_str(&record.frame)?;

        let mut feature = Feature::draft(
            ArcStr::from(record.chr),
            ArcStr::from(record.src),
            ArcStr::from(record.feature_type),
            record.start,
            record.end,
            record.score,
            strand,
            frame,
            record.attributes,
        );
        self.reassign(&mut feature)?;
        Ok(feature)
    }
}

fn validate(draft: &Feature) -> AnnotResult<()> {
    if draft.chr().is_empty() {
        return Err(AnnotError::malformed("missing chromosome"));
    }
    if draft.feature_type().is_empty() {
        return Err(AnnotError::malformed("missing feature type"));
    }
    if draft.start() > draft.end() {
        return Err(AnnotError::malformed(format!(
            "start {} is greater than end {}",
            draft.start(),
            draft.end()
        )));
    }
    Ok(())
}

fn non_empty(value: Option<&str>) -> Option<Aid> {
    value
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Tab-joined record columns the uid is computed from.
pub fn canonical_string(feature: &Feature) -> String {
    let (chr, src, ft, start, end, score, strand, frame, attrs) =
        feature.fields(AnnotFormat::Gff3);
    [
        chr,
        src,
        ft,
        start.to_string(),
        end.to_string(),
        score,
        strand.to_string(),
        frame.to_string(),
        attrs,
    ]
    .join(CANONICAL_DELIMITER)
}

fn hash_canonical(canonical: &str) -> Uid {
    Uid::new(hex::encode(Sha256::digest(canonical.as_bytes())))
}
