//! Error and warning types.
//!
//! Every fallible operation of the store returns [`AnnotResult`]. Conditions
//! that do not abort an operation are reported as [`AnnotWarning`]s: they are
//! logged through the `log` facade and returned in the operation report.

use std::fmt;

use thiserror::Error;

use crate::data_structs::typedef::{
    Aid,
    Uid,
};

pub type AnnotResult<T> = Result<T, AnnotError>;

#[derive(Error, Debug)]
pub enum AnnotError {
    /// Input row is missing a positional field or has inconsistent
    /// coordinates.
    #[error("malformed record{}: {reason}", line_suffix(.line))]
    MalformedRecord { line: Option<u64>, reason: String },

    /// A freshly computed uid is already present in the store.
    #[error("non-unique uid detected: {uid}")]
    DuplicateUid { uid: Uid },

    /// Identifier collision between two stores being merged.
    #[error("duplicate identifier '{id}' ({count} collisions in total)")]
    DuplicateId { id: String, count: usize },

    /// Referenced parent identifier is not present in the lookup.
    #[error("parent '{aid}' could not be found in the annotation")]
    UnresolvableParent { aid: Aid },

    /// Interval query returned zero or several containers where exactly one
    /// was required.
    #[error(
        "feature {uid} overlaps {candidates} containers of parent {parent}, expected exactly one"
    )]
    AmbiguousContainment {
        uid:        Uid,
        parent:     Uid,
        candidates: usize,
    },

    #[error("{uid} not found in features")]
    FeatureNotFound { uid: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to read annotation file: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to encode annotation store: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("failed to decode annotation store: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
}

fn line_suffix(line: &Option<u64>) -> String {
    line.map(|l| format!(" at line {l}"))
        .unwrap_or_default()
}

impl AnnotError {
    pub fn malformed<S: Into<String>>(reason: S) -> Self {
        AnnotError::MalformedRecord {
            line:   None,
            reason: reason.into(),
        }
    }

    /// Attaches an input line number to a [`AnnotError::MalformedRecord`].
    /// Other variants are returned unchanged.
    pub fn at_line(
        self,
        line: u64,
    ) -> Self {
        match self {
            AnnotError::MalformedRecord { reason, .. } => {
                AnnotError::MalformedRecord {
                    line: Some(line),
                    reason,
                }
            },
            other => other,
        }
    }

    pub fn not_found<S: AsRef<str>>(uid: S) -> Self {
        AnnotError::FeatureNotFound {
            uid: uid.as_ref().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotWarning {
    /// A feature with an identical uid existed and was overwritten.
    Duplicate { uid: Uid },
    /// The parent of this feature was removed without its children.
    Orphan { uid: Uid, former_parent: Uid },
    /// The feature references a parent identifier that is not in the store.
    MissingParent { uid: Uid, parent_aid: Aid },
}

impl AnnotWarning {
    pub fn uid(&self) -> &Uid {
        match self {
            AnnotWarning::Duplicate { uid }
            | AnnotWarning::Orphan { uid, .. }
            | AnnotWarning::MissingParent { uid, .. } => uid,
        }
    }
}

impl fmt::Display for AnnotWarning {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            AnnotWarning::Duplicate { uid } => {
                write!(
                    f,
                    "feature with same content already exists and was overwritten ({})",
                    uid.short()
                )
            },
            AnnotWarning::Orphan { uid, former_parent } => {
                write!(
                    f,
                    "feature {} lost its parent {} and is now an orphan",
                    uid.short(),
                    former_parent.short()
                )
            },
            AnnotWarning::MissingParent { uid, parent_aid } => {
                write!(
                    f,
                    "feature {} has parent attribute '{}', but the parent could not be found in the annotation",
                    uid.short(),
                    parent_aid
                )
            },
        }
    }
}
