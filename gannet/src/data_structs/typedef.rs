use std::borrow::Borrow;
use std::fmt;

use serde::{
    Deserialize,
    Serialize,
};

pub type PosType = u32;
pub type ScoreType = f64;

const SHORT_UID_LEN: usize = 12;

/// Attribute-derived identifier (the value of the configured `ID` key).
pub type Aid = String;

/// Content hash of a feature, rendered as lowercase hex.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Uid(String);

impl Uid {
    pub fn new<S: Into<String>>(value: S) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// A uid that has not been assigned yet.
    pub fn is_unassigned(&self) -> bool {
        self.0.is_empty()
    }

    /// Leading 12 characters, for log messages.
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(SHORT_UID_LEN) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl fmt::Display for Uid {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Uid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Uid {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<String> for Uid {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Uid {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}
