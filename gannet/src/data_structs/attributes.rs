use std::fmt::{
    self,
    Write,
};

use indexmap::IndexMap;
use serde::{
    Deserialize,
    Serialize,
};

use crate::config::AnnotFormat;
use crate::error::{
    AnnotError,
    AnnotResult,
};

/// Ordered attribute column of a feature.
///
/// Key case is preserved as read; the `*_ci` methods match keys
/// case-insensitively and the first matching key wins.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes {
    inner: IndexMap<String, String>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the ninth column. Entries are separated by `;`, key and value
    /// by the format's separator. GTF values lose their surrounding quotes.
    pub fn parse(
        s: &str,
        format: AnnotFormat,
    ) -> AnnotResult<Self> {
        let sep = format.kv_separator();
        let mut attributes = Attributes::default();
        for pair in s.trim().split(';') {
            let pair = pair.trim();
            if pair.is_empty() {
                continue;
            }

            let (key, value) = pair.split_once(sep).ok_or_else(|| {
                AnnotError::malformed(format!(
                    "attribute '{pair}' has no '{sep}' separator"
                ))
            })?;
            let key = key.trim();
            let mut value = value.trim();
            if format == AnnotFormat::Gtf {
                value = value
                    .strip_prefix('"')
                    .and_then(|v| v.strip_suffix('"'))
                    .unwrap_or(value);
            }
            if key.is_empty() {
                return Err(AnnotError::malformed(format!(
                    "attribute '{pair}' has an empty key"
                )));
            }
            attributes
                .inner
                .insert(key.to_string(), value.to_string());
        }
        Ok(attributes)
    }

    /// Renders the ninth column in the given format.
    pub fn to_column(
        &self,
        format: AnnotFormat,
    ) -> String {
        if self.inner.is_empty() {
            return ".".to_string();
        }
        let mut serialized = String::with_capacity(64);
        match format {
            AnnotFormat::Gff3 => {
                let mut first = true;
                for (k, v) in self.inner.iter() {
                    if !first {
                        serialized.push(';');
                    }
                    else {
                        first = false;
                    }
                    // Writing into a String cannot fail
                    let _ = write!(serialized, "{}={}", k, v);
                }
            },
            AnnotFormat::Gtf => {
                for (k, v) in self.inner.iter() {
                    if !serialized.is_empty() {
                        serialized.push(' ');
                    }
                    let _ = write!(serialized, "{} \"{}\";", k, v);
                }
            },
        }
        serialized
    }

    fn find_key_ci(
        &self,
        key: &str,
    ) -> Option<&str> {
        self.inner
            .keys()
            .find(|k| k.eq_ignore_ascii_case(key))
            .map(String::as_str)
    }

    pub fn get(
        &self,
        key: &str,
    ) -> Option<&str> {
        self.inner.get(key).map(String::as_str)
    }

    pub fn get_ci(
        &self,
        key: &str,
    ) -> Option<&str> {
        self.inner
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key_ci(
        &self,
        key: &str,
    ) -> bool {
        self.find_key_ci(key).is_some()
    }

    /// Overwrites the value of the first key matching `key`
    /// case-insensitively, keeping its spelling. Appends `key` when no key
    /// matches.
    pub fn set_ci<V: Into<String>>(
        &mut self,
        key: &str,
        value: V,
    ) {
        let existing = self.find_key_ci(key).map(str::to_string);
        match existing {
            Some(existing) => {
                self.inner.insert(existing, value.into());
            },
            None => {
                self.inner
                    .insert(key.to_string(), value.into());
            },
        }
    }

    pub fn insert<K: Into<String>, V: Into<String>>(
        &mut self,
        key: K,
        value: V,
    ) -> Option<String> {
        self.inner.insert(key.into(), value.into())
    }

    /// Removes every key matching `key` case-insensitively, keeping the order
    /// of the remaining ones.
    pub fn remove_ci(
        &mut self,
        key: &str,
    ) -> usize {
        let before = self.inner.len();
        self.inner
            .retain(|k, _| !k.eq_ignore_ascii_case(key));
        before - self.inner.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl fmt::Display for Attributes {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}", self.to_column(AnnotFormat::Gff3))
    }
}

impl<K, V> FromIterator<(K, V)> for Attributes
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            inner: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
