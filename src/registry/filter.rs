// SPDX-License-Identifier: GPL-3.0-only
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::registry::models::{REGISTRATION_ID_KEY, Record};

/// Filter value meaning "the key must be present, any value"
pub const WILDCARD: &str = "*";

/// Flat key/value lookup filter. Every entry must match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Filter(BTreeMap<String, String>);

impl Filter {
    /// A filter accepting every record
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_registration_id(id: impl Into<String>) -> Self {
        Self::all().with(REGISTRATION_ID_KEY, id)
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for Filter
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Check a record against a filter.
///
/// Values compare case-sensitively against the stringified record value;
/// `"*"` only requires the key to be present.
pub fn matches(filter: &Filter, record: &Record) -> bool {
    filter.iter().all(|(key, expected)| match record.attribute(key) {
        None => false,
        Some(_) if expected == WILDCARD => true,
        Some(actual) => actual == expected,
    })
}
