// SPDX-License-Identifier: GPL-3.0-only
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

/// Key under which a record's registration id is matchable in filters
pub const REGISTRATION_ID_KEY: &str = "registrationId";
pub const NAME_KEY: &str = "name";
pub const TYPE_KEY: &str = "type";
pub const STATUS_KEY: &str = "status";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Up,
    Down,
    OutOfService,
    #[default]
    Unknown,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Up => "UP",
            Status::Down => "DOWN",
            Status::OutOfService => "OUT_OF_SERVICE",
            Status::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scalar metadata value. Matching compares the stringified form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Boolean(bool),
    Number(serde_json::Number),
    String(String),
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::Boolean(b) => write!(f, "{}", b),
            MetadataValue::Number(n) => write!(f, "{}", n),
            MetadataValue::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::String(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        MetadataValue::String(value)
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        MetadataValue::Boolean(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        MetadataValue::Number(value.into())
    }
}

impl From<u64> for MetadataValue {
    fn from(value: u64) -> Self {
        MetadataValue::Number(value.into())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Assigned by the registry on publish
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_id: Option<String>,

    /// Human-readable service name, not necessarily unique
    #[serde(default)]
    pub name: String,

    /// Service kind tag, e.g. "http-endpoint"
    #[serde(rename = "type", default)]
    pub service_type: String,

    /// How to reach the service; never interpreted by the registry
    #[serde(default)]
    pub location: serde_json::Map<String, serde_json::Value>,

    /// Queryable attributes
    #[serde(default)]
    pub metadata: BTreeMap<String, MetadataValue>,

    #[serde(default)]
    pub status: Status,
}

impl Record {
    pub fn new(name: impl Into<String>, service_type: impl Into<String>) -> Self {
        Self {
            registration_id: None,
            name: name.into(),
            service_type: service_type.into(),
            location: serde_json::Map::new(),
            metadata: BTreeMap::new(),
            status: Status::Unknown,
        }
    }

    pub fn with_location(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.location.insert(key.into(), value);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    /// Registration id if one has been assigned (empty strings count as unassigned)
    pub fn id(&self) -> Option<&str> {
        self.registration_id.as_deref().filter(|id| !id.is_empty())
    }

    /// Resolve a filter key against this record.
    ///
    /// Metadata is consulted first, then the built-in fields
    /// (`registrationId`, `name`, `type`, `status`).
    pub fn attribute(&self, key: &str) -> Option<Cow<'_, str>> {
        if let Some(value) = self.metadata.get(key) {
            return Some(match value {
                MetadataValue::String(s) => Cow::Borrowed(s.as_str()),
                other => Cow::Owned(other.to_string()),
            });
        }

        match key {
            REGISTRATION_ID_KEY => self.id().map(Cow::Borrowed),
            NAME_KEY => Some(Cow::Borrowed(self.name.as_str())),
            TYPE_KEY => Some(Cow::Borrowed(self.service_type.as_str())),
            STATUS_KEY => Some(Cow::Borrowed(self.status.as_str())),
            _ => None,
        }
    }
}
