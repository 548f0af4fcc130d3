//! Outage and site data structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A reported downtime interval for a device.
///
/// `begin` is kept as the raw JSON value the API sent, and `end` travels in
/// `extra`, so posted records carry both unchanged and one malformed record
/// does not fail the whole list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Outage {
    /// Device identifier (not unique across outages)
    pub id: String,

    /// Start of the outage, normally an ISO-8601 string with offset
    #[serde(default)]
    pub begin: Value,

    /// Fields this client does not interpret, `end` included
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Outage {
    /// Parse `begin` as an instant, `None` if it is missing, not a string or
    /// not RFC 3339.
    pub fn begin_at(&self) -> Option<DateTime<Utc>> {
        let begin = self.begin.as_str()?;
        DateTime::parse_from_rfc3339(begin)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// A device installed at a site.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Device {
    pub id: String,
    pub name: String,
}

/// Site metadata as returned by `/site-info/{siteId}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SiteInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default)]
    pub devices: Vec<Device>,
}

/// An outage tagged with the name of the device it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnrichedOutage {
    #[serde(flatten)]
    pub outage: Outage,

    /// Device display name
    pub name: String,
}

impl EnrichedOutage {
    /// Attach a device name, replacing any `name` the outage already carried.
    pub fn new(mut outage: Outage, name: impl Into<String>) -> Self {
        outage.extra.remove("name");
        Self {
            outage,
            name: name.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.outage.id
    }
}
