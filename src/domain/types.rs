use crate::domain::timestamp_from_unix_ms;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Number, Value};
use std::collections::BTreeMap;

/// One session as described by the host's `sessions-index.json`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IndexEntry {
    pub session_id: String,
    pub modified: Option<String>,
    pub file_mtime: Option<i64>,
    pub message_count: u64,
    pub summary: String,
    pub custom_title: String,
}

#[derive(Debug, Deserialize)]
struct IndexEntryFields {
    #[serde(rename = "sessionId")]
    session_id: String,

    #[serde(default, deserialize_with = "lenient")]
    modified: Option<String>,

    #[serde(rename = "fileMtime", default, deserialize_with = "lenient")]
    file_mtime: Option<Number>,

    #[serde(rename = "messageCount", default, deserialize_with = "lenient")]
    message_count: Option<u64>,

    #[serde(default, deserialize_with = "lenient")]
    summary: Option<String>,

    #[serde(rename = "customTitle", default, deserialize_with = "lenient")]
    custom_title: Option<String>,
}

/// Optional fields of the wrong type read as absent instead of failing the
/// whole entry.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).ok())
}

impl IndexEntry {
    pub fn from_json(value: &Value) -> Result<Self, serde_json::Error> {
        let fields = IndexEntryFields::deserialize(value)?;
        let file_mtime = fields
            .file_mtime
            .and_then(|n| n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)));

        Ok(Self {
            session_id: fields.session_id,
            modified: fields.modified.filter(|s| !s.trim().is_empty()),
            file_mtime,
            message_count: fields.message_count.unwrap_or(0),
            summary: fields.summary.unwrap_or_default(),
            custom_title: fields.custom_title.unwrap_or_default(),
        })
    }

    /// `modified`, or `fileMtime` rendered in the same form when the host
    /// left `modified` out.
    pub fn index_timestamp(&self) -> Option<String> {
        self.modified
            .clone()
            .or_else(|| self.file_mtime.and_then(timestamp_from_unix_ms))
    }
}

/// Session id -> human label, sourced from an optional markdown table.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LabelMap {
    labels: BTreeMap<String, String>,
}

impl LabelMap {
    pub fn label_for(&self, session_id: &str) -> Option<&str> {
        self.labels.get(session_id).map(|s| s.as_str())
    }

    pub fn insert(&mut self, session_id: String, label: String) {
        self.labels.insert(session_id, label);
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RankedSession {
    pub id: String,
    pub rank: usize,
    pub reachable: bool,
    pub effective_timestamp: Option<String>,
    pub index_timestamp: Option<String>,
    pub message_count: u64,
    pub summary: String,
    pub custom_title: String,
    pub file_size_bytes: u64,
    pub label: Option<String>,
    pub display_name: String,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SessionCatalog {
    pub sessions: Vec<RankedSession>,
    pub window: usize,
}

impl SessionCatalog {
    pub fn reachable_count(&self) -> usize {
        self.sessions.iter().filter(|s| s.reachable).count()
    }

    pub fn position_of(&self, session_id: &str) -> Option<&RankedSession> {
        self.sessions.iter().find(|s| s.id == session_id)
    }
}
