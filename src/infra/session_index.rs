use crate::domain::IndexEntry;
use serde_json::{Map, Value};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum LoadSessionIndexError {
    #[error("cannot find session index: {0}")]
    Missing(PathBuf),

    #[error("failed to read session index {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to parse session index {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("session index {0} has no `entries` list")]
    MissingEntries(PathBuf),
}

#[derive(Debug, Error)]
pub enum TouchIndexEntryError {
    #[error("session {0} is not in the index")]
    UnknownSession(String),
}

/// The host's `sessions-index.json`, kept as a JSON tree so every field we do
/// not own (and its key order) survives a rewrite.
#[derive(Clone, Debug)]
pub struct SessionIndexDocument {
    root: Map<String, Value>,
}

impl SessionIndexDocument {
    pub fn from_json(text: &str, path: &Path) -> Result<Self, LoadSessionIndexError> {
        let root: Map<String, Value> =
            serde_json::from_str(text).map_err(|source| LoadSessionIndexError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        if !root.get("entries").is_some_and(Value::is_array) {
            return Err(LoadSessionIndexError::MissingEntries(path.to_path_buf()));
        }
        Ok(Self { root })
    }

    fn raw_entries(&self) -> &[Value] {
        self.root
            .get("entries")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Entries in index order. Entries we cannot read are left out here but
    /// stay in the document untouched.
    pub fn entries(&self) -> Vec<IndexEntry> {
        self.raw_entries()
            .iter()
            .enumerate()
            .filter_map(|(idx, value)| match IndexEntry::from_json(value) {
                Ok(entry) => Some(entry),
                Err(error) => {
                    warn!(index = idx, %error, "skipping unreadable session index entry");
                    None
                }
            })
            .collect()
    }

    pub fn raw_entry_count(&self) -> usize {
        self.raw_entries().len()
    }

    /// Points one entry's `modified`/`fileMtime` at a new instant and returns
    /// the previous `modified` value.
    pub fn touch_entry(
        &mut self,
        session_id: &str,
        modified: &str,
        file_mtime_ms: i64,
    ) -> Result<Option<String>, TouchIndexEntryError> {
        let entry = self
            .root
            .get_mut("entries")
            .and_then(Value::as_array_mut)
            .and_then(|entries| {
                entries.iter_mut().find(|entry| {
                    entry.get("sessionId").and_then(Value::as_str) == Some(session_id)
                })
            })
            .and_then(Value::as_object_mut)
            .ok_or_else(|| TouchIndexEntryError::UnknownSession(session_id.to_string()))?;

        let previous = entry
            .get("modified")
            .and_then(Value::as_str)
            .map(|s| s.to_string());
        entry.insert("modified".to_string(), Value::String(modified.to_string()));
        entry.insert("fileMtime".to_string(), Value::from(file_mtime_ms));
        Ok(previous)
    }

    /// Two-space indented JSON, non-ASCII left as-is, no trailing newline.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.root)
    }
}

pub fn load_session_index(path: &Path) -> Result<SessionIndexDocument, LoadSessionIndexError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            return Err(LoadSessionIndexError::Missing(path.to_path_buf()));
        }
        Err(source) => {
            return Err(LoadSessionIndexError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    SessionIndexDocument::from_json(&raw, path)
}
