use crate::domain::{
    ReactivationClock, ResolveSessionError, SessionLogDocument, TimestampRewrite, resolve_session,
};
use crate::infra::{
    LoadSessionIndexError, ProjectStore, StagedFile, TouchIndexEntryError, load_session_index,
};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ReactivateError {
    #[error(transparent)]
    LoadIndex(#[from] LoadSessionIndexError),

    #[error(transparent)]
    Resolve(#[from] ResolveSessionError),

    #[error("cannot find chat log file {0}")]
    LogMissing(PathBuf),

    #[error("failed to read chat log {path}: {source}")]
    ReadLog { path: PathBuf, source: io::Error },

    #[error("failed to format timestamp: {0}")]
    FormatTimestamp(#[from] time::error::Format),

    #[error("failed to encode {what}: {source}")]
    Encode {
        what: &'static str,
        source: serde_json::Error,
    },

    #[error(transparent)]
    TouchIndex(#[from] TouchIndexEntryError),

    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReactivationReport {
    pub session_id: String,
    pub summary: String,
    pub log_path: PathBuf,
    pub rewrites: Vec<TimestampRewrite>,
    pub index_modified_before: Option<String>,
    pub index_modified_after: String,
}

/// Moves a session back into the resumable window by giving its most recent
/// log entries and its index entry a fresh timestamp.
///
/// Both new files are staged before either is replaced. The log is swapped in
/// first and the index second, so an interruption between the two leaves a
/// log that already ranks as fresh and an index that still reads as old.
/// Nothing is locked: a host process appending to the same log while this
/// runs can lose the lines it wrote in between.
pub fn reactivate_session(
    store: &ProjectStore,
    query: &str,
    now: OffsetDateTime,
) -> Result<ReactivationReport, ReactivateError> {
    let clock = ReactivationClock::new(now);

    let mut index = load_session_index(&store.index_path())?;
    let entries = index.entries();
    let entry = resolve_session(query, &entries)?;
    let session_id = entry.session_id.clone();
    let summary = entry.summary.clone();

    let log_path = store.log_path(&session_id);
    if !log_path.is_file() {
        return Err(ReactivateError::LogMissing(log_path));
    }
    let log_bytes = fs::read(&log_path).map_err(|source| ReactivateError::ReadLog {
        path: log_path.clone(),
        source,
    })?;

    let log = SessionLogDocument::parse(&log_bytes);
    let rewrites = log.plan_rewrites(&clock)?;
    let new_log = log.render(&rewrites).map_err(|source| ReactivateError::Encode {
        what: "chat log",
        source,
    })?;

    let index_modified_after = clock.timestamp()?;
    let index_modified_before =
        index.touch_entry(&session_id, &index_modified_after, clock.unix_ms())?;
    let new_index = index.to_json().map_err(|source| ReactivateError::Encode {
        what: "session index",
        source,
    })?;

    let staged_log = stage(&log_path, &new_log)?;
    let staged_index = stage(&store.index_path(), new_index.as_bytes())?;
    commit(staged_log)?;
    commit(staged_index)?;

    info!(
        session_id = session_id.as_str(),
        rewritten = rewrites.len(),
        "reactivated session"
    );

    Ok(ReactivationReport {
        session_id,
        summary,
        log_path,
        rewrites,
        index_modified_before,
        index_modified_after,
    })
}

fn stage(path: &Path, contents: &[u8]) -> Result<StagedFile, ReactivateError> {
    StagedFile::stage(path, contents).map_err(|source| ReactivateError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn commit(staged: StagedFile) -> Result<(), ReactivateError> {
    let path = staged.target().to_path_buf();
    debug!(path = %path.display(), "committing staged file");
    staged
        .commit()
        .map_err(|source| ReactivateError::Write { path, source })
}
