use crate::domain::{CatalogInput, LabelMap, SessionCatalog, build_catalog};
use crate::infra::{
    LoadSessionIndexError, ProjectStore, load_last_log_timestamp, load_session_index,
    session_log_size,
};
use tracing::debug;

/// Ranks every indexed session of the project from what is on disk right now.
pub fn load_session_catalog(
    store: &ProjectStore,
    labels: &LabelMap,
    window: usize,
) -> Result<SessionCatalog, LoadSessionIndexError> {
    let index = load_session_index(&store.index_path())?;
    debug!(
        path = %store.index_path().display(),
        entries = index.raw_entry_count(),
        "loaded session index"
    );

    let inputs = index
        .entries()
        .into_iter()
        .map(|entry| {
            let log_path = store.log_path(&entry.session_id);
            CatalogInput {
                last_log_timestamp: load_last_log_timestamp(&log_path),
                file_size_bytes: session_log_size(&log_path),
                entry,
            }
        })
        .collect();

    let catalog = build_catalog(inputs, labels, window);
    for session in &catalog.sessions {
        if session.effective_timestamp != session.index_timestamp {
            debug!(
                session_id = session.id.as_str(),
                log = ?session.effective_timestamp,
                index = ?session.index_timestamp,
                "index timestamp differs from log"
            );
        }
    }
    Ok(catalog)
}
