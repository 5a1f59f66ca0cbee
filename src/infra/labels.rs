use crate::domain::{LabelMap, parse_label_table};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

const DEFAULT_LABEL_DOCUMENT: &[&str] = &["doc", "reference", "claude-sessions.md"];
const LABEL_DOCUMENT_NAMES: &[&str] = &["claude-sessions.md", "session-experts.md"];
const MAX_SEARCH_DEPTH: usize = 8;
const SKIPPED_DIRS: &[&str] = &["target", "node_modules"];

/// Locates the optional session label document for a working directory.
pub fn find_label_document(work_dir: &Path) -> Option<PathBuf> {
    let default_path = DEFAULT_LABEL_DOCUMENT
        .iter()
        .fold(work_dir.to_path_buf(), |path, part| path.join(part));
    if default_path.is_file() {
        return Some(default_path);
    }

    LABEL_DOCUMENT_NAMES
        .iter()
        .find_map(|name| search_for_file_named(work_dir, name))
}

fn search_for_file_named(work_dir: &Path, name: &str) -> Option<PathBuf> {
    WalkDir::new(work_dir)
        .follow_links(false)
        .max_depth(MAX_SEARCH_DEPTH)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_skipped_dir(entry))
        .filter_map(Result::ok)
        .find(|entry| entry.file_type().is_file() && entry.file_name() == name)
        .map(DirEntry::into_path)
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || SKIPPED_DIRS.iter().any(|skipped| *skipped == name)
}

/// Labels for the project, or an empty map when there is no usable document.
pub fn load_label_map(work_dir: &Path) -> LabelMap {
    let Some(path) = find_label_document(work_dir) else {
        return LabelMap::default();
    };

    match fs::read_to_string(&path) {
        Ok(text) => {
            let labels = parse_label_table(&text);
            if labels.is_empty() {
                debug!(path = %path.display(), "label document has no usable rows");
            } else {
                debug!(path = %path.display(), count = labels.len(), "loaded session labels");
            }
            labels
        }
        Err(error) => {
            warn!(path = %path.display(), %error, "ignoring unreadable label document");
            LabelMap::default()
        }
    }
}
