use crate::domain::{IndexEntry, LabelMap, RankedSession, SessionCatalog};
use unicode_width::UnicodeWidthStr;

/// Number of most recent sessions the host lets `claude --resume` reach.
pub const DEFAULT_RESUMABLE_WINDOW: usize = 10;

pub const DISPLAY_NAME_WIDTH: usize = 40;

#[derive(Clone, Debug)]
pub struct CatalogInput {
    pub entry: IndexEntry,
    pub last_log_timestamp: Option<String>,
    pub file_size_bytes: u64,
}

/// Ranks sessions newest first by their effective timestamp.
///
/// Timestamps are zero-padded ISO-8601 strings, so plain string ordering is
/// chronological. Sessions with no timestamp at all sink to the bottom; ties
/// keep index order.
pub fn build_catalog(
    inputs: Vec<CatalogInput>,
    labels: &LabelMap,
    window: usize,
) -> SessionCatalog {
    let mut sessions = inputs
        .into_iter()
        .map(|input| ranked_session_from_input(input, labels))
        .collect::<Vec<_>>();

    sessions.sort_by(|a, b| b.effective_timestamp.cmp(&a.effective_timestamp));

    for (idx, session) in sessions.iter_mut().enumerate() {
        session.rank = idx + 1;
        session.reachable = idx < window;
    }

    SessionCatalog { sessions, window }
}

fn ranked_session_from_input(input: CatalogInput, labels: &LabelMap) -> RankedSession {
    let CatalogInput {
        entry,
        last_log_timestamp,
        file_size_bytes,
    } = input;

    let index_timestamp = entry.index_timestamp();
    let effective_timestamp = last_log_timestamp.or_else(|| index_timestamp.clone());
    let label = labels.label_for(&entry.session_id).map(|s| s.to_string());
    let display_name = display_name(label.as_deref(), &entry.custom_title, &entry.summary);

    RankedSession {
        id: entry.session_id,
        rank: 0,
        reachable: false,
        effective_timestamp,
        index_timestamp,
        message_count: entry.message_count,
        summary: entry.summary,
        custom_title: entry.custom_title,
        file_size_bytes,
        label,
        display_name,
    }
}

/// Label wins, then the user's custom title, then the host summary.
pub fn display_name(label: Option<&str>, custom_title: &str, summary: &str) -> String {
    if let Some(label) = label.filter(|s| !s.is_empty()) {
        return label.to_string();
    }
    if !custom_title.is_empty() {
        return truncate_end(custom_title, DISPLAY_NAME_WIDTH);
    }
    truncate_end(summary, DISPLAY_NAME_WIDTH)
}

fn truncate_end(text: &str, width: usize) -> String {
    if width == 0 {
        return String::new();
    }
    if UnicodeWidthStr::width(text) <= width {
        return text.to_string();
    }
    let mut out = String::new();
    for ch in text.chars() {
        let next = format!("{out}{ch}");
        if UnicodeWidthStr::width(next.as_str()) > width {
            break;
        }
        out.push(ch);
    }
    out
}
