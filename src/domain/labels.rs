use crate::domain::LabelMap;
use regex::Regex;
use std::sync::LazyLock;

static TABLE_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\|.*(?:ID|编号).*\|.*(?:Name|名称).*\|").expect("valid header regex")
});

static LABEL_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]+\d+$").expect("valid label id regex"));

const MIN_ROW_CELLS: usize = 6;
const ID_CELL: usize = 1;
const NAME_CELL: usize = 2;
const SESSION_ID_CELL: usize = 5;

/// Parses `| ID | Name | Tags | Status | Session ID |` tables.
///
/// Rows that do not fit the table shape are skipped; the result is whatever
/// could be recovered, possibly empty.
pub fn parse_label_table(text: &str) -> LabelMap {
    let mut labels = LabelMap::default();
    let mut in_table = false;

    for line in text.lines() {
        let line = line.trim();
        if TABLE_HEADER_RE.is_match(line) {
            in_table = true;
            continue;
        }
        if is_separator_row(line) {
            continue;
        }
        if line.starts_with("---") {
            in_table = false;
            continue;
        }
        if !in_table || !line.starts_with('|') {
            continue;
        }

        if let Some((session_id, label)) = parse_label_row(line) {
            labels.insert(session_id, label);
        }
    }

    labels
}

fn parse_label_row(line: &str) -> Option<(String, String)> {
    let cells = line.split('|').map(str::trim).collect::<Vec<_>>();
    if cells.len() < MIN_ROW_CELLS {
        return None;
    }

    let label_id = cells[ID_CELL];
    if !LABEL_ID_RE.is_match(label_id) {
        return None;
    }

    let session_id = cells[SESSION_ID_CELL].trim_matches('`').trim();
    if session_id.is_empty() {
        return None;
    }

    Some((
        session_id.to_string(),
        format!("{label_id} {}", cells[NAME_CELL]),
    ))
}

fn is_separator_row(line: &str) -> bool {
    line.starts_with('|')
        && line.contains('-')
        && line
            .chars()
            .all(|ch| matches!(ch, '|' | '-' | ':' | ' ' | '\t'))
}
