use crate::domain::IndexEntry;
use thiserror::Error;

#[derive(Debug, Error, Eq, PartialEq)]
pub enum ResolveSessionError {
    #[error(
        "no session matching '{query}'\nHint: run `ccresume list` and copy an id from the list."
    )]
    NotFound { query: String },

    #[error(
        "'{query}' matches multiple sessions:\n{}\nHint: pass a longer prefix of the session id.",
        format_candidates(.candidates)
    )]
    Ambiguous {
        query: String,
        candidates: Vec<String>,
    },
}

fn format_candidates(candidates: &[String]) -> String {
    candidates
        .iter()
        .map(|id| format!("  {id}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Finds the single entry a full or partial session id refers to.
///
/// Prefix matches are tried first; only when no id starts with `query` does
/// a substring match get a chance. More than one hit is always an error.
pub fn resolve_session<'a>(
    query: &str,
    entries: &'a [IndexEntry],
) -> Result<&'a IndexEntry, ResolveSessionError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(ResolveSessionError::NotFound {
            query: query.to_string(),
        });
    }

    let mut matches = entries
        .iter()
        .filter(|entry| entry.session_id.starts_with(query))
        .collect::<Vec<_>>();
    if matches.is_empty() {
        matches = entries
            .iter()
            .filter(|entry| entry.session_id.contains(query))
            .collect();
    }

    match matches.as_slice() {
        [] => Err(ResolveSessionError::NotFound {
            query: query.to_string(),
        }),
        [entry] => Ok(*entry),
        many => Err(ResolveSessionError::Ambiguous {
            query: query.to_string(),
            candidates: many.iter().map(|entry| entry.session_id.clone()).collect(),
        }),
    }
}
