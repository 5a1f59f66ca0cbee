use crate::domain::{ReactivationClock, entry_timestamp};
use serde_json::{Map, Value};

/// How many trailing entries a reactivation is allowed to touch.
pub const REWRITE_TAIL_ENTRIES: usize = 5;

/// One line of a `.jsonl` session log.
///
/// Malformed lines are data, not errors: the host may be appending while we
/// read, and a torn last line must not hide the rest of the log.
#[derive(Clone, Debug, PartialEq)]
pub enum LogLine {
    Blank,
    Malformed(String),
    Entry(Map<String, Value>),
}

impl LogLine {
    pub fn timestamp(&self) -> Option<&str> {
        match self {
            Self::Entry(entry) => entry_timestamp(entry),
            Self::Blank | Self::Malformed(_) => None,
        }
    }
}

pub fn parse_log_line(raw: &[u8]) -> LogLine {
    let text = match std::str::from_utf8(raw) {
        Ok(text) => text,
        Err(error) => return LogLine::Malformed(format!("invalid utf-8: {error}")),
    };
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return LogLine::Blank;
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(entry)) => LogLine::Entry(entry),
        Ok(_) => LogLine::Malformed("not a json object".to_string()),
        Err(error) => LogLine::Malformed(format!("invalid json: {error}")),
    }
}

/// Timestamp of the last entry, in file order, that has a real one.
pub fn last_timestamp<I>(lines: I) -> Option<String>
where
    I: IntoIterator<Item = LogLine>,
{
    lines.into_iter().fold(None, |last, line| {
        line.timestamp().map(|ts| ts.to_string()).or(last)
    })
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TimestampRewrite {
    pub line_index: usize,
    pub old: String,
    pub new: String,
}

/// A whole session log held in memory for a read-modify-write cycle.
///
/// Raw line bytes are kept so untouched lines go back out exactly as read.
#[derive(Debug)]
pub struct SessionLogDocument<'a> {
    raw_lines: Vec<&'a [u8]>,
    lines: Vec<LogLine>,
    trailing_newline: bool,
}

impl<'a> SessionLogDocument<'a> {
    pub fn parse(bytes: &'a [u8]) -> Self {
        let trailing_newline = bytes.ends_with(b"\n");
        let raw_lines = if bytes.is_empty() {
            Vec::new()
        } else {
            let body = bytes.strip_suffix(b"\n").unwrap_or(bytes);
            body.split(|b| *b == b'\n').collect::<Vec<_>>()
        };
        let lines = raw_lines.iter().map(|raw| parse_log_line(raw)).collect();

        Self {
            raw_lines,
            lines,
            trailing_newline,
        }
    }

    /// Picks the timestamped entries among the last few non-blank lines and
    /// gives each a fresh time derived from `clock`.
    ///
    /// Offsets count up in file order, so the newest line keeps the newest
    /// time and no two rewritten entries share a value.
    pub fn plan_rewrites(
        &self,
        clock: &ReactivationClock,
    ) -> Result<Vec<TimestampRewrite>, time::error::Format> {
        let mut targets = self
            .lines
            .iter()
            .enumerate()
            .rev()
            .filter(|(_, line)| **line != LogLine::Blank)
            .take(REWRITE_TAIL_ENTRIES)
            .filter_map(|(idx, line)| line.timestamp().map(|ts| (idx, ts.to_string())))
            .collect::<Vec<_>>();
        targets.reverse();

        let mut rewrites = Vec::with_capacity(targets.len());
        for (offset, (line_index, old)) in targets.into_iter().enumerate() {
            rewrites.push(TimestampRewrite {
                line_index,
                old,
                new: clock.timestamp_at_offset(offset as i64)?,
            });
        }
        Ok(rewrites)
    }

    pub fn render(&self, rewrites: &[TimestampRewrite]) -> Result<Vec<u8>, serde_json::Error> {
        let mut out = Vec::new();
        for (idx, raw) in self.raw_lines.iter().enumerate() {
            if idx > 0 {
                out.push(b'\n');
            }

            let rewrite = rewrites.iter().find(|rewrite| rewrite.line_index == idx);
            match (rewrite, &self.lines[idx]) {
                (Some(rewrite), LogLine::Entry(entry)) => {
                    let mut entry = entry.clone();
                    entry.insert("timestamp".to_string(), Value::String(rewrite.new.clone()));
                    out.extend(serde_json::to_vec(&entry)?);
                    if raw.ends_with(b"\r") {
                        out.push(b'\r');
                    }
                }
                _ => out.extend_from_slice(raw),
            }
        }
        if self.trailing_newline {
            out.push(b'\n');
        }
        Ok(out)
    }
}
