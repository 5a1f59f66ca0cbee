use crate::domain::{LogLine, last_timestamp, parse_log_line};
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use tracing::debug;

/// Streams a session log and returns the last real timestamp in it.
///
/// A missing or unreadable log simply has no timestamp; the caller falls back
/// to the index.
pub fn load_last_log_timestamp(path: &Path) -> Option<String> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(error) => {
            if error.kind() != io::ErrorKind::NotFound {
                debug!(path = %path.display(), %error, "session log not readable");
            }
            return None;
        }
    };

    last_timestamp(LogLineReader::new(path, BufReader::new(file)))
}

pub fn session_log_size(path: &Path) -> u64 {
    fs::metadata(path).map(|meta| meta.len()).unwrap_or(0)
}

struct LogLineReader<'a, R> {
    path: &'a Path,
    reader: R,
    line_no: u64,
    buf: Vec<u8>,
}

impl<'a, R: BufRead> LogLineReader<'a, R> {
    fn new(path: &'a Path, reader: R) -> Self {
        Self {
            path,
            reader,
            line_no: 0,
            buf: Vec::new(),
        }
    }
}

impl<R: BufRead> Iterator for LogLineReader<'_, R> {
    type Item = LogLine;

    fn next(&mut self) -> Option<LogLine> {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                self.line_no = self.line_no.saturating_add(1);
                let line = parse_log_line(&self.buf);
                if let LogLine::Malformed(reason) = &line {
                    debug!(
                        path = %self.path.display(),
                        line = self.line_no,
                        reason = reason.as_str(),
                        "skipping malformed session log line"
                    );
                }
                Some(line)
            }
            Err(error) => {
                debug!(path = %self.path.display(), %error, "stopped reading session log");
                None
            }
        }
    }
}
