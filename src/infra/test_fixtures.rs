use crate::infra::ProjectStore;
use serde_json::{Value, json};
use std::fs;
use tempfile::TempDir;

/// A throwaway projects root holding one project with `n` indexed sessions.
///
/// Session `s01` is the most recent and `sNN` the oldest. Every log has three
/// timestamped entries around one untimed `summary` line; every index entry
/// carries an older `modified` than its log so the log is what ranks.
pub struct ProjectFixture {
    _dir: TempDir,
    pub store: ProjectStore,
}

impl ProjectFixture {
    pub fn with_sessions(count: usize) -> Self {
        let dir = TempDir::new().expect("tempdir");
        let work_dir = dir.path().join("work").join("app");
        fs::create_dir_all(&work_dir).expect("work dir");
        let store = ProjectStore::new(&dir.path().join("projects"), work_dir);
        fs::create_dir_all(&store.project_dir).expect("project dir");

        let fixture = Self { _dir: dir, store };
        let mut entries = Vec::new();
        for n in 1..=count {
            let id = session_id(n);
            fixture.write_log(&id, &session_log(&id, n));
            entries.push(json!({
                "sessionId": id,
                "fileMtime": 1_769_904_000_000u64,
                "summary": format!("Summary {n}"),
                "messageCount": 3,
                "modified": index_modified_for(n),
            }));
        }
        let index = json!({
            "version": 1,
            "entries": entries,
            "originalPath": fixture.store.work_dir.display().to_string(),
        });
        fs::write(
            fixture.store.index_path(),
            serde_json::to_string_pretty(&index).expect("encode"),
        )
        .expect("write index");
        fixture
    }

    pub fn index_modified(&self, id: &str) -> String {
        let n = id.trim_start_matches('s').parse::<usize>().expect("fixture id");
        index_modified_for(n)
    }

    pub fn read_index(&self) -> String {
        fs::read_to_string(self.store.index_path()).expect("read index")
    }

    pub fn index_json(&self) -> Value {
        serde_json::from_str(&self.read_index()).expect("index json")
    }

    pub fn remove_index(&self) {
        fs::remove_file(self.store.index_path()).expect("remove index");
    }

    pub fn read_log(&self, id: &str) -> String {
        fs::read_to_string(self.store.log_path(id)).expect("read log")
    }

    pub fn write_log(&self, id: &str, text: &str) {
        fs::write(self.store.log_path(id), text).expect("write log");
    }

    pub fn remove_log(&self, id: &str) {
        fs::remove_file(self.store.log_path(id)).expect("remove log");
    }

    pub fn leftover_staging_files(&self) -> usize {
        fs::read_dir(&self.store.project_dir)
            .expect("read_dir")
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".ccresume.tmp"))
            .count()
    }
}

fn session_id(n: usize) -> String {
    format!("s{n:02}")
}

fn index_modified_for(n: usize) -> String {
    format!("2026-01-{:02}T00:00:00.000Z", 29 - n)
}

fn session_log(id: &str, n: usize) -> String {
    let day = 29 - n;
    [
        format!(
            r#"{{"type":"user","sessionId":"{id}","uuid":"{id}-0","timestamp":"2026-03-{day:02}T10:00:00.000Z","message":{{"content":"héllo"}}}}"#
        ),
        format!(
            r#"{{"type":"assistant","sessionId":"{id}","uuid":"{id}-1","timestamp":"2026-03-{day:02}T10:00:01.000Z"}}"#
        ),
        r#"{"type":"summary","summary":"wrap up","leafUuid":"x"}"#.to_string(),
        format!(
            r#"{{"type":"user","sessionId":"{id}","uuid":"{id}-2","timestamp":"2026-03-{day:02}T10:00:02.000Z"}}"#
        ),
    ]
    .join("\n")
        + "\n"
}
