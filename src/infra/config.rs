use crate::domain::DEFAULT_RESUMABLE_WINDOW;
use dirs::home_dir;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const SESSIONS_INDEX_FILE_NAME: &str = "sessions-index.json";
const SESSION_LOG_EXTENSION: &str = "jsonl";
const WINDOW_ENV: &str = "CCRESUME_WINDOW";

#[derive(Debug, Error)]
pub enum ResolveClaudeProjectsDirError {
    #[error("home directory not found")]
    HomeDirNotFound,
}

pub fn resolve_claude_projects_dir() -> Result<PathBuf, ResolveClaudeProjectsDirError> {
    let override_dir = std::env::var_os("CLAUDE_PROJECTS_DIR").filter(|value| !value.is_empty());
    if let Some(override_dir) = override_dir {
        return Ok(PathBuf::from(override_dir));
    }

    let Some(home) = home_dir() else {
        return Err(ResolveClaudeProjectsDirError::HomeDirNotFound);
    };

    Ok(home.join(".claude").join("projects"))
}

/// Directory name the host uses for a working directory:
/// `/home/me/app` -> `-home-me-app`, `D:\Work\app` -> `D--Work-app`.
pub fn project_key(work_dir: &Path) -> String {
    work_dir
        .to_string_lossy()
        .chars()
        .map(|ch| match ch {
            ':' | '\\' | '/' => '-',
            other => other,
        })
        .collect()
}

/// Where one project's sessions live, plus the working directory they
/// belong to (used to find the label document).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProjectStore {
    pub work_dir: PathBuf,
    pub project_dir: PathBuf,
}

impl ProjectStore {
    pub fn new(projects_root: &Path, work_dir: PathBuf) -> Self {
        let project_dir = projects_root.join(project_key(&work_dir));
        Self {
            work_dir,
            project_dir,
        }
    }

    pub fn index_path(&self) -> PathBuf {
        self.project_dir.join(SESSIONS_INDEX_FILE_NAME)
    }

    pub fn log_path(&self, session_id: &str) -> PathBuf {
        self.project_dir
            .join(format!("{session_id}.{SESSION_LOG_EXTENSION}"))
    }
}

#[derive(Debug, Error)]
pub enum ResolveWindowError {
    #[error("invalid value for {WINDOW_ENV}: {0} (expected a whole number >= 1)")]
    InvalidEnv(String),
}

pub fn resolve_window(flag: Option<usize>) -> Result<usize, ResolveWindowError> {
    resolve_window_from(flag, std::env::var(WINDOW_ENV).ok())
}

/// Flag beats environment beats the host default.
pub fn resolve_window_from(
    flag: Option<usize>,
    env: Option<String>,
) -> Result<usize, ResolveWindowError> {
    if let Some(window) = flag {
        return Ok(window);
    }
    match env {
        Some(raw) => parse_window(&raw).ok_or(ResolveWindowError::InvalidEnv(raw)),
        None => Ok(DEFAULT_RESUMABLE_WINDOW),
    }
}

pub fn parse_window(raw: &str) -> Option<usize> {
    raw.trim().parse::<usize>().ok().filter(|value| *value >= 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_key_replaces_separators() {
        assert_eq!(project_key(Path::new("/home/me/app")), "-home-me-app");
        assert_eq!(project_key(Path::new(r"D:\Work\app")), "D--Work-app");
        assert_eq!(project_key(Path::new("/tmp/my.app_2")), "-tmp-my.app_2");
    }

    #[test]
    fn project_store_paths_live_under_the_key_dir() {
        let store = ProjectStore::new(Path::new("/root/.claude/projects"), PathBuf::from("/w/p"));
        assert_eq!(
            store.project_dir,
            PathBuf::from("/root/.claude/projects/-w-p")
        );
        assert_eq!(
            store.index_path(),
            PathBuf::from("/root/.claude/projects/-w-p/sessions-index.json")
        );
        assert_eq!(
            store.log_path("abc"),
            PathBuf::from("/root/.claude/projects/-w-p/abc.jsonl")
        );
    }

    #[test]
    fn parse_window_rejects_zero_and_garbage() {
        assert_eq!(parse_window("10"), Some(10));
        assert_eq!(parse_window(" 3 "), Some(3));
        assert_eq!(parse_window("0"), None);
        assert_eq!(parse_window("ten"), None);
    }

    #[test]
    fn explicit_window_flag_wins() {
        assert_eq!(resolve_window(Some(4)).expect("window"), 4);
        assert_eq!(
            resolve_window_from(Some(4), Some("20".to_string())).expect("window"),
            4
        );
    }

    #[test]
    fn window_env_is_used_without_a_flag() {
        assert_eq!(
            resolve_window_from(None, Some(" 15 ".to_string())).expect("window"),
            15
        );
        assert_eq!(
            resolve_window_from(None, None).expect("window"),
            DEFAULT_RESUMABLE_WINDOW
        );
    }

    #[test]
    fn invalid_window_env_is_an_error() {
        let result = resolve_window_from(None, Some("0".to_string()));
        assert!(matches!(result, Err(ResolveWindowError::InvalidEnv(raw)) if raw == "0"));

        let result = resolve_window_from(None, Some("many".to_string()));
        let error = result.expect_err("invalid env");
        assert!(error.to_string().contains("CCRESUME_WINDOW"));
    }
}
