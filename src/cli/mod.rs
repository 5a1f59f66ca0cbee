use crate::domain::{RankedSession, SessionCatalog, display_timestamp};
use crate::infra::{
    LoadSessionIndexError, ProjectStore, ReactivateError, ReactivationReport,
    ResolveWindowError, SESSIONS_INDEX_FILE_NAME, load_label_map, load_session_catalog,
    parse_window, reactivate_session, resolve_window,
};
use humansize::{WINDOWS, format_size};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use time::OffsetDateTime;

const RULE_WIDTH: usize = 110;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CliInvocation {
    PrintHelp,
    PrintVersion,
    Command(CliCommand),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CliCommand {
    List {
        project: Option<PathBuf>,
        window: Option<usize>,
    },
    Activate {
        session_id: String,
        project: Option<PathBuf>,
        window: Option<usize>,
    },
}

#[derive(Debug, Error)]
pub enum CliParseError {
    #[error("unknown command: {0}\nAvailable commands: list, activate")]
    UnknownSubcommand(String),

    #[error("unknown flag: {0}")]
    UnknownFlag(String),

    #[error("missing value for flag: {0}")]
    MissingFlagValue(String),

    #[error("invalid value for {flag}: {value}")]
    InvalidFlagValue { flag: String, value: String },

    #[error("unexpected argument: {0}")]
    UnexpectedArgument(String),

    #[error("please provide a session id\nUsage: ccresume activate <session-id>")]
    MissingSessionId,
}

pub fn parse_invocation(args: &[String]) -> Result<CliInvocation, CliParseError> {
    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        return Ok(CliInvocation::PrintHelp);
    }
    if args.iter().any(|arg| arg == "--version" || arg == "-V") {
        return Ok(CliInvocation::PrintVersion);
    }

    let mut iter = args.iter().skip(1);
    let Some(subcommand) = iter.next() else {
        return Ok(CliInvocation::PrintHelp);
    };

    let mut project: Option<PathBuf> = None;
    let mut window: Option<usize> = None;
    let mut positional: Vec<&String> = Vec::new();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--project" | "-p" => {
                let value = iter
                    .next()
                    .ok_or_else(|| CliParseError::MissingFlagValue("--project".to_string()))?;
                project = Some(PathBuf::from(value));
            }
            "--window" | "-w" => {
                let value = iter
                    .next()
                    .ok_or_else(|| CliParseError::MissingFlagValue("--window".to_string()))?;
                window = Some(parse_window_flag("--window", value)?);
            }
            _ if arg.starts_with('-') && arg.len() > 1 => {
                return Err(CliParseError::UnknownFlag(arg.to_string()));
            }
            _ => positional.push(arg),
        }
    }

    match subcommand.to_ascii_lowercase().as_str() {
        "list" | "ls" => {
            if let Some(arg) = positional.first() {
                return Err(CliParseError::UnexpectedArgument((*arg).to_string()));
            }
            Ok(CliInvocation::Command(CliCommand::List { project, window }))
        }
        "activate" => {
            let mut positional = positional.into_iter();
            let session_id = positional
                .next()
                .ok_or(CliParseError::MissingSessionId)?
                .to_string();
            if let Some(arg) = positional.next() {
                return Err(CliParseError::UnexpectedArgument(arg.to_string()));
            }
            Ok(CliInvocation::Command(CliCommand::Activate {
                session_id,
                project,
                window,
            }))
        }
        _ => Err(CliParseError::UnknownSubcommand(subcommand.to_string())),
    }
}

fn parse_window_flag(flag: &str, value: &str) -> Result<usize, CliParseError> {
    parse_window(value).ok_or_else(|| CliParseError::InvalidFlagValue {
        flag: flag.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Error)]
pub enum CliRunError {
    #[error(transparent)]
    LoadIndex(#[from] LoadSessionIndexError),

    #[error(transparent)]
    Reactivate(#[from] ReactivateError),

    #[error(transparent)]
    Window(#[from] ResolveWindowError),

    #[error(transparent)]
    WriteOutput(#[from] io::Error),

    #[error("failed to resolve current directory: {0}")]
    CurrentDir(String),
}

pub fn run(command: CliCommand, projects_root: &Path) -> Result<(), CliRunError> {
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());

    match command {
        CliCommand::List { project, window } => {
            let store = ProjectStore::new(projects_root, resolve_work_dir(project)?);
            let window = resolve_window(window)?;
            let labels = load_label_map(&store.work_dir);
            let catalog = load_session_catalog(&store, &labels, window)?;
            print_catalog(&mut out, &store, &catalog)?;
            flush_output(&mut out)?;
            Ok(())
        }
        CliCommand::Activate {
            session_id,
            project,
            window,
        } => {
            let store = ProjectStore::new(projects_root, resolve_work_dir(project)?);
            let window = resolve_window(window)?;
            let report = reactivate_session(&store, &session_id, OffsetDateTime::now_utc())?;

            let labels = load_label_map(&store.work_dir);
            let catalog = load_session_catalog(&store, &labels, window)?;
            print_activation(&mut out, &report, &catalog)?;
            flush_output(&mut out)?;
            Ok(())
        }
    }
}

fn resolve_work_dir(project: Option<PathBuf>) -> Result<PathBuf, CliRunError> {
    let base_dir =
        std::env::current_dir().map_err(|error| CliRunError::CurrentDir(error.to_string()))?;
    Ok(match project {
        Some(path) if path.is_absolute() => path,
        Some(path) => base_dir.join(path),
        None => base_dir,
    })
}

fn print_catalog(
    out: &mut impl Write,
    store: &ProjectStore,
    catalog: &SessionCatalog,
) -> io::Result<()> {
    let header = [
        format!("Project storage: {}", store.project_dir.display()),
        String::new(),
        format!(
            "Total {} sessions (top {} are resumable)",
            catalog.sessions.len(),
            catalog.window
        ),
        "=".repeat(RULE_WIDTH),
    ];
    for line in header {
        if !write_line(out, &line)? {
            return Ok(());
        }
    }

    for session in &catalog.sessions {
        if !write_line(out, &format_session_row(session))? {
            return Ok(());
        }
    }

    let footer = [
        String::new(),
        format!(
            "Hint: [ OK ] = resumable ({} now), [----] = needs `activate` first",
            catalog.reachable_count()
        ),
        format!("Usage: {} activate <session-id>", env!("CARGO_PKG_NAME")),
    ];
    for line in footer {
        if !write_line(out, &line)? {
            return Ok(());
        }
    }
    Ok(())
}

fn format_session_row(session: &RankedSession) -> String {
    let status = if session.reachable { " OK " } else { "----" };
    format!(
        "  [{status}] {:>3}. {}... | {} | {:>3} msgs | {:>9} | {}",
        session.rank,
        short_id(&session.id),
        display_timestamp(session.effective_timestamp.as_deref()),
        session.message_count,
        format_size(session.file_size_bytes, WINDOWS),
        session.display_name,
    )
}

fn print_activation(
    out: &mut impl Write,
    report: &ReactivationReport,
    catalog: &SessionCatalog,
) -> io::Result<()> {
    let ranked = catalog.position_of(&report.session_id);
    let mut lines = vec![format!("Session:  {}", report.session_id)];
    if let Some(label) = ranked.and_then(|session| session.label.as_deref()) {
        lines.push(format!("Label:    {label}"));
    }
    if let Some(title) = ranked
        .map(|session| session.custom_title.as_str())
        .filter(|title| !title.is_empty())
    {
        lines.push(format!("Title:    {title}"));
    }
    let summary = ranked.map_or(report.summary.as_str(), |session| session.summary.as_str());
    lines.push(format!("Summary:  {}", if summary.is_empty() { "N/A" } else { summary }));
    lines.push(String::new());

    lines.push(format!("Step 1: Rewrote chat log timestamps in {}", report.log_path.display()));
    for rewrite in &report.rewrites {
        lines.push(format!("  {} -> {}", rewrite.old, rewrite.new));
    }
    lines.push(format!("  Modified {} message timestamps", report.rewrites.len()));
    lines.push(String::new());

    lines.push("Step 2: Updated session index".to_string());
    lines.push(format!(
        "  modified: {} -> {}",
        report.index_modified_before.as_deref().unwrap_or("N/A"),
        report.index_modified_after
    ));
    lines.push(format!("  {SESSIONS_INDEX_FILE_NAME} updated"));
    lines.push(String::new());

    match ranked {
        Some(session) if session.reachable => lines.push(format!(
            "Activation successful! Ranked #{} of {}. You can now resume this session:",
            session.rank,
            catalog.sessions.len()
        )),
        Some(session) => lines.push(format!(
            "Warning: session still ranks #{} (outside the top {}).",
            session.rank, catalog.window
        )),
        None => {}
    }
    lines.push(format!("  claude --resume {}", report.session_id));

    for line in lines {
        if !write_line(out, &line)? {
            return Ok(());
        }
    }
    Ok(())
}

fn short_id(value: &str) -> String {
    let max = 8usize;
    value.chars().take(max).collect()
}

fn flush_output(out: &mut impl Write) -> io::Result<()> {
    match out.flush() {
        Err(error) if error.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    }
}

fn write_line(out: &mut impl Write, line: &str) -> io::Result<bool> {
    match writeln!(out, "{line}") {
        Ok(()) => Ok(true),
        Err(error) if error.kind() == io::ErrorKind::BrokenPipe => Ok(false),
        Err(error) => Err(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LabelMap, TimestampRewrite};
    use crate::infra::test_fixtures::ProjectFixture;
    use time::macros::datetime;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    fn ranked(rank: usize, reachable: bool) -> RankedSession {
        RankedSession {
            id: "0123456789abcdef".to_string(),
            rank,
            reachable,
            effective_timestamp: Some("2026-02-19T08:15:30.123Z".to_string()),
            index_timestamp: None,
            message_count: 42,
            summary: "Fix the parser".to_string(),
            custom_title: String::new(),
            file_size_bytes: 512,
            label: None,
            display_name: "Fix the parser".to_string(),
        }
    }

    #[test]
    fn parse_without_args_prints_help() {
        let parsed = parse_invocation(&args(&["ccresume"])).expect("parse");
        assert_eq!(parsed, CliInvocation::PrintHelp);
    }

    #[test]
    fn parse_help_flag_wins() {
        let parsed = parse_invocation(&args(&["ccresume", "activate", "--help"])).expect("parse");
        assert_eq!(parsed, CliInvocation::PrintHelp);
    }

    #[test]
    fn parse_version_flag() {
        let parsed = parse_invocation(&args(&["ccresume", "-V"])).expect("parse");
        assert_eq!(parsed, CliInvocation::PrintVersion);
    }

    #[test]
    fn parse_list_command() {
        let parsed = parse_invocation(&args(&["ccresume", "list"])).expect("parse");
        assert_eq!(
            parsed,
            CliInvocation::Command(CliCommand::List {
                project: None,
                window: None
            })
        );
    }

    #[test]
    fn parse_list_accepts_window_and_project() {
        let parsed = parse_invocation(&args(&[
            "ccresume", "LIST", "--window", "20", "--project", "/tmp/app",
        ]))
        .expect("parse");
        assert_eq!(
            parsed,
            CliInvocation::Command(CliCommand::List {
                project: Some(PathBuf::from("/tmp/app")),
                window: Some(20)
            })
        );
    }

    #[test]
    fn parse_list_rejects_positional_argument() {
        let result = parse_invocation(&args(&["ccresume", "list", "abc"]));
        assert!(matches!(result, Err(CliParseError::UnexpectedArgument(_))));
    }

    #[test]
    fn parse_activate_takes_a_session_id() {
        let parsed = parse_invocation(&args(&["ccresume", "activate", "019c754c"])).expect("parse");
        assert_eq!(
            parsed,
            CliInvocation::Command(CliCommand::Activate {
                session_id: "019c754c".to_string(),
                project: None,
                window: None
            })
        );
    }

    #[test]
    fn parse_activate_without_id_fails() {
        let result = parse_invocation(&args(&["ccresume", "activate"]));
        assert!(matches!(result, Err(CliParseError::MissingSessionId)));
    }

    #[test]
    fn parse_activate_rejects_extra_arguments() {
        let result = parse_invocation(&args(&["ccresume", "activate", "a", "b"]));
        assert!(matches!(result, Err(CliParseError::UnexpectedArgument(_))));
    }

    #[test]
    fn parse_rejects_unknown_command_and_flags() {
        assert!(matches!(
            parse_invocation(&args(&["ccresume", "delete"])),
            Err(CliParseError::UnknownSubcommand(_))
        ));
        assert!(matches!(
            parse_invocation(&args(&["ccresume", "list", "--all"])),
            Err(CliParseError::UnknownFlag(_))
        ));
        assert!(matches!(
            parse_invocation(&args(&["ccresume", "list", "--window"])),
            Err(CliParseError::MissingFlagValue(_))
        ));
        assert!(matches!(
            parse_invocation(&args(&["ccresume", "list", "--window", "0"])),
            Err(CliParseError::InvalidFlagValue { .. })
        ));
    }

    #[test]
    fn session_row_shows_marker_rank_and_short_id() {
        let row = format_session_row(&ranked(3, true));
        assert!(row.starts_with("  [ OK ]   3. 01234567... | 2026-02-19 08:15:30 |  42 msgs |"));
        assert!(row.ends_with("| Fix the parser"));

        let row = format_session_row(&ranked(11, false));
        assert!(row.starts_with("  [----]  11. "));
    }

    #[test]
    fn catalog_listing_has_header_rows_and_footer() {
        let fixture = ProjectFixture::with_sessions(3);
        let catalog =
            load_session_catalog(&fixture.store, &LabelMap::default(), 2).expect("catalog");

        let mut buf = Vec::new();
        print_catalog(&mut buf, &fixture.store, &catalog).expect("print");
        let text = String::from_utf8(buf).expect("utf8");
        let lines = text.lines().collect::<Vec<_>>();

        assert!(lines[0].starts_with("Project storage: "));
        assert_eq!(lines[2], "Total 3 sessions (top 2 are resumable)");
        assert_eq!(lines[3].len(), RULE_WIDTH);
        assert!(lines[4].starts_with("  [ OK ]   1. s01..."));
        assert!(lines[6].starts_with("  [----]   3. s03..."));
        assert!(lines[6].ends_with("| Summary 3"));
    }

    #[test]
    fn activation_output_lists_every_rewrite() {
        let report = ReactivationReport {
            session_id: "abc".to_string(),
            summary: String::new(),
            log_path: PathBuf::from("/p/abc.jsonl"),
            rewrites: vec![TimestampRewrite {
                line_index: 0,
                old: "2026-01-01T00:00:00.000Z".to_string(),
                new: "2026-10-17T12:00:00.000Z".to_string(),
            }],
            index_modified_before: Some("2026-01-01T00:00:00.000Z".to_string()),
            index_modified_after: "2026-10-17T12:00:00.000Z".to_string(),
        };
        let mut session = ranked(1, true);
        session.id = "abc".to_string();
        session.summary = String::new();
        session.custom_title = "Parser rework".to_string();
        session.label = Some("S1 Guru".to_string());
        let catalog = SessionCatalog {
            sessions: vec![session],
            window: 10,
        };

        let mut buf = Vec::new();
        print_activation(&mut buf, &report, &catalog).expect("print");
        let text = String::from_utf8(buf).expect("utf8");

        assert!(text.contains("Label:    S1 Guru"));
        assert!(text.contains("Title:    Parser rework"));
        assert!(text.contains("Summary:  N/A"));
        assert!(text.contains("Activation successful! Ranked #1 of 1."));
        assert!(text.contains("  2026-01-01T00:00:00.000Z -> 2026-10-17T12:00:00.000Z"));
        assert!(text.contains("  Modified 1 message timestamps"));
        assert!(text.contains("  modified: 2026-01-01T00:00:00.000Z -> 2026-10-17T12:00:00.000Z"));
        assert!(text.ends_with("  claude --resume abc\n"));
    }

    #[test]
    fn activation_output_warns_when_still_outside_the_window() {
        let report = ReactivationReport {
            session_id: "0123456789abcdef".to_string(),
            summary: "Fix the parser".to_string(),
            log_path: PathBuf::from("/p/x.jsonl"),
            rewrites: Vec::new(),
            index_modified_before: None,
            index_modified_after: "2026-10-17T12:00:00.000Z".to_string(),
        };
        let catalog = SessionCatalog {
            sessions: vec![ranked(12, false)],
            window: 10,
        };

        let mut buf = Vec::new();
        print_activation(&mut buf, &report, &catalog).expect("print");
        let text = String::from_utf8(buf).expect("utf8");

        assert!(!text.contains("Label:"));
        assert!(text.contains("Summary:  Fix the parser"));
        assert!(text.contains("  modified: N/A -> 2026-10-17T12:00:00.000Z"));
        assert!(text.contains("Warning: session still ranks #12 (outside the top 10)."));
    }

    #[test]
    fn activating_an_old_session_prints_its_new_rank() {
        let fixture = ProjectFixture::with_sessions(12);
        let docs = fixture.store.work_dir.join("doc").join("reference");
        std::fs::create_dir_all(&docs).expect("doc dir");
        std::fs::write(
            docs.join("claude-sessions.md"),
            "| ID | Name | Tags | Status | Session |\n|---|---|---|---|---|\n| S12 | Archivist | a | b | `s12` |\n",
        )
        .expect("write labels");

        let before = load_session_catalog(&fixture.store, &LabelMap::default(), 10)
            .expect("catalog");
        assert!(!before.position_of("s12").expect("s12").reachable);

        let report = reactivate_session(
            &fixture.store,
            "s12",
            datetime!(2026-10-17 12:00:00 UTC),
        )
        .expect("activate");
        let labels = load_label_map(&fixture.store.work_dir);
        let catalog = load_session_catalog(&fixture.store, &labels, 10).expect("catalog");

        let mut buf = Vec::new();
        print_activation(&mut buf, &report, &catalog).expect("print");
        let text = String::from_utf8(buf).expect("utf8");

        assert!(text.starts_with("Session:  s12\nLabel:    S12 Archivist\n"));
        assert!(text.contains("Summary:  Summary 12"));
        assert!(text.contains("  Modified 3 message timestamps"));
        assert!(text.contains("  modified: 2026-01-17T00:00:00.000Z -> 2026-10-17T12:00:00.000Z"));
        assert!(text.contains("Activation successful! Ranked #1 of 12."));
        assert!(text.ends_with("  claude --resume s12\n"));
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }
        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }
    }

    #[test]
    fn write_line_treats_broken_pipe_as_stop() {
        assert!(!write_line(&mut BrokenPipe, "x").expect("no error"));
    }

    #[test]
    fn buffered_listing_into_a_closed_pipe_ends_quietly() {
        let fixture = ProjectFixture::with_sessions(3);
        let catalog =
            load_session_catalog(&fixture.store, &LabelMap::default(), 10).expect("catalog");

        let mut out = io::BufWriter::new(BrokenPipe);
        print_catalog(&mut out, &fixture.store, &catalog).expect("print");
        flush_output(&mut out).expect("flush");
    }
}
