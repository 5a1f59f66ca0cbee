mod cli;
mod domain;
mod infra;

use crate::cli::CliInvocation;
use crate::infra::{ResolveClaudeProjectsDirError, resolve_claude_projects_dir};
use std::io::{self, Write};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
enum MainError {
    #[error(transparent)]
    ProjectsDir(#[from] ResolveClaudeProjectsDirError),

    #[error(transparent)]
    Cli(#[from] crate::cli::CliRunError),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok()))
        .with_writer(io::stderr)
        .init();

    if let Err(error) = run_main() {
        let mut err = io::stderr().lock();
        let _ = writeln!(err, "Error: {error}");
        std::process::exit(1);
    }
}

/// `RUST_LOG` directives when present and valid, else warnings only.
fn log_filter(directives: Option<String>) -> EnvFilter {
    directives
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"))
}

fn run_main() -> Result<(), MainError> {
    let args = std::env::args().collect::<Vec<_>>();
    let invocation = match crate::cli::parse_invocation(&args) {
        Ok(invocation) => invocation,
        Err(error) => {
            let mut err = io::stderr().lock();
            let _ = writeln!(err, "Error: {error}");
            let _ = writeln!(err);
            drop(err);
            print_help();
            std::process::exit(2);
        }
    };

    match invocation {
        CliInvocation::PrintHelp => {
            print_help();
            Ok(())
        }
        CliInvocation::PrintVersion => {
            let mut out = io::stdout().lock();
            let _ = writeln!(out, "{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        CliInvocation::Command(command) => {
            let projects_root = resolve_claude_projects_dir()?;
            crate::cli::run(command, &projects_root)?;
            Ok(())
        }
    }
}

fn print_help() {
    let text = format!(
        "{name} - list Claude Code sessions and bring old ones back into `claude --resume`\n\nClaude Code only offers the {window} most recently active sessions of a project for\nresuming. Older sessions keep their full history on disk; `activate` gives one of\nthem fresh timestamps so it ranks among the newest again.\n\nUSAGE:\n  {name} list [--window N] [--project DIR]             Rank sessions of the project\n  {name} activate <session-id> [--project DIR]         Make a session resumable again\n  {name} --help | --version\n\nSESSION ID:\n  A full id, a unique prefix, or a unique substring of one.\n\nFLAGS:\n  --project DIR  Project working directory (default: current directory)\n  --window N     Resumable window size (default: {window})\n\nFILES:\n  <projects>/<project-key>/sessions-index.json   Session index (rewritten by activate)\n  <projects>/<project-key>/<session-id>.jsonl    Session log (rewritten by activate)\n  doc/reference/claude-sessions.md               Optional session label table\n\nENV:\n  CLAUDE_PROJECTS_DIR  Override Claude projects dir (default: ~/.claude/projects)\n  CCRESUME_WINDOW      Default resumable window size\n  RUST_LOG             Diagnostic log filter (default: warn)\n\nActivate assumes nothing else writes to the session while it runs; close any\nClaude Code instance that has the session open first.\n",
        name = env!("CARGO_PKG_NAME"),
        window = crate::domain::DEFAULT_RESUMABLE_WINDOW,
    );
    let mut out = io::stdout().lock();
    let _ = write!(out, "{text}");
}
