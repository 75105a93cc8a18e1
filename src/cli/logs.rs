//! taskdeck logs command implementations (admin only)

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::output::{emit_success, format_table, HumanOutput, OutputOptions};
use crate::session_log::LogEntry;

use super::deck::Deck;

/// Options shared by the `taskdeck logs` subcommands
pub struct LogsOptions {
    pub root: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

impl LogsOptions {
    fn output(&self) -> OutputOptions {
        OutputOptions {
            json: self.json,
            quiet: self.quiet,
        }
    }
}

#[derive(Serialize)]
struct LogListOutput {
    total: usize,
    open: usize,
    entries: Vec<LogEntry>,
}

#[derive(Serialize)]
struct LogClearOutput {
    removed: usize,
}

pub fn run_list(options: LogsOptions) -> Result<()> {
    let deck = Deck::open(options.root.clone())?;
    deck.require_admin()?;

    // Newest first, as the admin log table shows them
    let mut entries = deck.session_log().entries();
    entries.reverse();
    let open = entries.iter().filter(|entry| entry.is_open_login()).count();

    let mut human = HumanOutput::new(format!("taskdeck logs: {} entries", entries.len()));
    human.push_summary("open sessions", open.to_string());
    let rows: Vec<Vec<String>> = entries
        .iter()
        .map(|entry| {
            vec![
                entry.id.clone(),
                entry.username.clone(),
                entry.role.clone(),
                entry.action.as_str().to_string(),
                format_time(entry.login_time),
                format_time(entry.logout_time),
                entry.ip_address.clone(),
            ]
        })
        .collect();
    if !rows.is_empty() {
        let header = ["ID", "USER", "ROLE", "ACTION", "LOGIN", "LOGOUT", "IP"];
        for line in format_table(&header, &rows) {
            human.push_detail(line);
        }
    }

    emit_success(
        options.output(),
        "logs list",
        &LogListOutput {
            total: entries.len(),
            open,
            entries,
        },
        &human,
    )
}

pub fn run_delete(options: LogsOptions, id: &str) -> Result<()> {
    let deck = Deck::open(options.root.clone())?;
    deck.require_admin()?;

    let removed = deck.session_log().delete(id)?;

    let mut human = HumanOutput::new(format!("taskdeck logs delete: {}", removed.id));
    human.push_summary("user", removed.username.clone());
    human.push_summary("action", removed.action.as_str());

    emit_success(options.output(), "logs delete", &removed, &human)
}

pub fn run_clear(options: LogsOptions) -> Result<()> {
    let deck = Deck::open(options.root.clone())?;
    deck.require_admin()?;

    let removed = deck.session_log().clear()?;

    let mut human = HumanOutput::new(format!("taskdeck logs clear: removed {removed} entries"));
    human.push_summary("removed", removed.to_string());

    emit_success(
        options.output(),
        "logs clear",
        &LogClearOutput { removed },
        &human,
    )
}

fn format_time(ts: Option<DateTime<Utc>>) -> String {
    ts.map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}
