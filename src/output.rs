//! Shared output formatting for taskdeck CLI commands.
//!
//! Every command renders either a JSON envelope (`--json`) or a short human
//! report built from a `HumanOutput`. Errors use the same envelope with
//! `status: "error"`; in human mode they go to stderr.

use std::fmt;

use serde::Serialize;

use crate::error::{exit_codes, Error, Result};

pub const SCHEMA_VERSION: &str = "taskdeck.v1";

/// Command groups whose subcommand is part of the reported command name
const COMMAND_GROUPS: [&str; 4] = ["task", "logs", "users", "notes"];

/// Global flags that consume the following argument
const VALUE_FLAGS: [&str; 1] = ["--root"];

#[derive(Debug, Clone, Copy)]
pub struct OutputOptions {
    pub json: bool,
    pub quiet: bool,
}

/// Human report: a header line, then optional `key: value` summary lines and
/// bulleted details, warnings and next steps.
#[derive(Debug, Clone)]
pub struct HumanOutput {
    header: String,
    summary: Vec<(String, String)>,
    details: Vec<String>,
    warnings: Vec<String>,
    next_steps: Vec<String>,
}

impl HumanOutput {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            summary: Vec::new(),
            details: Vec::new(),
            warnings: Vec::new(),
            next_steps: Vec::new(),
        }
    }

    /// Summary line; an empty value prints the key alone
    pub fn push_summary(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.summary.push((key.into(), value.into()));
    }

    pub fn push_detail(&mut self, value: impl Into<String>) {
        self.details.push(value.into());
    }

    pub fn push_warning(&mut self, value: impl Into<String>) {
        self.warnings.push(value.into());
    }

    pub fn push_next_step(&mut self, value: impl Into<String>) {
        self.next_steps.push(value.into());
    }
}

impl fmt::Display for HumanOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.header)?;

        let summary: Vec<String> = self
            .summary
            .iter()
            .map(|(key, value)| {
                if value.is_empty() {
                    key.clone()
                } else {
                    format!("{key}: {value}")
                }
            })
            .collect();

        for (title, items) in [
            ("Summary", &summary),
            ("Details", &self.details),
            ("Warnings", &self.warnings),
            ("Next steps", &self.next_steps),
        ] {
            if items.is_empty() {
                continue;
            }
            write!(f, "\n\n{title}:")?;
            for item in items {
                write!(f, "\n- {item}")?;
            }
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    schema_version: &'static str,
    command: &'a str,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorBody>,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    warnings: &'a [String],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    next_steps: Vec<String>,
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
    code: i32,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl From<&Error> for ErrorBody {
    fn from(err: &Error) -> Self {
        Self {
            message: err.to_string(),
            code: err.exit_code(),
            kind: error_kind(err),
            details: err.details(),
        }
    }
}

/// Print a successful result: the envelope with `--json`, otherwise the
/// human report unless `--quiet`.
pub fn emit_success<T: Serialize>(
    options: OutputOptions,
    command: &str,
    data: &T,
    human: &HumanOutput,
) -> Result<()> {
    if options.json {
        let payload = Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: "success",
            data: Some(data),
            error: None,
            warnings: &human.warnings,
            next_steps: human.next_steps.clone(),
        };
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else if !options.quiet {
        println!("{human}");
    }
    Ok(())
}

/// Print a failed command: the error envelope on stdout with `--json`,
/// otherwise `error:` and `hint:` lines on stderr.
pub fn emit_error(command: &str, err: &Error, json: bool) -> Result<()> {
    let hint = error_hint(err);

    if json {
        let payload: Envelope<'_, ()> = Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: "error",
            data: None,
            error: Some(ErrorBody::from(err)),
            warnings: &[],
            next_steps: hint.into_iter().collect(),
        };
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    eprintln!("error: {err}");
    if let Some(hint) = hint {
        eprintln!("hint: {hint}");
    }
    Ok(())
}

/// Command name for reporting, e.g. `login` or `task list`, from the raw
/// arguments (without the program name). Works before clap has parsed them.
pub fn command_name<I>(args: I) -> String
where
    I: IntoIterator<Item = String>,
{
    let mut words = Vec::new();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        if VALUE_FLAGS.contains(&arg.as_str()) {
            args.next();
            continue;
        }
        if arg.starts_with('-') {
            continue;
        }
        words.push(arg);
        let is_group = words.len() == 1 && COMMAND_GROUPS.contains(&words[0].as_str());
        if !is_group {
            break;
        }
    }

    if words.is_empty() {
        "taskdeck".to_string()
    } else {
        words.join(" ")
    }
}

fn error_kind(err: &Error) -> &'static str {
    match err.exit_code() {
        exit_codes::USER_ERROR => "user_error",
        exit_codes::POLICY_BLOCKED => "policy_blocked",
        _ => "operation_failed",
    }
}

/// Command the user can run next to get past `err`
fn error_hint(err: &Error) -> Option<String> {
    let hint = match err {
        Error::NotInitialized(_) => "taskdeck init".to_string(),
        Error::NotAuthenticated => "taskdeck login --email <email> --password <password>".to_string(),
        Error::Forbidden { required, .. } => {
            format!("taskdeck login with an account whose role is {required}")
        }
        Error::UserNotFound(_) => "taskdeck users list".to_string(),
        Error::LogEntryNotFound(_) => "taskdeck logs list".to_string(),
        Error::InvalidConfig(_) => "fix .taskdeck.toml then retry".to_string(),
        Error::LockFailed(_) => "retry once the other taskdeck process finishes".to_string(),
        _ => return None,
    };
    Some(hint)
}

/// Pad `rows` under `header` into aligned columns, one line per row
pub fn format_table(header: &[&str], rows: &[Vec<String>]) -> Vec<String> {
    let mut widths: Vec<usize> = header.iter().map(|cell| cell.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let render = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut lines = vec![render(header.to_vec())];
    for row in rows {
        lines.push(render(row.iter().map(String::as_str).collect()));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(line: &str) -> Vec<String> {
        line.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn human_output_sections() {
        let mut out = HumanOutput::new("taskdeck task list");
        out.push_summary("showing", "2 of 3");
        out.push_summary("All Tasks (3)", "");
        out.push_detail("Write report");
        out.push_next_step("taskdeck task board");

        let rendered = out.to_string();
        assert!(rendered.starts_with("taskdeck task list\n\nSummary:"));
        assert!(rendered.contains("Summary:\n- showing: 2 of 3\n- All Tasks (3)"));
        assert!(rendered.contains("Details:\n- Write report"));
        assert!(rendered.contains("Next steps:\n- taskdeck task board"));
        assert!(!rendered.contains("Warnings:"));
    }

    #[test]
    fn table_pads_columns() {
        let lines = format_table(
            &["ID", "TITLE"],
            &[vec!["1".to_string(), "Groceries".to_string()]],
        );
        assert_eq!(lines, vec!["ID  TITLE", "1   Groceries"]);
    }

    #[test]
    fn command_name_includes_group_subcommand() {
        assert_eq!(command_name(args("login --email a@x.io")), "login");
        assert_eq!(command_name(args("--json logs list")), "logs list");
        assert_eq!(command_name(args("--root /tmp/deck task board")), "task board");
        assert_eq!(command_name(args("users")), "users");
        assert_eq!(command_name(args("--json")), "taskdeck");
    }

    #[test]
    fn error_kinds_follow_exit_codes() {
        assert_eq!(error_kind(&Error::NotAuthenticated), "user_error");
        assert_eq!(
            error_kind(&Error::Forbidden {
                required: "admin".to_string(),
                actual: "user".to_string(),
            }),
            "policy_blocked"
        );
        assert_eq!(
            error_kind(&Error::Remote("down".to_string())),
            "operation_failed"
        );
        assert_eq!(
            error_hint(&Error::NotInitialized(".".into())).as_deref(),
            Some("taskdeck init")
        );
        assert!(error_hint(&Error::OperationFailed("x".to_string())).is_none());
    }
}
