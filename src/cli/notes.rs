//! taskdeck notes command implementations

use std::path::PathBuf;

use serde::Serialize;

use crate::error::Result;
use crate::notes;
use crate::output::{emit_success, HumanOutput, OutputOptions};

use super::deck::Deck;

/// Options shared by the `taskdeck notes` subcommands
pub struct NotesOptions {
    pub root: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

#[derive(Serialize)]
struct NotesOutput {
    notes: String,
}

pub fn run_show(options: NotesOptions) -> Result<()> {
    let deck = Deck::open(options.root)?;
    let text = notes::read_notes(&deck.store);

    let mut human = HumanOutput::new("taskdeck notes");
    if text.is_empty() {
        human.push_next_step("taskdeck notes set \"<text>\"");
    } else {
        for line in text.lines() {
            human.push_detail(line);
        }
    }

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "notes show",
        &NotesOutput { notes: text },
        &human,
    )
}

pub fn run_set(options: NotesOptions, text: &str) -> Result<()> {
    let deck = Deck::open(options.root)?;
    notes::write_notes(&deck.store, text)?;

    let header = if text.is_empty() {
        "taskdeck notes set: cleared".to_string()
    } else {
        format!("taskdeck notes set: saved {} characters", text.chars().count())
    };
    let human = HumanOutput::new(header);

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "notes set",
        &NotesOutput {
            notes: text.to_string(),
        },
        &human,
    )
}
