//! taskdeck users command implementations (admin only)

use std::path::PathBuf;

use crate::error::Result;
use crate::output::{emit_success, format_table, HumanOutput, OutputOptions};
use crate::users::{UserChange, UserEdit, UserSource};

use super::deck::Deck;

/// Options for `taskdeck users list`
pub struct UsersOptions {
    pub root: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

/// Options for `taskdeck users edit`
pub struct EditOptions {
    pub email: String,
    pub name: Option<String>,
    pub new_email: Option<String>,
    pub role: Option<String>,
    pub root: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

/// Options for `taskdeck users delete`
pub struct DeleteOptions {
    pub email: String,
    pub root: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub fn run_list(options: UsersOptions) -> Result<()> {
    let deck = Deck::open(options.root)?;
    deck.require_admin()?;

    let listing = deck.users()?.load()?;

    let mut human = HumanOutput::new(format!("taskdeck users: {} users", listing.users.len()));
    human.push_summary("source", listing.source.as_str());
    if listing.source == UserSource::Local && deck.config.remote.users_url.is_some() {
        human.push_warning("remote user API unavailable; showing local users");
    }
    let rows: Vec<Vec<String>> = listing
        .users
        .iter()
        .enumerate()
        .map(|(index, user)| {
            vec![
                (index + 1).to_string(),
                user.full_name.clone(),
                user.email.clone(),
                capitalize(&user.role),
            ]
        })
        .collect();
    if rows.is_empty() {
        human.push_detail("No users found.");
    } else {
        for line in format_table(&["#", "NAME", "EMAIL", "ROLE"], &rows) {
            human.push_detail(line);
        }
    }

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "users list",
        &listing,
        &human,
    )
}

pub fn run_edit(options: EditOptions) -> Result<()> {
    let deck = Deck::open(options.root)?;
    deck.require_admin()?;

    let edit = UserEdit {
        full_name: options.name,
        email: options.new_email,
        role: options.role,
    };
    let change = deck.users()?.update(&options.email, &edit)?;
    let human = change_human("edit", &options.email, &change);

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "users edit",
        &change,
        &human,
    )
}

pub fn run_delete(options: DeleteOptions) -> Result<()> {
    let deck = Deck::open(options.root)?;
    deck.require_admin()?;

    let change = deck.users()?.delete(&options.email)?;
    let human = change_human("delete", &options.email, &change);

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "users delete",
        &change,
        &human,
    )
}

fn change_human(action: &str, email: &str, change: &UserChange) -> HumanOutput {
    let mut human = HumanOutput::new(format!("taskdeck users {action}: {email}"));
    human.push_summary("source", change.source.as_str());
    human.push_summary("name", change.user.full_name.clone());
    human.push_summary("role", change.user.role.clone());
    if !change.synced {
        human.push_warning("remote update failed; the change was not saved remotely");
    }
    human
}

fn capitalize(role: &str) -> String {
    let mut chars = role.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
