//! Command-line interface for taskdeck
//!
//! This module defines the CLI structure using clap derive macros.
//! Each command group is implemented in its own submodule.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::error::Result;

mod auth;
mod deck;
mod init;
mod logs;
mod notes;
mod task;
mod users;

/// taskdeck - Kanban task dashboard
///
/// Tasks, a filter panel, a login/logout audit log and admin user
/// management over a local key-value store.
#[derive(Parser, Debug)]
#[command(name = "taskdeck")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Deck root directory (defaults to the nearest one above the current directory)
    #[arg(long, global = true, env = "TASKDECK_ROOT")]
    pub root: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable debug logging when RUST_LOG is not set
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a deck (config and store) in the current or --root directory
    Init,

    /// Task management and views
    #[command(subcommand)]
    Task(TaskCommands),

    /// Log in (credentials are not verified)
    Login {
        #[arg(long)]
        email: String,

        #[arg(long, env = "TASKDECK_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Register a local account and log in
    Signup {
        #[arg(long)]
        email: String,

        #[arg(long, env = "TASKDECK_PASSWORD", hide_env_values = true)]
        password: String,

        /// Display name (defaults to the part of the email before '@')
        #[arg(long)]
        name: Option<String>,
    },

    /// Log out and record the logout
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Request a password reset
    ResetPassword {
        #[arg(long)]
        email: String,
    },

    /// Session log management (admin)
    #[command(subcommand)]
    Logs(LogsCommands),

    /// User management (admin)
    #[command(subcommand)]
    Users(UsersCommands),

    /// Dashboard notes
    #[command(subcommand)]
    Notes(NotesCommands),
}

/// Task subcommands
#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Add a task
    Add {
        /// Task title
        title: String,

        #[arg(short, long, default_value = "")]
        description: String,

        /// complete or incomplete (defaults from progress)
        #[arg(long)]
        status: Option<String>,

        /// Free-form priority label (e.g. low, medium, high)
        #[arg(long)]
        priority: Option<String>,

        /// Progress percentage, 0-100
        #[arg(long)]
        progress: Option<f64>,

        /// Deadline as YYYY-MM-DD
        #[arg(long)]
        deadline: Option<String>,
    },

    /// List tasks through the filter panel
    List {
        /// all, complete or incomplete
        #[arg(short, long, default_value = "all")]
        status: String,

        /// Case-insensitive text matched against title and description
        #[arg(long, default_value = "")]
        search: String,
    },

    /// Task counts per status
    Counts,

    /// Kanban board grouped by progress
    Board,

    /// Tasks due today or tomorrow
    Due {
        /// Reference date (defaults to today)
        #[arg(long)]
        today: Option<NaiveDate>,
    },

    /// Show stored tasks in canonical form
    Normalize {
        /// Write the canonical form back to the store
        #[arg(long)]
        write: bool,
    },
}

/// Session log subcommands
#[derive(Subcommand, Debug)]
pub enum LogsCommands {
    /// List login/logout entries
    List,

    /// Delete one entry
    Delete {
        /// Entry id
        id: String,
    },

    /// Delete every entry
    Clear,
}

/// User management subcommands
#[derive(Subcommand, Debug)]
pub enum UsersCommands {
    /// List users, newest first
    List,

    /// Edit a user
    Edit {
        /// Email of the user to edit
        email: String,

        #[arg(long)]
        name: Option<String>,

        /// New email address
        #[arg(long = "new-email")]
        new_email: Option<String>,

        #[arg(long)]
        role: Option<String>,
    },

    /// Delete a user
    Delete {
        /// Email of the user to delete
        email: String,
    },
}

/// Notes subcommands
#[derive(Subcommand, Debug)]
pub enum NotesCommands {
    /// Print the notes
    Show,

    /// Replace the notes (an empty string clears them)
    Set {
        text: String,
    },
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Init => init::run(init::InitOptions {
                root: self.root,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Task(cmd) => match cmd {
                TaskCommands::Add {
                    title,
                    description,
                    status,
                    priority,
                    progress,
                    deadline,
                } => task::run_add(task::AddOptions {
                    title,
                    description,
                    status,
                    priority,
                    progress,
                    deadline,
                    root: self.root,
                    json: self.json,
                    quiet: self.quiet,
                }),
                TaskCommands::List { status, search } => task::run_list(task::ListOptions {
                    status,
                    search,
                    root: self.root,
                    json: self.json,
                    quiet: self.quiet,
                }),
                TaskCommands::Counts => task::run_counts(task::ViewOptions {
                    root: self.root,
                    json: self.json,
                    quiet: self.quiet,
                }),
                TaskCommands::Board => task::run_board(task::ViewOptions {
                    root: self.root,
                    json: self.json,
                    quiet: self.quiet,
                }),
                TaskCommands::Due { today } => task::run_due(task::DueOptions {
                    today,
                    root: self.root,
                    json: self.json,
                    quiet: self.quiet,
                }),
                TaskCommands::Normalize { write } => {
                    task::run_normalize(task::NormalizeOptions {
                        write,
                        root: self.root,
                        json: self.json,
                        quiet: self.quiet,
                    })
                }
            },
            Commands::Login { email, password } => auth::run_login(auth::LoginOptions {
                email,
                password,
                root: self.root,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Signup {
                email,
                password,
                name,
            } => auth::run_signup(auth::SignupOptions {
                email,
                password,
                name,
                root: self.root,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Logout => auth::run_logout(auth::SessionOptions {
                root: self.root,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Whoami => auth::run_whoami(auth::SessionOptions {
                root: self.root,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::ResetPassword { email } => {
                auth::run_reset_password(auth::ResetPasswordOptions {
                    email,
                    root: self.root,
                    json: self.json,
                    quiet: self.quiet,
                })
            }
            Commands::Logs(cmd) => {
                let options = logs::LogsOptions {
                    root: self.root,
                    json: self.json,
                    quiet: self.quiet,
                };
                match cmd {
                    LogsCommands::List => logs::run_list(options),
                    LogsCommands::Delete { id } => logs::run_delete(options, &id),
                    LogsCommands::Clear => logs::run_clear(options),
                }
            }
            Commands::Users(cmd) => match cmd {
                UsersCommands::List => users::run_list(users::UsersOptions {
                    root: self.root,
                    json: self.json,
                    quiet: self.quiet,
                }),
                UsersCommands::Edit {
                    email,
                    name,
                    new_email,
                    role,
                } => users::run_edit(users::EditOptions {
                    email,
                    name,
                    new_email,
                    role,
                    root: self.root,
                    json: self.json,
                    quiet: self.quiet,
                }),
                UsersCommands::Delete { email } => users::run_delete(users::DeleteOptions {
                    email,
                    root: self.root,
                    json: self.json,
                    quiet: self.quiet,
                }),
            },
            Commands::Notes(cmd) => {
                let options = notes::NotesOptions {
                    root: self.root,
                    json: self.json,
                    quiet: self.quiet,
                };
                match cmd {
                    NotesCommands::Show => notes::run_show(options),
                    NotesCommands::Set { text } => notes::run_set(options, &text),
                }
            }
        }
    }
}
