//! taskdeck - Kanban Task Dashboard Library
//!
//! This library provides the core functionality for the taskdeck CLI:
//! task normalization and filtering, a Kanban board view, mocked
//! authentication with a session audit log, and admin user management.
//!
//! # Core Concepts
//!
//! - **Storage port**: a string key-value store (`KvStore`) holding JSON values
//! - **Normalizer**: heterogeneous stored task records to one canonical shape
//! - **Filter engine**: status and free-text filtering with per-status counts
//! - **Session log**: login entries closed by the matching logout
//! - **User directory**: remote-then-local user listing with demo seeding
//!
//! # Module Organization
//!
//! - `cli`: Command-line interface using clap
//! - `config`: Configuration loading from `.taskdeck.toml`
//! - `error`: Error types and result aliases
//! - `storage`: Key-value store port, in-memory and file-backed stores
//! - `lock`: File locking and atomic writes for the file store
//! - `task`: Task record normalization and creation
//! - `filter`: Status/search filtering and counts
//! - `board`: Kanban columns and deadline alerts
//! - `session_log`: Login/logout audit log
//! - `auth`: Mocked login, signup, logout and role checks
//! - `users`: User directory and remote user API client
//! - `notes`: Dashboard notes
//! - `output`: Human and JSON output for CLI commands

pub mod auth;
pub mod board;
pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod lock;
pub mod notes;
pub mod output;
pub mod session_log;
pub mod storage;
pub mod task;
pub mod users;

pub use error::{Error, Result};
