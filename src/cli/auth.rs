//! taskdeck login/signup/logout/whoami/reset-password implementations

use std::path::PathBuf;

use serde::Serialize;

use crate::auth::{CurrentUser, LoginOutcome};
use crate::error::Result;
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::session_log::{token_preview, LogoutOutcome};

use super::deck::Deck;

/// Options for `taskdeck login`
pub struct LoginOptions {
    pub email: String,
    pub password: String,
    pub root: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

/// Options for `taskdeck signup`
pub struct SignupOptions {
    pub email: String,
    pub password: String,
    pub name: Option<String>,
    pub root: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

/// Options for `taskdeck logout` and `taskdeck whoami`
pub struct SessionOptions {
    pub root: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

/// Options for `taskdeck reset-password`
pub struct ResetPasswordOptions {
    pub email: String,
    pub root: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

#[derive(Serialize)]
struct WhoamiReport {
    root: PathBuf,
    authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<CurrentUser>,
}

#[derive(Serialize)]
struct ResetPasswordReport {
    email: String,
    requested: bool,
}

pub fn run_login(options: LoginOptions) -> Result<()> {
    let deck = Deck::open(options.root)?;
    let outcome = deck.auth().login(&options.email, &options.password)?;
    let human = login_human("login", &outcome, deck.config.session.token_preview_len);

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "login",
        &outcome,
        &human,
    )
}

pub fn run_signup(options: SignupOptions) -> Result<()> {
    let deck = Deck::open(options.root)?;
    let outcome = deck
        .auth()
        .signup(&options.email, &options.password, options.name.as_deref())?;
    let human = login_human("signup", &outcome, deck.config.session.token_preview_len);

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "signup",
        &outcome,
        &human,
    )
}

fn login_human(command: &str, outcome: &LoginOutcome, preview_len: usize) -> HumanOutput {
    let mut human = HumanOutput::new(format!(
        "taskdeck {command}: logged in as {}",
        outcome.user.email
    ));
    human.push_summary("role", outcome.user.role.clone());
    if let Some(user_id) = outcome.user.user_id.as_deref() {
        human.push_summary("user id", user_id);
    }
    human.push_summary("token", token_preview(&outcome.token, preview_len));
    if outcome.registered {
        human.push_summary("account", "created");
    }
    if outcome.log_entry_id.is_none() {
        human.push_warning("login was not recorded in the session log");
    }
    if outcome.user.is_admin() {
        human.push_next_step("taskdeck users list");
        human.push_next_step("taskdeck logs list");
    } else {
        human.push_next_step("taskdeck task list");
    }
    human
}

pub fn run_logout(options: SessionOptions) -> Result<()> {
    let deck = Deck::open(options.root)?;
    let report = deck.auth().logout();

    let header = match report.email.as_deref() {
        Some(email) => format!("taskdeck logout: {email} logged out"),
        None => "taskdeck logout: no active session".to_string(),
    };
    let mut human = HumanOutput::new(header);
    match &report.log {
        Some(LogoutOutcome::Closed { entry_id }) => {
            human.push_summary("closed login entry", entry_id.clone());
        }
        Some(LogoutOutcome::Appended { entry_id }) => {
            human.push_summary("appended logout entry", entry_id.clone());
        }
        None => human.push_warning("logout was not recorded in the session log"),
    }

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "logout",
        &report,
        &human,
    )
}

pub fn run_whoami(options: SessionOptions) -> Result<()> {
    let deck = Deck::open(options.root)?;
    let user = deck.auth().current_user();

    let mut human = match &user {
        Some(user) => {
            let mut human = HumanOutput::new(format!("taskdeck whoami: {}", user.email));
            human.push_summary("role", user.role.clone());
            if let Some(user_id) = user.user_id.as_deref() {
                human.push_summary("user id", user_id);
            }
            human
        }
        None => {
            let mut human = HumanOutput::new("taskdeck whoami: not logged in");
            human.push_next_step("taskdeck login --email <email> --password <password>");
            human
        }
    };
    human.push_summary("root", deck.root.display().to_string());

    let report = WhoamiReport {
        root: deck.root.clone(),
        authenticated: user.is_some(),
        user,
    };

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "whoami",
        &report,
        &human,
    )
}

pub fn run_reset_password(options: ResetPasswordOptions) -> Result<()> {
    let deck = Deck::open(options.root)?;
    deck.auth().reset_password(&options.email)?;

    let email = options.email.trim().to_string();
    let mut human = HumanOutput::new(format!("taskdeck reset-password: request sent for {email}"));
    human.push_warning("password reset is simulated; no email is sent");

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "reset-password",
        &ResetPasswordReport {
            email,
            requested: true,
        },
        &human,
    )
}
