//! Mocked authentication session.
//!
//! Credentials are never verified. A session is the four keys `token`,
//! `userRole`, `userId` and `email`; login sets them and records a login
//! entry, logout records the logout and removes them.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::session_log::{LogEntry, LogoutActor, LogoutOutcome, SessionLog};
use crate::storage::{keys, KvStore};
use crate::users::{self, UserRecord, ADMIN_ROLE, DEFAULT_ROLE};

const SESSION_KEYS: [&str; 4] = [keys::TOKEN, keys::USER_ROLE, keys::USER_ID, keys::EMAIL];

/// The signed-in user as read back from the session keys
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentUser {
    pub email: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginOutcome {
    pub user: CurrentUser,
    pub token: String,
    /// `true` when signup created a new local account
    pub registered: bool,
    /// Id of the login entry; `None` if recording failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_entry_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogoutReport {
    /// Whether a token was present before logout
    pub was_authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// What happened to the session log; `None` if recording failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log: Option<LogoutOutcome>,
}

pub struct AuthSession<S> {
    store: S,
    config: SessionConfig,
}

impl<S: KvStore> AuthSession<S> {
    pub fn new(store: S, config: SessionConfig) -> Self {
        Self { store, config }
    }

    fn session_log(&self) -> SessionLog<&S> {
        SessionLog::new(&self.store, self.config.clone())
    }

    pub fn login(&self, email: &str, password: &str) -> Result<LoginOutcome> {
        self.login_at(email, password, Utc::now())
    }

    pub fn login_at(
        &self,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<LoginOutcome> {
        let email = validate_credentials(email, password)?;
        let known = users::load_local_or_seed(&self.store, now)?;
        let user = match find_by_email(&known, email) {
            Some(user) => CurrentUser {
                email: user.email.clone(),
                role: user.role.clone(),
                user_id: Some(user.user_id.clone().unwrap_or_else(generate_user_id)),
            },
            None => {
                debug!(email, "unknown email; signing in as a regular user");
                CurrentUser {
                    email: email.to_string(),
                    role: DEFAULT_ROLE.to_string(),
                    user_id: Some(generate_user_id()),
                }
            }
        };
        self.start_session(user, false, now)
    }

    /// Register a local account when `email` is new, then log in.
    pub fn signup(
        &self,
        email: &str,
        password: &str,
        full_name: Option<&str>,
    ) -> Result<LoginOutcome> {
        self.signup_at(email, password, full_name, Utc::now())
    }

    pub fn signup_at(
        &self,
        email: &str,
        password: &str,
        full_name: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<LoginOutcome> {
        let email = validate_credentials(email, password)?;
        let mut known = users::load_local_or_seed(&self.store, now)?;

        let (user, registered) = match find_by_email(&known, email) {
            Some(existing) => {
                debug!(email, "account already exists; logging in");
                (existing.clone(), false)
            }
            None => {
                let created = new_account(email, full_name, now);
                known.push(created.clone());
                users::sort_newest_first(&mut known);
                users::save_local(&self.store, &known)?;
                info!(email, "account registered");
                (created, true)
            }
        };

        let current = CurrentUser {
            email: user.email,
            role: user.role,
            user_id: Some(user.user_id.unwrap_or_else(generate_user_id)),
        };
        self.start_session(current, registered, now)
    }

    fn start_session(
        &self,
        user: CurrentUser,
        registered: bool,
        now: DateTime<Utc>,
    ) -> Result<LoginOutcome> {
        let token = generate_token();
        let user_id = user.user_id.as_deref().unwrap_or_default();

        self.store.set(keys::TOKEN, &token)?;
        self.store.set(keys::USER_ROLE, &user.role)?;
        self.store.set(keys::USER_ID, user_id)?;
        self.store.set(keys::EMAIL, &user.email)?;

        let log_entry_id = match self
            .session_log()
            .record_login_at(user_id, &user.email, &user.role, now)
        {
            Ok(entry) => Some(entry.id),
            Err(err) => {
                warn!(error = %err, "failed to record login");
                None
            }
        };

        info!(email = %user.email, role = %user.role, "logged in");
        Ok(LoginOutcome {
            user,
            token,
            registered,
            log_entry_id,
        })
    }

    /// End the session. Never fails: log and key-removal errors are logged.
    pub fn logout(&self) -> LogoutReport {
        // Identity must be read before the keys are removed
        let token = self.read_key(keys::TOKEN);
        let email = self.read_key(keys::EMAIL);
        let user_id = self.read_key(keys::USER_ID);
        let role = self
            .read_key(keys::USER_ROLE)
            .unwrap_or_else(|| DEFAULT_ROLE.to_string());

        let log = self.session_log().record_logout(&LogoutActor {
            user_id: user_id.as_deref(),
            username: email.as_deref(),
            role: &role,
            token: token.as_deref(),
        });

        self.clear_session();
        info!(email = email.as_deref().unwrap_or("unknown"), "logged out");

        LogoutReport {
            was_authenticated: token.is_some(),
            email,
            log,
        }
    }

    fn clear_session(&self) {
        for key in SESSION_KEYS {
            if let Err(err) = self.store.remove(key) {
                warn!(key, error = %err, "failed to clear session key");
            }
        }
    }

    /// Signed-in user, if any. A token without an email is an inconsistent
    /// session and is logged out.
    pub fn current_user(&self) -> Option<CurrentUser> {
        self.read_key(keys::TOKEN)?;
        let Some(email) = self.read_key(keys::EMAIL) else {
            warn!("session token without email; clearing session");
            self.logout();
            return None;
        };
        Some(CurrentUser {
            email,
            role: self
                .read_key(keys::USER_ROLE)
                .unwrap_or_else(|| DEFAULT_ROLE.to_string()),
            user_id: self.read_key(keys::USER_ID),
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.current_user().is_some()
    }

    /// Exact match against the stored `userRole`
    pub fn has_role(&self, role: &str) -> bool {
        self.read_key(keys::USER_ROLE).as_deref() == Some(role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ADMIN_ROLE)
    }

    /// Signed-in user holding `role`
    pub fn require_role(&self, role: &str) -> Result<CurrentUser> {
        let user = self.current_user().ok_or(Error::NotAuthenticated)?;
        if user.role != role {
            return Err(Error::Forbidden {
                required: role.to_string(),
                actual: user.role,
            });
        }
        Ok(user)
    }

    /// Password reset is mocked: the request is only logged.
    pub fn reset_password(&self, email: &str) -> Result<()> {
        let email = email.trim();
        if email.is_empty() {
            return Err(Error::InvalidArgument("email is required".to_string()));
        }
        info!(email, "password reset requested");
        Ok(())
    }

    /// Session log entries, for callers that hold the session
    pub fn log_entries(&self) -> Vec<LogEntry> {
        self.session_log().entries()
    }

    fn read_key(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value.filter(|value| !value.is_empty()),
            Err(err) => {
                warn!(key, error = %err, "failed to read session key");
                None
            }
        }
    }
}

fn validate_credentials<'a>(email: &'a str, password: &str) -> Result<&'a str> {
    let email = email.trim();
    if email.is_empty() {
        return Err(Error::InvalidArgument("email is required".to_string()));
    }
    if password.trim().is_empty() {
        return Err(Error::InvalidArgument("password is required".to_string()));
    }
    Ok(email)
}

fn find_by_email<'a>(known: &'a [UserRecord], email: &str) -> Option<&'a UserRecord> {
    known
        .iter()
        .find(|user| user.email.eq_ignore_ascii_case(email))
}

fn new_account(email: &str, full_name: Option<&str>, now: DateTime<Utc>) -> UserRecord {
    let full_name = full_name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .or_else(|| email.split('@').next())
        .unwrap_or(email);
    UserRecord {
        full_name: full_name.to_string(),
        email: email.to_string(),
        role: DEFAULT_ROLE.to_string(),
        user_id: Some(generate_user_id()),
        created_at: now.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        extra: Default::default(),
    }
}

fn generate_user_id() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("user-{}", &id[..8])
}

fn generate_token() -> String {
    format!("tdk_{}", Uuid::new_v4().simple())
}
