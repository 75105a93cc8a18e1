//! Session audit log.
//!
//! Every login appends an entry with an open `logoutTime`. A logout closes
//! the newest open login entry of the same user; if there is none, a
//! standalone logout entry is appended instead. The whole list is written
//! back with one storage write per call.
//!
//! The stored list is edited as raw JSON, so entries written by other
//! clients keep their exact shape. `LogEntry` is a lenient read view.
//!
//! Recording is best-effort: a stored value that is not a JSON array is
//! treated as empty and logout failures are logged rather than returned
//! (`record_logout`). Use `try_record_logout` when the caller wants the error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, error, warn};
use ulid::Ulid;

use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::storage::{self, keys, KvStore};
use crate::task::is_truthy;

/// `userId`/`username` recorded when the actor is not known
pub const UNKNOWN_ACTOR: &str = "unknown";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogAction {
    Login,
    Logout,
    /// Any other stored action
    #[default]
    #[serde(other)]
    Unknown,
}

impl LogAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogAction::Login => "login",
            LogAction::Logout => "logout",
            LogAction::Unknown => "unknown",
        }
    }
}

/// One log entry. Deserialization never rejects an object: mistyped fields
/// read as empty and unknown fields land in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    #[serde(default, deserialize_with = "lenient_text")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub user_id: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub username: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub role: String,
    #[serde(default, deserialize_with = "lenient_action")]
    pub action: LogAction,
    #[serde(default, deserialize_with = "lenient_time")]
    pub login_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_time")]
    pub logout_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub ip_address: String,
    #[serde(
        default,
        deserialize_with = "lenient_opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub token_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LogEntry {
    /// Login entry still waiting for its logout
    pub fn is_open_login(&self) -> bool {
        self.action == LogAction::Login && self.logout_time.is_none()
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn lenient_text<'de, D: Deserializer<'de>>(de: D) -> std::result::Result<String, D::Error> {
    Ok(value_text(&Value::deserialize(de)?))
}

fn lenient_opt_text<'de, D: Deserializer<'de>>(
    de: D,
) -> std::result::Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(de)? {
        Value::Null => None,
        other => Some(value_text(&other)),
    })
}

fn lenient_action<'de, D: Deserializer<'de>>(de: D) -> std::result::Result<LogAction, D::Error> {
    Ok(match Value::deserialize(de)?.as_str() {
        Some("login") => LogAction::Login,
        Some("logout") => LogAction::Logout,
        _ => LogAction::Unknown,
    })
}

fn lenient_time<'de, D: Deserializer<'de>>(
    de: D,
) -> std::result::Result<Option<DateTime<Utc>>, D::Error> {
    Ok(Value::deserialize(de)?
        .as_str()
        .and_then(|text| DateTime::parse_from_rfc3339(text).ok())
        .map(|ts| ts.with_timezone(&Utc)))
}

/// What a logout did to the log
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LogoutOutcome {
    /// An open login entry was closed
    Closed { entry_id: String },
    /// No open login entry existed; a logout-only entry was appended
    Appended { entry_id: String },
}

impl LogoutOutcome {
    pub fn entry_id(&self) -> &str {
        match self {
            LogoutOutcome::Closed { entry_id } | LogoutOutcome::Appended { entry_id } => entry_id,
        }
    }
}

/// Identity captured at logout time; any part may be missing.
#[derive(Debug, Clone, Default)]
pub struct LogoutActor<'a> {
    pub user_id: Option<&'a str>,
    pub username: Option<&'a str>,
    pub role: &'a str,
    pub token: Option<&'a str>,
}

pub struct SessionLog<S> {
    store: S,
    config: SessionConfig,
}

impl<S: KvStore> SessionLog<S> {
    pub fn new(store: S, config: SessionConfig) -> Self {
        Self { store, config }
    }

    /// Stored entries in insertion order. Elements that are not objects are
    /// left out of the view but stay in storage.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.stored()
            .into_iter()
            .filter_map(|raw| match serde_json::from_value(raw) {
                Ok(entry) => Some(entry),
                Err(err) => {
                    debug!(error = %err, "log element is not an object; not listed");
                    None
                }
            })
            .collect()
    }

    pub fn record_login(&self, user_id: &str, username: &str, role: &str) -> Result<LogEntry> {
        self.record_login_at(user_id, username, role, Utc::now())
    }

    pub fn record_login_at(
        &self,
        user_id: &str,
        username: &str,
        role: &str,
        now: DateTime<Utc>,
    ) -> Result<LogEntry> {
        let entry = LogEntry {
            id: format!("login-{}", Ulid::new()),
            user_id: user_id.to_string(),
            username: username.to_string(),
            role: role.to_string(),
            action: LogAction::Login,
            login_time: Some(now),
            logout_time: None,
            ip_address: self.config.ip_address.clone(),
            token_name: None,
            extra: Map::new(),
        };

        let mut stored = self.stored();
        stored.push(serde_json::to_value(&entry)?);
        self.write(&stored)?;
        debug!(entry_id = %entry.id, user_id, "login recorded");
        Ok(entry)
    }

    /// Best-effort logout recording. Errors are logged and swallowed.
    pub fn record_logout(&self, actor: &LogoutActor<'_>) -> Option<LogoutOutcome> {
        match self.try_record_logout_at(actor, Utc::now()) {
            Ok(outcome) => Some(outcome),
            Err(err) => {
                error!(error = %err, "failed to record logout");
                None
            }
        }
    }

    pub fn try_record_logout(&self, actor: &LogoutActor<'_>) -> Result<LogoutOutcome> {
        self.try_record_logout_at(actor, Utc::now())
    }

    pub fn try_record_logout_at(
        &self,
        actor: &LogoutActor<'_>,
        now: DateTime<Utc>,
    ) -> Result<LogoutOutcome> {
        let mut stored = self.stored();
        let outcome = close_or_append(&mut stored, actor, now, &self.config)?;
        self.write(&stored)?;
        debug!(?outcome, "logout recorded");
        Ok(outcome)
    }

    /// Remove one entry by id (admin log management)
    pub fn delete(&self, id: &str) -> Result<LogEntry> {
        let mut stored = self.stored();
        let index = stored
            .iter()
            .position(|raw| raw.get("id").map(value_text).as_deref() == Some(id))
            .ok_or_else(|| Error::LogEntryNotFound(id.to_string()))?;
        let removed = stored.remove(index);
        self.write(&stored)?;
        Ok(serde_json::from_value(removed)?)
    }

    /// Remove all entries, returning how many there were
    pub fn clear(&self) -> Result<usize> {
        let count = self.stored().len();
        self.write(&[])?;
        if count > 0 {
            warn!(count, "session log cleared");
        }
        Ok(count)
    }

    fn stored(&self) -> Vec<Value> {
        storage::read_json_or_default(&self.store, keys::USER_LOGS)
    }

    fn write(&self, stored: &[Value]) -> Result<()> {
        storage::write_json(&self.store, keys::USER_LOGS, stored)
    }
}

/// Open login of `user_id`: same `userId` string, `action` "login" and a
/// missing or empty `logoutTime`.
fn is_open_login_of(entry: &Map<String, Value>, user_id: &str) -> bool {
    entry.get("userId").and_then(Value::as_str) == Some(user_id)
        && entry.get("action").and_then(Value::as_str) == Some("login")
        && !entry.get("logoutTime").is_some_and(is_truthy)
}

/// Close the newest open login of the actor, or append a logout entry.
fn close_or_append(
    stored: &mut Vec<Value>,
    actor: &LogoutActor<'_>,
    now: DateTime<Utc>,
    config: &SessionConfig,
) -> Result<LogoutOutcome> {
    // An absent user id never matches, not even entries recorded as "unknown"
    let open = actor.user_id.and_then(|wanted| {
        stored
            .iter_mut()
            .rev()
            .filter_map(Value::as_object_mut)
            .find(|entry| is_open_login_of(entry, wanted))
    });

    if let Some(entry) = open {
        entry.insert("logoutTime".to_string(), serde_json::to_value(now)?);
        return Ok(LogoutOutcome::Closed {
            entry_id: entry.get("id").map(value_text).unwrap_or_default(),
        });
    }

    let entry = LogEntry {
        id: format!("logout-{}", Ulid::new()),
        user_id: actor.user_id.unwrap_or(UNKNOWN_ACTOR).to_string(),
        username: actor.username.unwrap_or(UNKNOWN_ACTOR).to_string(),
        role: actor.role.to_string(),
        action: LogAction::Logout,
        login_time: None,
        logout_time: Some(now),
        ip_address: config.ip_address.clone(),
        token_name: actor
            .token
            .map(|token| token_preview(token, config.token_preview_len)),
        extra: Map::new(),
    };
    let entry_id = entry.id.clone();
    stored.push(serde_json::to_value(&entry)?);
    Ok(LogoutOutcome::Appended { entry_id })
}

/// First `len` characters of the token followed by "..."
pub fn token_preview(token: &str, len: usize) -> String {
    let head: String = token.chars().take(len).collect();
    format!("{head}...")
}
