//! User directory for the admin surface.
//!
//! Users come from the remote API when it answers with a non-empty list and
//! from the `users` key otherwise. An empty or malformed local list is
//! replaced by the two demo accounts, which are persisted so later edits
//! have something to act on. The tier that served a listing decides where
//! edits and deletions go.

use std::cell::RefCell;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::config::RemoteConfig;
use crate::error::{Error, Result};
use crate::storage::{self, keys, KvStore};

pub const DEFAULT_ROLE: &str = "user";
pub const ADMIN_ROLE: &str = "admin";

const USER_FIELDS: [&str; 5] = ["fullName", "email", "role", "userId", "createdAt"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_role() -> String {
    DEFAULT_ROLE.to_string()
}

impl UserRecord {
    fn created_at_time(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.created_at)
            .ok()
            .map(|ts| ts.with_timezone(&Utc))
    }
}

/// Where a listing came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UserSource {
    Remote,
    Local,
}

impl UserSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserSource::Remote => "remote",
            UserSource::Local => "local",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserListing {
    pub source: UserSource,
    pub users: Vec<UserRecord>,
}

/// Fields an admin may change; `None` leaves the field as is.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEdit {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl UserEdit {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none() && self.email.is_none() && self.role.is_none()
    }

    fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(Error::InvalidArgument(
                "nothing to change: pass --name, --new-email or --role".to_string(),
            ));
        }
        if matches!(self.email.as_deref(), Some(email) if email.trim().is_empty()) {
            return Err(Error::InvalidArgument("email cannot be empty".to_string()));
        }
        if matches!(self.role.as_deref(), Some(role) if role.trim().is_empty()) {
            return Err(Error::InvalidArgument("role cannot be empty".to_string()));
        }
        Ok(())
    }

    fn apply(&self, user: &UserRecord) -> UserRecord {
        let mut updated = user.clone();
        if let Some(name) = &self.full_name {
            updated.full_name = name.clone();
        }
        if let Some(email) = &self.email {
            updated.email = email.trim().to_string();
        }
        if let Some(role) = &self.role {
            updated.role = role.trim().to_lowercase();
        }
        updated
    }
}

/// Result of an edit or deletion, with the record as it now stands
#[derive(Debug, Clone, Serialize)]
pub struct UserChange {
    pub source: UserSource,
    pub user: UserRecord,
    /// `false` when the remote call failed and only the listing changed
    pub synced: bool,
}

/// Canonical user record from an arbitrary JSON value.
///
/// Non-objects yield `None`. `role` is lowercased and defaults to `user`;
/// a missing or empty `createdAt` becomes `now`.
pub fn normalize_user(raw: &Value, now: DateTime<Utc>) -> Option<UserRecord> {
    let map = raw.as_object()?;

    let text = |field: &str| -> Option<String> {
        match map.get(field) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        }
    };
    let non_empty = |field: &str| text(field).filter(|s| !s.is_empty());

    let extra = map
        .iter()
        .filter(|(key, _)| !USER_FIELDS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    Some(UserRecord {
        full_name: text("fullName").unwrap_or_default(),
        email: text("email").unwrap_or_default(),
        role: non_empty("role")
            .map(|role| role.to_lowercase())
            .unwrap_or_else(default_role),
        user_id: text("userId"),
        created_at: non_empty("createdAt").unwrap_or_else(|| iso_timestamp(now)),
        extra,
    })
}

fn normalize_users(raw: &[Value], now: DateTime<Utc>) -> Vec<UserRecord> {
    let mut users: Vec<UserRecord> = raw
        .iter()
        .filter_map(|value| {
            let user = normalize_user(value, now);
            if user.is_none() {
                warn!("skipping user record that is not an object");
            }
            user
        })
        .collect();
    sort_newest_first(&mut users);
    users
}

/// Newest `createdAt` first; unparseable timestamps go last
pub fn sort_newest_first(users: &mut [UserRecord]) {
    users.sort_by(|a, b| b.created_at_time().cmp(&a.created_at_time()));
}

fn iso_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// The two accounts the login screen advertises
pub fn demo_users(now: DateTime<Utc>) -> Vec<UserRecord> {
    let demo = |name: &str, email: &str, role: &str, user_id: &str, age: chrono::Duration| {
        UserRecord {
            full_name: name.to_string(),
            email: email.to_string(),
            role: role.to_string(),
            user_id: Some(user_id.to_string()),
            created_at: iso_timestamp(now - age),
            extra: Map::new(),
        }
    };
    vec![
        demo(
            "Admin User",
            "admin@example.com",
            ADMIN_ROLE,
            "admin-123",
            chrono::Duration::hours(24),
        ),
        demo(
            "Regular User",
            "user@example.com",
            DEFAULT_ROLE,
            "user-456",
            chrono::Duration::hours(12),
        ),
    ]
}

/// Users stored under the `users` key, seeding the demo accounts when the
/// list is missing, empty or malformed.
pub fn load_local_or_seed<S: KvStore + ?Sized>(
    store: &S,
    now: DateTime<Utc>,
) -> Result<Vec<UserRecord>> {
    let stored: Value = storage::read_json_or(store, keys::USERS, || Value::Null);
    if let Value::Array(items) = &stored {
        let users = normalize_users(items, now);
        if !users.is_empty() {
            return Ok(users);
        }
    }

    debug!("no local users; seeding demo accounts");
    let mut demo = demo_users(now);
    sort_newest_first(&mut demo);
    save_local(store, &demo)?;
    Ok(demo)
}

pub fn save_local<S: KvStore + ?Sized>(store: &S, users: &[UserRecord]) -> Result<()> {
    storage::write_json(store, keys::USERS, users)
}

/// Remote user API
pub trait UserApi {
    /// Raw user records; an error or non-array body means the remote is unusable
    fn list_users(&self) -> Result<Vec<Value>>;
    fn update_user(&self, email: &str, edit: &UserEdit) -> Result<()>;
    fn delete_user(&self, email: &str) -> Result<()>;
}

impl<T: UserApi + ?Sized> UserApi for &T {
    fn list_users(&self) -> Result<Vec<Value>> {
        (**self).list_users()
    }

    fn update_user(&self, email: &str, edit: &UserEdit) -> Result<()> {
        (**self).update_user(email, edit)
    }

    fn delete_user(&self, email: &str) -> Result<()> {
        (**self).delete_user(email)
    }
}

/// `UserApi` over HTTP: `GET {base}/admin/users`,
/// `PUT|DELETE {base}/admin/users/{email}`.
pub struct HttpUserApi {
    base_url: String,
    client: Client,
}

impl HttpUserApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("taskdeck/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Client for the configured API, or `None` when no URL is set
    pub fn from_config(config: &RemoteConfig) -> Result<Option<Self>> {
        config
            .users_url
            .as_deref()
            .map(|url| Self::new(url, Duration::from_secs(config.timeout_secs)))
            .transpose()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn users_url(&self) -> String {
        format!("{}/admin/users", self.base_url)
    }

    fn user_url(&self, email: &str) -> String {
        format!("{}/admin/users/{}", self.base_url, email)
    }
}

impl UserApi for HttpUserApi {
    fn list_users(&self) -> Result<Vec<Value>> {
        let url = self.users_url();
        debug!(url = %url, "fetching users");
        let response = self.client.get(&url).send()?.error_for_status()?;
        match response.json::<Value>()? {
            Value::Array(items) => Ok(items),
            _ => Err(Error::Remote(format!("{url} did not return a JSON array"))),
        }
    }

    fn update_user(&self, email: &str, edit: &UserEdit) -> Result<()> {
        self.client
            .put(self.user_url(email))
            .json(edit)
            .send()?
            .error_for_status()?;
        Ok(())
    }

    fn delete_user(&self, email: &str) -> Result<()> {
        self.client
            .delete(self.user_url(email))
            .send()?
            .error_for_status()?;
        Ok(())
    }
}

/// Two-tier user listing with source-dependent edits
pub struct UserDirectory<S, A> {
    store: S,
    api: Option<A>,
    // Tier that served the last listing in this process
    last_source: RefCell<Option<UserSource>>,
}

impl<S: KvStore, A: UserApi> UserDirectory<S, A> {
    pub fn new(store: S, api: Option<A>) -> Self {
        Self {
            store,
            api,
            last_source: RefCell::new(None),
        }
    }

    pub fn last_source(&self) -> Option<UserSource> {
        *self.last_source.borrow()
    }

    pub fn load(&self) -> Result<UserListing> {
        self.load_at(Utc::now())
    }

    pub fn load_at(&self, now: DateTime<Utc>) -> Result<UserListing> {
        let listing = match self.fetch_remote(now) {
            Some(users) => UserListing {
                source: UserSource::Remote,
                users,
            },
            None => UserListing {
                source: UserSource::Local,
                users: load_local_or_seed(&self.store, now)?,
            },
        };
        debug!(source = listing.source.as_str(), count = listing.users.len(), "loaded users");
        *self.last_source.borrow_mut() = Some(listing.source);
        Ok(listing)
    }

    fn fetch_remote(&self, now: DateTime<Utc>) -> Option<Vec<UserRecord>> {
        let api = match &self.api {
            Some(api) => api,
            None => {
                debug!("no remote user API configured");
                return None;
            }
        };
        match api.list_users() {
            Ok(items) => {
                let users = normalize_users(&items, now);
                if users.is_empty() {
                    warn!("remote returned no users; using local users");
                    None
                } else {
                    Some(users)
                }
            }
            Err(err) => {
                warn!(error = %err, "remote user fetch failed; using local users");
                None
            }
        }
    }

    /// Apply `edit` to the user with `email`.
    ///
    /// Remote listings send a PUT and a failure only clears `synced`; local
    /// listings merge the edit into the `users` key.
    pub fn update(&self, email: &str, edit: &UserEdit) -> Result<UserChange> {
        edit.validate()?;
        let listing = self.load()?;
        let position = find_user(&listing.users, email)?;
        let updated = edit.apply(&listing.users[position]);

        let synced = match listing.source {
            UserSource::Remote => self.remote_call(|api| api.update_user(email, edit), "update"),
            UserSource::Local => {
                let mut users = listing.users;
                users[position] = updated.clone();
                save_local(&self.store, &users)?;
                true
            }
        };

        Ok(UserChange {
            source: listing.source,
            user: updated,
            synced,
        })
    }

    /// Remove the user with `email`, following the same tier rules as `update`
    pub fn delete(&self, email: &str) -> Result<UserChange> {
        let listing = self.load()?;
        let position = find_user(&listing.users, email)?;

        let (user, synced) = match listing.source {
            UserSource::Remote => {
                let synced = self.remote_call(|api| api.delete_user(email), "delete");
                (listing.users[position].clone(), synced)
            }
            UserSource::Local => {
                let mut users = listing.users;
                let removed = users.remove(position);
                save_local(&self.store, &users)?;
                (removed, true)
            }
        };

        Ok(UserChange {
            source: listing.source,
            user,
            synced,
        })
    }

    fn remote_call<F>(&self, call: F, what: &str) -> bool
    where
        F: FnOnce(&A) -> Result<()>,
    {
        let Some(api) = &self.api else {
            return false;
        };
        match call(api) {
            Ok(()) => true,
            Err(err) => {
                warn!(action = what, error = %err, "remote user call failed; continuing");
                false
            }
        }
    }
}

fn find_user(users: &[UserRecord], email: &str) -> Result<usize> {
    users
        .iter()
        .position(|user| user.email == email)
        .ok_or_else(|| Error::UserNotFound(email.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use chrono::TimeZone;
    use serde_json::json;

    #[derive(Default)]
    struct FakeApi {
        users: Option<Vec<Value>>,
        fail_writes: bool,
        calls: RefCell<Vec<String>>,
    }

    impl UserApi for FakeApi {
        fn list_users(&self) -> Result<Vec<Value>> {
            self.calls.borrow_mut().push("list".to_string());
            self.users
                .clone()
                .ok_or_else(|| Error::Remote("unreachable".to_string()))
        }

        fn update_user(&self, email: &str, _edit: &UserEdit) -> Result<()> {
            self.calls.borrow_mut().push(format!("put {email}"));
            if self.fail_writes {
                return Err(Error::Remote("500".to_string()));
            }
            Ok(())
        }

        fn delete_user(&self, email: &str) -> Result<()> {
            self.calls.borrow_mut().push(format!("delete {email}"));
            if self.fail_writes {
                return Err(Error::Remote("500".to_string()));
            }
            Ok(())
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn local_only(store: &MemoryStore) -> UserDirectory<&MemoryStore, FakeApi> {
        UserDirectory::new(store, None)
    }

    #[test]
    fn normalize_lowercases_role_and_defaults_created_at() {
        let user = normalize_user(&json!({ "email": "a@x.io", "role": "Admin", "team": 7 }), now())
            .expect("object");
        assert_eq!(user.role, "admin");
        assert_eq!(user.created_at, "2026-03-01T12:00:00.000Z");
        assert_eq!(user.extra.get("team"), Some(&json!(7)));

        let user = normalize_user(&json!({ "email": "b@x.io", "role": "" }), now()).expect("object");
        assert_eq!(user.role, "user");
        assert!(normalize_user(&json!("nope"), now()).is_none());
    }

    #[test]
    fn empty_store_seeds_demo_accounts() {
        let store = MemoryStore::new();
        let listing = local_only(&store).load_at(now()).expect("load");

        assert_eq!(listing.source, UserSource::Local);
        let emails: Vec<_> = listing.users.iter().map(|u| u.email.as_str()).collect();
        assert_eq!(emails, vec!["user@example.com", "admin@example.com"]);
        assert_eq!(listing.users[1].user_id.as_deref(), Some("admin-123"));
        assert_eq!(listing.users[1].role, "admin");
        assert_eq!(listing.users[1].created_at, "2026-02-28T12:00:00.000Z");
        assert!(store.get(keys::USERS).expect("get").is_some());
    }

    #[test]
    fn local_users_sorted_newest_first() {
        let store = MemoryStore::new();
        store
            .set(
                keys::USERS,
                r#"[{"email":"old@x.io","createdAt":"2025-01-01T00:00:00Z"},
                    {"email":"new@x.io","createdAt":"2026-01-01T00:00:00Z"},
                    {"email":"bad@x.io","createdAt":"yesterday"}]"#,
            )
            .expect("set");

        let listing = local_only(&store).load_at(now()).expect("load");
        let emails: Vec<_> = listing.users.iter().map(|u| u.email.as_str()).collect();
        assert_eq!(emails, vec!["new@x.io", "old@x.io", "bad@x.io"]);
    }

    #[test]
    fn remote_listing_wins_when_non_empty() {
        let store = MemoryStore::new();
        let api = FakeApi {
            users: Some(vec![json!({ "email": "r@x.io", "role": "USER" })]),
            ..FakeApi::default()
        };
        let directory = UserDirectory::new(&store, Some(&api));
        let listing = directory.load_at(now()).expect("load");

        assert_eq!(listing.source, UserSource::Remote);
        assert_eq!(listing.users[0].role, "user");
        assert_eq!(directory.last_source(), Some(UserSource::Remote));
        assert!(store.get(keys::USERS).expect("get").is_none());
    }

    #[test]
    fn remote_failure_or_empty_falls_back() {
        let store = MemoryStore::new();
        let down = FakeApi::default();
        let listing = UserDirectory::new(&store, Some(&down))
            .load_at(now())
            .expect("load");
        assert_eq!(listing.source, UserSource::Local);

        let empty = FakeApi {
            users: Some(Vec::new()),
            ..FakeApi::default()
        };
        let listing = UserDirectory::new(&store, Some(&empty))
            .load_at(now())
            .expect("load");
        assert_eq!(listing.source, UserSource::Local);
        assert_eq!(listing.users.len(), 2);
    }

    #[test]
    fn local_update_persists_merge() {
        let store = MemoryStore::new();
        let directory = local_only(&store);
        let edit = UserEdit {
            full_name: Some("Boss".to_string()),
            role: Some("ADMIN".to_string()),
            ..UserEdit::default()
        };
        let change = directory.update("user@example.com", &edit).expect("update");
        assert_eq!(change.source, UserSource::Local);
        assert_eq!(change.user.role, "admin");
        assert!(change.synced);

        let stored = load_local_or_seed(&store, now()).expect("reload");
        let user = stored
            .iter()
            .find(|u| u.email == "user@example.com")
            .expect("user");
        assert_eq!(user.full_name, "Boss");
        assert_eq!(user.user_id.as_deref(), Some("user-456"));
    }

    #[test]
    fn local_delete_and_unknown_user() {
        let store = MemoryStore::new();
        let directory = local_only(&store);
        directory.delete("admin@example.com").expect("delete");

        let stored = load_local_or_seed(&store, now()).expect("reload");
        assert_eq!(stored.len(), 1);

        let err = directory.delete("ghost@x.io").expect_err("missing");
        assert!(matches!(err, Error::UserNotFound(_)));
    }

    #[test]
    fn remote_write_failure_is_non_blocking() {
        let store = MemoryStore::new();
        let api = FakeApi {
            users: Some(vec![json!({ "email": "r@x.io", "fullName": "R" })]),
            fail_writes: true,
            ..FakeApi::default()
        };
        let directory = UserDirectory::new(&store, Some(&api));
        let edit = UserEdit {
            full_name: Some("Renamed".to_string()),
            ..UserEdit::default()
        };

        let change = directory.update("r@x.io", &edit).expect("update");
        assert_eq!(change.source, UserSource::Remote);
        assert_eq!(change.user.full_name, "Renamed");
        assert!(!change.synced);

        let change = directory.delete("r@x.io").expect("delete");
        assert!(!change.synced);
        assert_eq!(
            *api.calls.borrow(),
            vec!["list", "put r@x.io", "list", "delete r@x.io"]
        );
        assert!(store.get(keys::USERS).expect("get").is_none());
    }

    #[test]
    fn empty_edit_rejected() {
        let store = MemoryStore::new();
        let err = local_only(&store)
            .update("user@example.com", &UserEdit::default())
            .expect_err("empty edit");
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn http_api_builds_urls_from_config() {
        assert!(HttpUserApi::from_config(&RemoteConfig::default())
            .expect("config")
            .is_none());

        let config = RemoteConfig {
            users_url: Some("https://api.example.com/".to_string()),
            timeout_secs: 2,
        };
        let api = HttpUserApi::from_config(&config)
            .expect("config")
            .expect("configured");
        assert_eq!(api.base_url(), "https://api.example.com");
        assert_eq!(api.users_url(), "https://api.example.com/admin/users");
        assert_eq!(
            api.user_url("a@x.io"),
            "https://api.example.com/admin/users/a@x.io"
        );
    }
}
