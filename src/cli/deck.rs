//! Deck resolution shared by commands that operate on an initialized deck.

use std::path::PathBuf;

use tracing::debug;

use crate::auth::{AuthSession, CurrentUser};
use crate::config::{Config, CONFIG_FILE};
use crate::error::Result;
use crate::session_log::SessionLog;
use crate::storage::{self, FileStore, STORE_DIR};
use crate::users::{HttpUserApi, UserDirectory, ADMIN_ROLE};

pub(crate) struct Deck {
    pub root: PathBuf,
    pub config: Config,
    pub store: FileStore,
}

impl Deck {
    /// Open the deck at `root`, or the nearest one above the current directory
    pub fn open(root: Option<PathBuf>) -> Result<Self> {
        let root = match root {
            Some(path) => path,
            None => {
                let cwd = std::env::current_dir()?;
                storage::discover_root(&cwd, &[CONFIG_FILE, STORE_DIR])?
            }
        };
        let config = Config::load_from_root(&root);
        let store = FileStore::open(config.store_dir(&root))?;
        debug!(root = %root.display(), store = %store.dir().display(), "deck opened");
        Ok(Self {
            root,
            config,
            store,
        })
    }

    pub fn auth(&self) -> AuthSession<&FileStore> {
        AuthSession::new(&self.store, self.config.session.clone())
    }

    pub fn session_log(&self) -> SessionLog<&FileStore> {
        SessionLog::new(&self.store, self.config.session.clone())
    }

    pub fn users(&self) -> Result<UserDirectory<&FileStore, HttpUserApi>> {
        let api = HttpUserApi::from_config(&self.config.remote)?;
        Ok(UserDirectory::new(&self.store, api))
    }

    /// Logged-in admin, or `NotAuthenticated`/`Forbidden`
    pub fn require_admin(&self) -> Result<CurrentUser> {
        self.auth().require_role(ADMIN_ROLE)
    }
}
