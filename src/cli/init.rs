//! taskdeck init command implementation
//!
//! Creates the config file and the store in the deck root.

use std::path::{Path, PathBuf};

use crate::config::{Config, CONFIG_FILE};
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::storage::{FileStore, STORE_FILE};

/// Options for `taskdeck init`
pub struct InitOptions {
    pub root: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

#[derive(serde::Serialize)]
struct InitReport {
    root: PathBuf,
    store: PathBuf,
    created: InitCreated,
}

#[derive(serde::Serialize)]
struct InitCreated {
    config: bool,
    store: bool,
}

pub fn run(options: InitOptions) -> Result<()> {
    let root = match options.root {
        Some(path) => path,
        None => std::env::current_dir()?,
    };
    if root.exists() && !root.is_dir() {
        return Err(Error::InvalidArgument(format!(
            "deck root is not a directory: {}",
            root.display()
        )));
    }
    std::fs::create_dir_all(&root)?;

    let created_config = ensure_config(&root)?;
    let config = Config::load_from_root(&root);
    let store_dir = config.store_dir(&root);
    let created_store = !store_dir.join(STORE_FILE).exists();
    let store = FileStore::init(&store_dir)?;

    let report = InitReport {
        root: root.clone(),
        store: store.file(),
        created: InitCreated {
            config: created_config,
            store: created_store,
        },
    };

    let mut created_items = Vec::new();
    if created_config {
        created_items.push(CONFIG_FILE.to_string());
    }
    if created_store {
        created_items.push(format!("{}/{}", config.store.dir, STORE_FILE));
    }

    let header = if created_items.is_empty() {
        "taskdeck init: nothing to do".to_string()
    } else {
        "taskdeck init: initialized deck".to_string()
    };

    let mut human = HumanOutput::new(header);
    human.push_summary("root", root.display().to_string());
    human.push_summary(
        "created",
        if created_items.is_empty() {
            "none".to_string()
        } else {
            created_items.join(", ")
        },
    );
    human.push_next_step("taskdeck login --email admin@example.com --password <password>");
    human.push_next_step("taskdeck task add \"<title>\"");

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "init",
        &report,
        &human,
    )?;

    Ok(())
}

fn ensure_config(root: &Path) -> Result<bool> {
    let config_path = root.join(CONFIG_FILE);
    if config_path.exists() {
        if !config_path.is_file() {
            return Err(Error::OperationFailed(format!(
                "{CONFIG_FILE} exists but is not a file: {}",
                config_path.display()
            )));
        }
        return Ok(false);
    }

    Config::default().save(&config_path)?;
    Ok(true)
}
