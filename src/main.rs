//! taskdeck - Kanban task dashboard CLI
//!
//! Tasks, a filter panel, a login/logout audit log and admin user
//! management over a local key-value store.

use clap::Parser;
use taskdeck::cli::Cli;
use taskdeck::output::{command_name, emit_error};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() {
    let command = command_name(std::env::args().skip(1));
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let json = cli.json;
    if let Err(err) = cli.run() {
        let _ = emit_error(&command, &err, json);
        std::process::exit(err.exit_code());
    }
}

fn init_tracing(verbose: bool) {
    // Tracing is opt-in via RUST_LOG (or --verbose when RUST_LOG is unset).
    // Keep startup robust in CI/robot envs: ignore invalid/huge filters.
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|raw| {
            let raw = raw.trim();
            if raw.is_empty() || raw.len() > 4096 {
                return None;
            }
            EnvFilter::try_new(raw).ok()
        })
        .unwrap_or_else(|| EnvFilter::new(if verbose { "taskdeck=debug" } else { "off" }));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}
