//! Dashboard notes: one plain-text value under the `notes` key.

use crate::error::Result;
use crate::storage::{self, keys, KvStore};

/// Current notes; missing means empty
pub fn read_notes<S: KvStore + ?Sized>(store: &S) -> String {
    storage::read_string(store, keys::NOTES)
}

/// Replace the notes. The text is stored as is, not JSON-encoded.
pub fn write_notes<S: KvStore + ?Sized>(store: &S, text: &str) -> Result<()> {
    store.set(keys::NOTES, text)
}
