use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;

use crate::util::ensure_parent_directory;

mod citation;
mod corpus;
mod schema;
#[cfg(test)]
pub(crate) mod testing;

pub use citation::find_documents_by_pmid;
pub use corpus::{
    count_triaged_documents, create_corpus, find_corpus_id, list_corpora, require_corpus_id,
    score_counts,
};
pub use schema::{DB_SCHEMA_VERSION, ensure_schema};

pub fn open_connection(db_path: &Path) -> Result<Connection> {
    ensure_parent_directory(db_path)?;

    let connection = Connection::open(db_path)
        .with_context(|| format!("failed to open {}", db_path.display()))?;
    configure_connection(&connection)?;
    Ok(connection)
}

pub(crate) fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    connection
        .pragma_update(None, "foreign_keys", "ON")
        .context("failed to enable foreign_keys")?;
    Ok(())
}
