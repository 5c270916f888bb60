use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::store::{DB_SCHEMA_VERSION, ensure_schema, open_connection};

pub fn run(db_path: &Path) -> Result<()> {
    let connection = open_connection(db_path)?;
    ensure_schema(&connection)
        .with_context(|| format!("failed to initialize schema in {}", db_path.display()))?;

    info!(
        path = %db_path.display(),
        db_schema_version = DB_SCHEMA_VERSION,
        "database initialized"
    );
    Ok(())
}
