use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::DeleteScoresArgs;
use crate::store::{ensure_schema, open_connection};
use crate::triage::delete_scores;

pub fn run(db_path: &Path, args: DeleteScoresArgs) -> Result<()> {
    let mut connection = open_connection(db_path)?;
    ensure_schema(&connection)?;

    let tx = connection.transaction()?;
    let summary =
        delete_scores(&tx, &args.triage_corpus, &args.target_corpus).with_context(|| {
            format!(
                "failed to delete scores of {} / {}",
                args.triage_corpus, args.target_corpus
            )
        })?;
    tx.commit()?;

    info!(rows_removed = summary.total(), "delete-scores completed");
    Ok(())
}
