use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::AddCorpusArgs;
use crate::model::CorpusKind;
use crate::store::{create_corpus, ensure_schema, open_connection};

pub fn run(db_path: &Path, args: AddCorpusArgs) -> Result<()> {
    let connection = open_connection(db_path)?;
    ensure_schema(&connection)?;

    let kind = CorpusKind::from(args.kind);
    let corpus_id = create_corpus(
        &connection,
        kind,
        &args.name,
        args.description.as_deref(),
        args.owner.as_deref(),
    )
    .with_context(|| format!("failed to register {kind} corpus {}", args.name))?;

    info!(corpus_id, kind = %kind, name = %args.name, "corpus registered");
    Ok(())
}
