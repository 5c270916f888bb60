use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::model::CorpusKind;
use crate::store::{
    count_triaged_documents, ensure_schema, list_corpora, open_connection, score_counts,
};
use crate::triage::summarize_labels;

pub fn run(db_path: &Path, args: StatusArgs) -> Result<()> {
    if !db_path.exists() {
        warn!(path = %db_path.display(), "database file missing");
        return Ok(());
    }

    let connection = open_connection(db_path)?;
    ensure_schema(&connection)?;

    let corpora = list_corpora(&connection).context("failed to list corpora")?;
    info!(path = %db_path.display(), corpora = corpora.len(), "database status");

    for corpus in &corpora {
        let triaged = if corpus.kind == CorpusKind::Triage.as_str() {
            count_triaged_documents(&connection, &corpus.name)?
        } else {
            0
        };
        info!(
            kind = %corpus.kind,
            name = %corpus.name,
            owner = %corpus.owner.as_deref().unwrap_or_default(),
            created_at = %corpus.created_at,
            triaged_documents = triaged,
            "corpus"
        );
    }

    let Some(target_corpus) = args.target_corpus.as_deref() else {
        return Ok(());
    };

    for row in score_counts(&connection, target_corpus)? {
        info!(
            target_corpus,
            triage_corpus = %row.triage_corpus,
            code = %row.code,
            rows = row.rows,
            "score rows"
        );
    }

    let labels = summarize_labels(&connection, target_corpus, args.triage_corpus.as_deref())
        .with_context(|| format!("failed to aggregate labels for {target_corpus}"))?;
    info!(
        target_corpus,
        triage_corpus = %args.triage_corpus.as_deref().unwrap_or("<all>"),
        documents = labels.total(),
        in_count = labels.in_count,
        out_count = labels.out_count,
        unknown_count = labels.unknown_count,
        "aggregated labels"
    );

    Ok(())
}
