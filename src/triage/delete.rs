use rusqlite::{Connection, params};
use tracing::{info, warn};

use crate::error::TriageError;
use crate::model::{CorpusKind, DeletionSummary};
use crate::store::find_corpus_id;

/// Removes every score of `triage_corpus` for `target_corpus`, together with
/// the features derived from those scores. Features go first; the caller's
/// transaction makes both statements one unit. Unknown corpora and
/// already-clean pairs remove nothing.
pub fn delete_scores(
    connection: &Connection,
    triage_corpus: &str,
    target_corpus: &str,
) -> Result<DeletionSummary, TriageError> {
    let triage_corpus_id = find_corpus_id(connection, CorpusKind::Triage, triage_corpus)?;
    let target_corpus_id = find_corpus_id(connection, CorpusKind::Target, target_corpus)?;
    let (Some(triage_corpus_id), Some(target_corpus_id)) = (triage_corpus_id, target_corpus_id)
    else {
        warn!(
            triage_corpus,
            target_corpus, "corpus pair not registered; nothing to delete"
        );
        return Ok(DeletionSummary::default());
    };

    let features_removed = connection.execute(
        "
        DELETE FROM triage_features
        WHERE score_id IN (
          SELECT score_id
          FROM triage_scores
          WHERE triage_corpus_id = ?1 AND target_corpus_id = ?2
        )
        ",
        params![triage_corpus_id, target_corpus_id],
    )?;

    let scores_removed = connection.execute(
        "DELETE FROM triage_scores WHERE triage_corpus_id = ?1 AND target_corpus_id = ?2",
        params![triage_corpus_id, target_corpus_id],
    )?;

    let summary = DeletionSummary {
        features_removed,
        scores_removed,
    };
    info!(
        triage_corpus,
        target_corpus,
        features_removed,
        scores_removed,
        "existing triage scores removed"
    );

    Ok(summary)
}
