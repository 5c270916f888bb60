use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::info;

use crate::cli::AssignArgs;
use crate::model::{AssignSummary, CodeMap};
use crate::store::{ensure_schema, open_connection};
use crate::triage::{assign_codes, delete_scores, load_code_list};

pub fn run(db_path: &Path, args: AssignArgs) -> Result<()> {
    let codes = load_code_list(&args.code_list)?;

    let mut connection = open_connection(db_path)?;
    ensure_schema(&connection)?;

    info!(
        triage_corpus = %args.triage_corpus,
        target_corpus = %args.target_corpus,
        pmids = codes.len(),
        replace = args.replace,
        "starting assignment"
    );

    let summary = assign_pair(
        &mut connection,
        &args.triage_corpus,
        &args.target_corpus,
        &codes,
        args.replace,
    )
    .with_context(|| {
        format!(
            "failed to assign codes from {} to {} / {}",
            args.code_list.display(),
            args.triage_corpus,
            args.target_corpus
        )
    })?;

    info!(
        requested = summary.requested,
        inserted = summary.inserted,
        missing = summary.missing,
        elapsed_ms = summary.elapsed_ms as u64,
        "assignment completed"
    );
    Ok(())
}

/// Clearing the pair (with `replace`) and inserting the new codes share one
/// transaction, committed only after the assignment succeeds.
fn assign_pair(
    connection: &mut Connection,
    triage_corpus: &str,
    target_corpus: &str,
    codes: &CodeMap,
    replace: bool,
) -> Result<AssignSummary> {
    let tx = connection.transaction()?;

    if replace {
        delete_scores(&tx, triage_corpus, target_corpus)
            .context("failed to clear existing scores before reassignment")?;
    }
    let summary = assign_codes(&tx, triage_corpus, target_corpus, codes)?;

    tx.commit()?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TriageError;
    use crate::model::{CorpusKind, TriageCode};
    use crate::store::create_corpus;
    use crate::store::testing::{count_rows, insert_citation, seeded_connection};

    fn seeded_pair() -> Connection {
        let mut connection = seeded_connection();
        create_corpus(&connection, CorpusKind::Triage, "Small", None, None).expect("triage");
        create_corpus(&connection, CorpusKind::Target, "AP", None, None).expect("target");
        insert_citation(&connection, 1, Some(100), None);
        insert_citation(&connection, 2, Some(999), None);
        insert_citation(&connection, 3, Some(999), None);
        insert_citation(&connection, 4, Some(200), None);

        let first = CodeMap::from([(100, TriageCode::In)]);
        assign_pair(&mut connection, "Small", "AP", &first, false).expect("first run");
        connection
    }

    fn stored_codes(connection: &Connection) -> Vec<(i64, String)> {
        let mut statement = connection
            .prepare("SELECT document_id, code FROM triage_scores ORDER BY document_id")
            .expect("prepare");
        statement
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .expect("query")
            .collect::<rusqlite::Result<Vec<_>>>()
            .expect("rows")
    }

    #[test]
    fn failing_replace_keeps_the_previous_scores() {
        let mut connection = seeded_pair();

        let second = CodeMap::from([(100, TriageCode::Out), (999, TriageCode::In)]);
        let err = assign_pair(&mut connection, "Small", "AP", &second, true)
            .expect_err("ambiguous pmid");
        assert!(matches!(
            err.downcast_ref::<TriageError>(),
            Some(TriageError::AmbiguousIdentifier {
                external_id: 999,
                ..
            })
        ));

        assert_eq!(stored_codes(&connection), vec![(1, "in".to_string())]);
    }

    #[test]
    fn replace_swaps_in_the_new_codes() {
        let mut connection = seeded_pair();

        let second = CodeMap::from([(100, TriageCode::Out), (200, TriageCode::In)]);
        let summary =
            assign_pair(&mut connection, "Small", "AP", &second, true).expect("replace");
        assert_eq!(summary.inserted, 2);

        assert_eq!(
            stored_codes(&connection),
            vec![(1, "out".to_string()), (4, "in".to_string())]
        );
    }

    #[test]
    fn rerun_without_replace_leaves_existing_scores_alone() {
        let mut connection = seeded_pair();

        let second = CodeMap::from([(200, TriageCode::Out), (100, TriageCode::Out)]);
        assign_pair(&mut connection, "Small", "AP", &second, false).expect_err("collision");

        assert_eq!(count_rows(&connection, "SELECT COUNT(*) FROM triage_scores"), 1);
    }
}
