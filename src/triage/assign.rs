use std::time::Instant;

use chrono::Utc;
use rusqlite::{Connection, ErrorCode, params};
use tracing::info;

use crate::error::TriageError;
use crate::model::{AssignSummary, CodeMap, CorpusKind};
use crate::store::{find_documents_by_pmid, require_corpus_id};
use crate::util::score_timestamp;

const PROGRESS_EVERY: usize = 50;

/// Records one score per resolvable PMID of `codes` in the given triage corpus
/// for the given target corpus.
///
/// PMIDs are processed in ascending order. A PMID with no citation is skipped
/// and counted as missing; a PMID matching several citations aborts the call.
/// Every row written by one call carries the same classify/scored timestamp.
/// The caller owns the surrounding transaction: pass a `Transaction` and only
/// commit it once this returns `Ok`, so a failing batch leaves nothing behind.
pub fn assign_codes(
    connection: &Connection,
    triage_corpus: &str,
    target_corpus: &str,
    codes: &CodeMap,
) -> Result<AssignSummary, TriageError> {
    let started = Instant::now();
    let timestamp = score_timestamp(Utc::now());

    let triage_corpus_id = require_corpus_id(connection, CorpusKind::Triage, triage_corpus)?;
    let target_corpus_id = require_corpus_id(connection, CorpusKind::Target, target_corpus)?;

    let mut summary = AssignSummary {
        requested: codes.len(),
        ..AssignSummary::default()
    };

    {
        let mut statement = connection.prepare(
            "
            INSERT INTO triage_scores(
              document_id, target_corpus_id, triage_corpus_id,
              code, in_score, classify_timestamp, scored_timestamp
            )
            VALUES(?1, ?2, ?3, ?4, -1, ?5, ?5)
            ",
        )?;

        for (processed, (&pmid, &code)) in codes.iter().enumerate() {
            let documents = find_documents_by_pmid(connection, pmid)?;
            match documents.as_slice() {
                [] => summary.missing += 1,
                [document_id] => {
                    let inserted = statement.execute(params![
                        document_id,
                        target_corpus_id,
                        triage_corpus_id,
                        code.as_str(),
                        timestamp,
                    ]);
                    match inserted {
                        Ok(_) => summary.inserted += 1,
                        Err(rusqlite::Error::SqliteFailure(err, _))
                            if err.code == ErrorCode::ConstraintViolation =>
                        {
                            return Err(TriageError::AlreadyAssigned {
                                external_id: pmid,
                                document_id: *document_id,
                                triage_corpus: triage_corpus.to_string(),
                                target_corpus: target_corpus.to_string(),
                            });
                        }
                        Err(err) => return Err(err.into()),
                    }
                }
                _ => {
                    return Err(TriageError::AmbiguousIdentifier {
                        external_id: pmid,
                        matches: documents.len(),
                    });
                }
            }

            let processed = processed + 1;
            if processed % PROGRESS_EVERY == 0 {
                info!(
                    processed,
                    total = summary.requested,
                    inserted = summary.inserted,
                    elapsed_s = started.elapsed().as_secs_f64(),
                    "assigning triage codes"
                );
            }
        }
    }

    summary.elapsed_ms = started.elapsed().as_millis();
    info!(
        triage_corpus,
        target_corpus,
        inserted = summary.inserted,
        missing = summary.missing,
        elapsed_s = started.elapsed().as_secs_f64(),
        "triage codes assigned"
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TriageCode;
    use crate::store::create_corpus;
    use crate::store::testing::{count_rows, insert_citation, seeded_connection};

    fn corpora(connection: &Connection) {
        create_corpus(connection, CorpusKind::Triage, "TriageCorpus", None, None).expect("triage");
        create_corpus(connection, CorpusKind::Target, "AP", None, None).expect("target");
    }

    fn codes(entries: &[(i64, TriageCode)]) -> CodeMap {
        entries.iter().copied().collect()
    }

    fn assign_committed(
        connection: &mut Connection,
        triage_corpus: &str,
        codes: &CodeMap,
    ) -> Result<AssignSummary, TriageError> {
        let tx = connection.transaction()?;
        let summary = assign_codes(&tx, triage_corpus, "AP", codes)?;
        tx.commit()?;
        Ok(summary)
    }

    #[test]
    fn inserts_one_score_per_resolved_pmid_with_shared_timestamp() {
        let mut connection = seeded_connection();
        corpora(&connection);
        insert_citation(&connection, 10, Some(123), Some("a"));
        insert_citation(&connection, 11, Some(456), Some("b"));

        let batch = codes(&[(456, TriageCode::Out), (123, TriageCode::In)]);
        let summary = assign_committed(&mut connection, "TriageCorpus", &batch).expect("assign");
        assert_eq!(summary.requested, 2);
        assert_eq!(summary.inserted, 2);
        assert_eq!(summary.missing, 0);

        let mut statement = connection
            .prepare(
                "SELECT document_id, code, in_score, classify_timestamp, scored_timestamp
                 FROM triage_scores ORDER BY document_id",
            )
            .expect("prepare");
        let rows = statement
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, f64>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })
            .expect("query")
            .collect::<rusqlite::Result<Vec<_>>>()
            .expect("rows");

        assert_eq!(rows.len(), 2);
        assert_eq!((rows[0].0, rows[0].1.as_str()), (10, "in"));
        assert_eq!((rows[1].0, rows[1].1.as_str()), (11, "out"));
        assert!(rows.iter().all(|row| row.2 == -1.0));
        assert!(rows.iter().all(|row| row.3 == row.4 && row.3 == rows[0].3));
        assert_eq!(rows[0].3.len(), "yyyy-mm-dd hh:mm:ss".len());
    }

    #[test]
    fn ambiguous_pmid_aborts_and_commits_nothing() {
        let mut connection = seeded_connection();
        corpora(&connection);
        insert_citation(&connection, 1, Some(123), Some("a"));
        insert_citation(&connection, 2, Some(999), Some("b"));
        insert_citation(&connection, 3, Some(999), Some("c"));

        let batch = codes(&[(123, TriageCode::In), (999, TriageCode::Out)]);
        let err = assign_committed(&mut connection, "TriageCorpus", &batch)
            .expect_err("ambiguous pmid");

        match err {
            TriageError::AmbiguousIdentifier {
                external_id,
                matches,
            } => {
                assert_eq!(external_id, 999);
                assert_eq!(matches, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(count_rows(&connection, "SELECT COUNT(*) FROM triage_scores"), 0);
    }

    #[test]
    fn missing_pmid_is_skipped_without_error() {
        let mut connection = seeded_connection();
        corpora(&connection);

        let batch = codes(&[(123, TriageCode::In)]);
        let summary = assign_committed(&mut connection, "TriageCorpus", &batch).expect("assign");
        assert_eq!(summary.inserted, 0);
        assert_eq!(summary.missing, 1);
    }

    #[test]
    fn unknown_corpus_is_reported_before_any_write() {
        let mut connection = seeded_connection();
        create_corpus(&connection, CorpusKind::Target, "AP", None, None).expect("target");
        insert_citation(&connection, 1, Some(123), None);

        let batch = codes(&[(123, TriageCode::In)]);
        let err = assign_committed(&mut connection, "Missing", &batch)
            .expect_err("unknown triage corpus");
        assert!(matches!(
            err,
            TriageError::UnknownCorpus {
                kind: CorpusKind::Triage,
                ..
            }
        ));
    }

    #[test]
    fn rerun_without_deletion_is_rejected_and_rolled_back() {
        let mut connection = seeded_connection();
        corpora(&connection);
        insert_citation(&connection, 1, Some(1), None);
        insert_citation(&connection, 2, Some(2), None);

        let batch = codes(&[(2, TriageCode::In)]);
        assign_committed(&mut connection, "TriageCorpus", &batch).expect("first run");

        let batch = codes(&[(1, TriageCode::Out), (2, TriageCode::Out)]);
        let err = assign_committed(&mut connection, "TriageCorpus", &batch)
            .expect_err("second run collides");
        assert!(matches!(
            err,
            TriageError::AlreadyAssigned {
                external_id: 2,
                document_id: 2,
                ..
            }
        ));
        assert_eq!(count_rows(&connection, "SELECT COUNT(*) FROM triage_scores"), 1);
    }

    #[test]
    fn large_batches_count_every_identifier() {
        let mut connection = seeded_connection();
        corpora(&connection);
        for document_id in 1..=120 {
            if document_id % 3 != 0 {
                insert_citation(&connection, document_id, Some(10_000 + document_id), None);
            }
        }

        let batch = (1..=120)
            .map(|id| (10_000 + id, TriageCode::Unknown))
            .collect::<CodeMap>();
        let summary = assign_committed(&mut connection, "TriageCorpus", &batch).expect("assign");
        assert_eq!(summary.requested, 120);
        assert_eq!(summary.inserted, 80);
        assert_eq!(summary.missing, 40);
    }
}
