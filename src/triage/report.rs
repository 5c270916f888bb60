use rusqlite::Connection;

use crate::error::TriageError;
use crate::model::CodeCounts;
use crate::triage::{ScoreQuery, with_aggregated_scores};

/// Aggregated label counts for a target corpus: one label per document.
pub fn summarize_labels(
    connection: &Connection,
    target_corpus: &str,
    triage_corpus: Option<&str>,
) -> Result<CodeCounts, TriageError> {
    let query = ScoreQuery {
        target_corpus: target_corpus.to_string(),
        triage_corpus: triage_corpus.map(ToOwned::to_owned),
        skip_unknown: false,
    };

    with_aggregated_scores(connection, &query, |scores| {
        let mut counts = CodeCounts::default();
        for score in scores {
            counts.record(score?.code);
        }
        Ok(counts)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CorpusKind;
    use crate::store::create_corpus;
    use crate::store::testing::{insert_citation, insert_score, seeded_connection};

    #[test]
    fn counts_one_label_per_document() {
        let connection = seeded_connection();
        let target = create_corpus(&connection, CorpusKind::Target, "AP", None, None).expect("t");
        let small = create_corpus(&connection, CorpusKind::Triage, "Small", None, None).expect("s");
        let auto = create_corpus(&connection, CorpusKind::Triage, "Auto", None, None).expect("a");

        for document_id in 1..=4 {
            insert_citation(&connection, document_id, Some(100 + document_id), Some("text"));
        }
        insert_score(&connection, 1, target, small, "in");
        insert_score(&connection, 1, target, auto, "out");
        insert_score(&connection, 2, target, small, "out");
        insert_score(&connection, 2, target, auto, "unknown");
        insert_score(&connection, 3, target, auto, "unknown");
        insert_score(&connection, 4, target, auto, "in");

        let all = summarize_labels(&connection, "AP", None).expect("all");
        assert_eq!(all.in_count, 2);
        assert_eq!(all.out_count, 1);
        assert_eq!(all.unknown_count, 1);
        assert_eq!(all.total(), 4);

        let small_only = summarize_labels(&connection, "AP", Some("Small")).expect("small");
        assert_eq!(small_only.in_count, 1);
        assert_eq!(small_only.out_count, 1);
        assert_eq!(small_only.unknown_count, 0);
    }
}
