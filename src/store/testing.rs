use rusqlite::{Connection, params};

use super::ensure_schema;

pub(crate) fn seeded_connection() -> Connection {
    let connection = Connection::open_in_memory().expect("in-memory db");
    connection
        .pragma_update(None, "foreign_keys", "ON")
        .expect("foreign keys");
    ensure_schema(&connection).expect("schema");
    connection
}

pub(crate) fn insert_citation(
    connection: &Connection,
    document_id: i64,
    pmid: Option<i64>,
    full_text: Option<&str>,
) {
    connection
        .execute(
            "INSERT INTO citations(document_id, pmid, title, full_text) VALUES(?1, ?2, NULL, ?3)",
            params![document_id, pmid, full_text],
        )
        .expect("insert citation");
}

pub(crate) fn insert_score(
    connection: &Connection,
    document_id: i64,
    target_corpus_id: i64,
    triage_corpus_id: i64,
    code: &str,
) -> i64 {
    connection
        .execute(
            "
            INSERT INTO triage_scores(document_id, target_corpus_id, triage_corpus_id, code)
            VALUES(?1, ?2, ?3, ?4)
            ",
            params![document_id, target_corpus_id, triage_corpus_id, code],
        )
        .expect("insert score");
    connection.last_insert_rowid()
}

pub(crate) fn insert_feature(connection: &Connection, score_id: i64, name: &str, value: f64) {
    connection
        .execute(
            "INSERT INTO triage_features(score_id, name, value) VALUES(?1, ?2, ?3)",
            params![score_id, name, value],
        )
        .expect("insert feature");
}

pub(crate) fn count_rows(connection: &Connection, sql: &str) -> i64 {
    connection
        .query_row(sql, [], |row| row.get(0))
        .expect("count query")
}
