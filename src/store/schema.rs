use rusqlite::Connection;

use crate::error::TriageError;
use crate::util::now_utc_string;

pub const DB_SCHEMA_VERSION: &str = "0.1.0";

pub fn ensure_schema(connection: &Connection) -> Result<(), TriageError> {
    connection.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS metadata (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS corpora (
          corpus_id INTEGER PRIMARY KEY,
          kind TEXT NOT NULL CHECK (kind IN ('triage', 'target')),
          name TEXT NOT NULL,
          description TEXT,
          owner TEXT,
          created_at TEXT NOT NULL,
          UNIQUE (kind, name)
        );

        CREATE TABLE IF NOT EXISTS citations (
          document_id INTEGER PRIMARY KEY CHECK (document_id > 0),
          pmid INTEGER,
          title TEXT,
          full_text TEXT
        );

        CREATE TABLE IF NOT EXISTS triage_scores (
          score_id INTEGER PRIMARY KEY,
          document_id INTEGER NOT NULL,
          target_corpus_id INTEGER NOT NULL,
          triage_corpus_id INTEGER NOT NULL,
          code TEXT NOT NULL,
          in_score REAL NOT NULL DEFAULT -1,
          classify_timestamp TEXT,
          scored_timestamp TEXT,
          UNIQUE (document_id, target_corpus_id, triage_corpus_id),
          FOREIGN KEY(document_id) REFERENCES citations(document_id),
          FOREIGN KEY(target_corpus_id) REFERENCES corpora(corpus_id),
          FOREIGN KEY(triage_corpus_id) REFERENCES corpora(corpus_id)
        );

        CREATE TABLE IF NOT EXISTS triage_features (
          feature_id INTEGER PRIMARY KEY,
          score_id INTEGER NOT NULL,
          name TEXT NOT NULL,
          value REAL NOT NULL,
          FOREIGN KEY(score_id) REFERENCES triage_scores(score_id)
        );

        CREATE INDEX IF NOT EXISTS idx_citations_pmid ON citations(pmid);
        CREATE INDEX IF NOT EXISTS idx_triage_scores_target_doc ON triage_scores(target_corpus_id, document_id);
        CREATE INDEX IF NOT EXISTS idx_triage_scores_pair ON triage_scores(triage_corpus_id, target_corpus_id);
        CREATE INDEX IF NOT EXISTS idx_triage_features_score ON triage_features(score_id);
        ",
    )?;

    let now = now_utc_string();
    connection.execute(
        "INSERT INTO metadata(key, value) VALUES('db_schema_version', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [DB_SCHEMA_VERSION],
    )?;
    connection.execute(
        "INSERT INTO metadata(key, value) VALUES('db_updated_at', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [now],
    )?;

    Ok(())
}
