use rusqlite::{Connection, ErrorCode, OptionalExtension, params};

use crate::error::TriageError;
use crate::model::{CorpusKind, CorpusSummary, ScoreCountRow};
use crate::util::now_utc_string;

pub fn create_corpus(
    connection: &Connection,
    kind: CorpusKind,
    name: &str,
    description: Option<&str>,
    owner: Option<&str>,
) -> Result<i64, TriageError> {
    let inserted = connection.execute(
        "
        INSERT INTO corpora(kind, name, description, owner, created_at)
        VALUES(?1, ?2, ?3, ?4, ?5)
        ",
        params![kind.as_str(), name, description, owner, now_utc_string()],
    );

    match inserted {
        Ok(_) => Ok(connection.last_insert_rowid()),
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.code == ErrorCode::ConstraintViolation =>
        {
            Err(TriageError::CorpusExists {
                kind,
                name: name.to_string(),
            })
        }
        Err(err) => Err(err.into()),
    }
}

pub fn find_corpus_id(
    connection: &Connection,
    kind: CorpusKind,
    name: &str,
) -> Result<Option<i64>, TriageError> {
    let corpus_id = connection
        .query_row(
            "SELECT corpus_id FROM corpora WHERE kind = ?1 AND name = ?2",
            params![kind.as_str(), name],
            |row| row.get(0),
        )
        .optional()?;
    Ok(corpus_id)
}

pub fn require_corpus_id(
    connection: &Connection,
    kind: CorpusKind,
    name: &str,
) -> Result<i64, TriageError> {
    find_corpus_id(connection, kind, name)?.ok_or_else(|| TriageError::UnknownCorpus {
        kind,
        name: name.to_string(),
    })
}

pub fn list_corpora(connection: &Connection) -> Result<Vec<CorpusSummary>, TriageError> {
    let mut statement = connection.prepare(
        "
        SELECT corpus_id, kind, name, description, owner, created_at
        FROM corpora
        ORDER BY kind ASC, name ASC
        ",
    )?;

    let mut rows = statement.query([])?;
    let mut out = Vec::<CorpusSummary>::new();
    while let Some(row) = rows.next()? {
        out.push(CorpusSummary {
            corpus_id: row.get(0)?,
            kind: row.get(1)?,
            name: row.get(2)?,
            description: row.get(3)?,
            owner: row.get(4)?,
            created_at: row.get(5)?,
        });
    }

    Ok(out)
}

/// Distinct documents scored in the named triage corpus, across all targets.
pub fn count_triaged_documents(
    connection: &Connection,
    triage_corpus: &str,
) -> Result<i64, TriageError> {
    let count = connection.query_row(
        "
        SELECT COUNT(DISTINCT s.document_id)
        FROM triage_scores AS s
        JOIN corpora AS triagec ON triagec.corpus_id = s.triage_corpus_id
        WHERE triagec.kind = 'triage' AND triagec.name = ?1
        ",
        [triage_corpus],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Raw score rows of a target corpus broken down by triage corpus and code.
pub fn score_counts(
    connection: &Connection,
    target_corpus: &str,
) -> Result<Vec<ScoreCountRow>, TriageError> {
    let mut statement = connection.prepare(
        "
        SELECT triagec.name, s.code, COUNT(*)
        FROM triage_scores AS s
        JOIN corpora AS targetc ON targetc.corpus_id = s.target_corpus_id
        JOIN corpora AS triagec ON triagec.corpus_id = s.triage_corpus_id
        WHERE targetc.kind = 'target' AND targetc.name = ?1
        GROUP BY triagec.name, s.code
        ORDER BY triagec.name ASC, s.code ASC
        ",
    )?;

    let mut rows = statement.query([target_corpus])?;
    let mut out = Vec::<ScoreCountRow>::new();
    while let Some(row) = rows.next()? {
        out.push(ScoreCountRow {
            triage_corpus: row.get(0)?,
            code: row.get(1)?,
            rows: row.get(2)?,
        });
    }

    Ok(out)
}
