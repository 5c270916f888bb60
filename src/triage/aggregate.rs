use rusqlite::{Connection, MappedRows, Row, params};
use tracing::{debug, warn};

use crate::error::TriageError;
use crate::model::{AggregatedScore, ScoreRow, TriageCode};

/// Score rows of one target corpus, optionally restricted to one triage
/// corpus, sorted by document id. `?2` NULL or empty means every triage corpus.
const SCORE_ROWS_SQL: &str = "
    SELECT DISTINCT c.full_text, s.code, c.document_id
    FROM triage_scores AS s
    JOIN citations AS c ON c.document_id = s.document_id
    JOIN corpora AS targetc ON targetc.corpus_id = s.target_corpus_id
    WHERE targetc.kind = 'target'
      AND targetc.name = ?1
      AND (
        COALESCE(?2, '') = ''
        OR s.triage_corpus_id IN (
          SELECT triagec.corpus_id
          FROM corpora AS triagec
          WHERE triagec.kind = 'triage' AND triagec.name = ?2
        )
      )
    ORDER BY c.document_id ASC
";

pub type ScoreRowCursor<'stmt> =
    MappedRows<'stmt, fn(&Row<'_>) -> rusqlite::Result<ScoreRow>>;

#[derive(Debug, Clone)]
pub struct ScoreQuery {
    pub target_corpus: String,
    pub triage_corpus: Option<String>,
    pub skip_unknown: bool,
}

fn read_score_row(row: &Row<'_>) -> rusqlite::Result<ScoreRow> {
    Ok(ScoreRow {
        text: row.get(0)?,
        code: row.get(1)?,
        document_id: row.get(2)?,
    })
}

/// Runs `consume` over the aggregated scores matching `query`. The underlying
/// statement lives exactly as long as the call, whether `consume` succeeds or not.
pub fn with_aggregated_scores<T, E, F>(
    connection: &Connection,
    query: &ScoreQuery,
    consume: F,
) -> Result<T, E>
where
    E: From<TriageError>,
    F: FnOnce(&mut AggregationReader<ScoreRowCursor<'_>>) -> Result<T, E>,
{
    let mut statement = connection
        .prepare(SCORE_ROWS_SQL)
        .map_err(TriageError::from)?;
    let rows = statement
        .query_map(
            params![query.target_corpus, query.triage_corpus],
            read_score_row as fn(&Row<'_>) -> rusqlite::Result<ScoreRow>,
        )
        .map_err(TriageError::from)?;

    let mut reader = AggregationReader::new(rows, query.skip_unknown);
    let result = consume(&mut reader);
    debug!(
        target_corpus = %query.target_corpus,
        emitted = reader.emitted(),
        skipped = reader.skipped(),
        "score cursor released"
    );
    result
}

/// Collapses a document-sorted stream of score rows into one aggregated score
/// per document.
///
/// Rows of the same document must arrive contiguously. Within a group the
/// aggregated code is the highest-precedence code seen (`in` > `out` >
/// `unknown`), so row order inside the group does not matter. With
/// `skip_unknown` set, groups that aggregate to `unknown` are consumed
/// internally and never yielded.
///
/// A cursor error is yielded once and ends the sequence.
pub struct AggregationReader<I> {
    rows: I,
    lookahead: Option<ScoreRow>,
    primed: bool,
    exhausted: bool,
    skip_unknown: bool,
    last_document_id: Option<i64>,
    emitted: usize,
    skipped: usize,
}

impl<I> AggregationReader<I>
where
    I: Iterator<Item = rusqlite::Result<ScoreRow>>,
{
    pub fn new(rows: I, skip_unknown: bool) -> Self {
        Self {
            rows,
            lookahead: None,
            primed: false,
            exhausted: false,
            skip_unknown,
            last_document_id: None,
            emitted: 0,
            skipped: 0,
        }
    }

    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// Groups dropped because they aggregated to `unknown`.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    fn advance(&mut self) -> Result<(), TriageError> {
        self.lookahead = None;
        if self.exhausted {
            return Ok(());
        }

        match self.rows.next() {
            Some(Ok(row)) => {
                self.lookahead = Some(row);
                Ok(())
            }
            Some(Err(source)) => {
                self.exhausted = true;
                Err(TriageError::Cursor {
                    last_document_id: self.last_document_id,
                    source,
                })
            }
            None => {
                self.exhausted = true;
                Ok(())
            }
        }
    }

    fn next_group(&mut self) -> Result<Option<AggregatedScore>, TriageError> {
        if !self.primed {
            self.primed = true;
            self.advance()?;
        }

        let Some(seed) = self.lookahead.take() else {
            return Ok(None);
        };

        if let Some(previous) = self.last_document_id
            && seed.document_id <= previous
        {
            warn!(
                document_id = seed.document_id,
                previous_document_id = previous,
                "score rows are not sorted by document id; groups may be split"
            );
        }
        self.last_document_id = Some(seed.document_id);

        let mut aggregated = AggregatedScore {
            document_id: seed.document_id,
            code: row_code(&seed),
            text: seed.text,
        };
        self.advance()?;

        while let Some(row) = self.lookahead.as_ref() {
            if row.document_id != aggregated.document_id {
                break;
            }
            aggregated.code = aggregated.code.merge(row_code(row));
            self.advance()?;
        }

        Ok(Some(aggregated))
    }
}

impl<I> Iterator for AggregationReader<I>
where
    I: Iterator<Item = rusqlite::Result<ScoreRow>>,
{
    type Item = Result<AggregatedScore, TriageError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.next_group() {
                Ok(Some(score)) if self.skip_unknown && score.code == TriageCode::Unknown => {
                    self.skipped += 1;
                }
                Ok(Some(score)) => {
                    self.emitted += 1;
                    return Some(Ok(score));
                }
                Ok(None) => return None,
                Err(err) => return Some(Err(err)),
            }
        }
    }
}

// Malformed tokens rank with `unknown`: they never override an in/out.
fn row_code(row: &ScoreRow) -> TriageCode {
    match TriageCode::parse(&row.code) {
        Some(code) => code,
        None => {
            warn!(
                document_id = row.document_id,
                code = %row.code,
                "unrecognized triage code; treating as unknown"
            );
            TriageCode::Unknown
        }
    }
}
