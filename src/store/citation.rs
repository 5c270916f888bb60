use rusqlite::Connection;

use crate::error::TriageError;

/// Internal document ids carrying the given PMID, ascending. More than one
/// entry means the PMID is ambiguous in this database.
pub fn find_documents_by_pmid(connection: &Connection, pmid: i64) -> Result<Vec<i64>, TriageError> {
    let mut statement = connection.prepare_cached(
        "SELECT document_id FROM citations WHERE pmid = ?1 ORDER BY document_id ASC",
    )?;

    let mut rows = statement.query([pmid])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        out.push(row.get(0)?);
    }

    Ok(out)
}
