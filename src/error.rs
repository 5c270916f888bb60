use thiserror::Error;

use crate::model::CorpusKind;

/// Failures raised by the triage store and the score operations built on it.
#[derive(Error, Debug)]
pub enum TriageError {
    #[error("database error: {0}")]
    Store(#[from] rusqlite::Error),

    /// The score row cursor failed mid-read. The aggregated sequence ends here.
    #[error("score cursor failed after document {}", display_last(.last_document_id))]
    Cursor {
        last_document_id: Option<i64>,
        #[source]
        source: rusqlite::Error,
    },

    #[error("{kind} corpus not found: {name}")]
    UnknownCorpus { kind: CorpusKind, name: String },

    #[error("{kind} corpus already exists: {name}")]
    CorpusExists { kind: CorpusKind, name: String },

    #[error("PMID {external_id} ambiguous: matches {matches} documents")]
    AmbiguousIdentifier { external_id: i64, matches: usize },

    #[error(
        "PMID {external_id} (document {document_id}) already scored in triage corpus \
         {triage_corpus} for target corpus {target_corpus}"
    )]
    AlreadyAssigned {
        external_id: i64,
        document_id: i64,
        triage_corpus: String,
        target_corpus: String,
    },

    #[error("invalid triage code: {token:?}")]
    InvalidCode { token: String },

    #[error("invalid code line pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("code list line {line}: {reason}")]
    CodeList { line: usize, reason: String },
}

fn display_last(last_document_id: &Option<i64>) -> String {
    match last_document_id {
        Some(id) => id.to_string(),
        None => "<none>".to_string(),
    }
}
