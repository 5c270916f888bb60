use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TriageError;

/// Triage judgement for one document. Variant order is precedence order:
/// `In` beats `Out`, `Out` beats `Unknown`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriageCode {
    Unknown,
    Out,
    In,
}

impl TriageCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::In => "in",
            Self::Out => "out",
            Self::Unknown => "unknown",
        }
    }

    /// Case-sensitive; anything other than `in`, `out` or `unknown` is `None`.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "in" => Some(Self::In),
            "out" => Some(Self::Out),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }

    /// Folds one more judgement into an aggregated code.
    pub fn merge(self, other: TriageCode) -> TriageCode {
        match other {
            Self::In => Self::In,
            Self::Out if self != Self::In => Self::Out,
            _ => self,
        }
    }
}

impl fmt::Display for TriageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TriageCode {
    type Err = TriageError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        Self::parse(token).ok_or_else(|| TriageError::InvalidCode {
            token: token.to_string(),
        })
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorpusKind {
    Triage,
    Target,
}

impl CorpusKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Triage => "triage",
            Self::Target => "target",
        }
    }
}

impl fmt::Display for CorpusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One raw score fact as produced by the score row query.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRow {
    pub document_id: i64,
    pub code: String,
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedScore {
    pub document_id: i64,
    pub code: TriageCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CorpusSummary {
    pub corpus_id: i64,
    pub kind: String,
    pub name: String,
    pub description: Option<String>,
    pub owner: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AssignSummary {
    pub requested: usize,
    pub inserted: usize,
    pub missing: usize,
    pub elapsed_ms: u128,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeletionSummary {
    pub features_removed: usize,
    pub scores_removed: usize,
}

impl DeletionSummary {
    pub fn total(&self) -> usize {
        self.features_removed + self.scores_removed
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CodeCounts {
    #[serde(rename = "in")]
    pub in_count: usize,
    #[serde(rename = "out")]
    pub out_count: usize,
    #[serde(rename = "unknown")]
    pub unknown_count: usize,
}

impl CodeCounts {
    pub fn record(&mut self, code: TriageCode) {
        match code {
            TriageCode::In => self.in_count += 1,
            TriageCode::Out => self.out_count += 1,
            TriageCode::Unknown => self.unknown_count += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.in_count + self.out_count + self.unknown_count
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoreCountRow {
    pub triage_corpus: String,
    pub code: String,
    pub rows: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportQuery {
    pub target_corpus: String,
    pub triage_corpus: Option<String>,
    pub skip_unknown: bool,
    pub with_text: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub generated_at: String,
    pub db_path: String,
    pub export_path: String,
    pub query: ExportQuery,
    pub documents_exported: usize,
    pub groups_skipped: usize,
    pub counts: CodeCounts,
    pub sha256: String,
}

pub type CodeMap = BTreeMap<i64, TriageCode>;
