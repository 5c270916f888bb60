use std::collections::btree_map::Entry;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use regex::Regex;
use tracing::{info, warn};

use crate::error::TriageError;
use crate::model::{CodeMap, TriageCode};

const CODE_LINE_PATTERN: &str = r"^\s*(\S+?)[\s,]+(\S+?)\s*,?\s*$";

pub fn load_code_list(path: &Path) -> Result<CodeMap> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read code list {}", path.display()))?;
    let codes = parse_code_list(&raw)
        .with_context(|| format!("failed to parse code list {}", path.display()))?;

    info!(path = %path.display(), pmids = codes.len(), "loaded code list");
    Ok(codes)
}

/// Parses `pmid code` lines. Fields may be separated by whitespace or a comma.
/// Blank lines and `#` comments are ignored. The first line is taken as a
/// header when neither of its fields reads as a PMID or a code.
pub fn parse_code_list(raw: &str) -> Result<CodeMap, TriageError> {
    let code_line = Regex::new(CODE_LINE_PATTERN)?;
    let mut codes = CodeMap::new();

    for (index, line) in raw.lines().enumerate() {
        let line_no = index + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let Some(caps) = code_line.captures(trimmed) else {
            return Err(TriageError::CodeList {
                line: line_no,
                reason: format!("expected `pmid code`, found {trimmed:?}"),
            });
        };

        let Ok(pmid) = caps[1].parse::<i64>() else {
            if line_no == 1 && TriageCode::parse(&caps[2]).is_none() {
                continue;
            }
            return Err(TriageError::CodeList {
                line: line_no,
                reason: format!("invalid PMID {:?}", &caps[1]),
            });
        };

        let code = caps[2]
            .parse::<TriageCode>()
            .map_err(|err| TriageError::CodeList {
                line: line_no,
                reason: err.to_string(),
            })?;

        match codes.entry(pmid) {
            Entry::Vacant(slot) => {
                slot.insert(code);
            }
            Entry::Occupied(existing) if *existing.get() == code => {
                warn!(line = line_no, pmid, "duplicate PMID in code list");
            }
            Entry::Occupied(existing) => {
                return Err(TriageError::CodeList {
                    line: line_no,
                    reason: format!(
                        "PMID {pmid} coded both {} and {code}",
                        existing.get()
                    ),
                });
            }
        }
    }

    Ok(codes)
}
