use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::Utc;
use rusqlite::Connection;
use tracing::info;

use crate::cli::ExportArgs;
use crate::model::{CodeCounts, ExportQuery, ExportRunManifest};
use crate::store::open_connection;
use crate::triage::{ScoreQuery, with_aggregated_scores};
use crate::util::{
    ensure_parent_directory, now_utc_string, sha256_file, utc_compact_string, write_json_pretty,
};

#[derive(Debug, Default)]
struct ExportCounts {
    exported: usize,
    skipped: usize,
    codes: CodeCounts,
}

pub fn run(db_path: &Path, args: ExportArgs) -> Result<()> {
    if !db_path.exists() {
        bail!("database file missing: {}", db_path.display());
    }

    let started_ts = Utc::now();
    let run_id = format!("export-{}", utc_compact_string(started_ts));
    let manifest_path = args
        .manifest_path
        .clone()
        .unwrap_or_else(|| default_manifest_path(&args.output));

    let connection = open_connection(db_path)?;

    let query = ScoreQuery {
        target_corpus: args.target_corpus.clone(),
        triage_corpus: args.triage_corpus.clone(),
        skip_unknown: args.skip_unknown,
    };

    info!(
        run_id = %run_id,
        target_corpus = %query.target_corpus,
        triage_corpus = %query.triage_corpus.as_deref().unwrap_or("<all>"),
        skip_unknown = query.skip_unknown,
        "starting export"
    );

    ensure_parent_directory(&args.output)?;
    let file = File::create(&args.output)
        .with_context(|| format!("failed to create {}", args.output.display()))?;
    let mut writer = BufWriter::new(file);
    let counts = write_labels(&connection, &query, args.with_text, &mut writer)
        .with_context(|| format!("failed to export labels to {}", args.output.display()))?;
    writer
        .flush()
        .with_context(|| format!("failed to flush {}", args.output.display()))?;
    drop(writer);

    let manifest = ExportRunManifest {
        manifest_version: 1,
        run_id,
        generated_at: now_utc_string(),
        db_path: db_path.display().to_string(),
        export_path: args.output.display().to_string(),
        query: ExportQuery {
            target_corpus: args.target_corpus,
            triage_corpus: args.triage_corpus,
            skip_unknown: args.skip_unknown,
            with_text: args.with_text,
        },
        documents_exported: counts.exported,
        groups_skipped: counts.skipped,
        counts: counts.codes,
        sha256: sha256_file(&args.output)?,
    };
    write_json_pretty(&manifest_path, &manifest)?;

    info!(
        path = %args.output.display(),
        manifest = %manifest_path.display(),
        documents = counts.exported,
        skipped = counts.skipped,
        in_count = counts.codes.in_count,
        out_count = counts.codes.out_count,
        unknown_count = counts.codes.unknown_count,
        "export completed"
    );
    Ok(())
}

fn default_manifest_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "labels".to_string());
    output.with_file_name(format!("{stem}.manifest.json"))
}

fn write_labels<W: Write>(
    connection: &Connection,
    query: &ScoreQuery,
    with_text: bool,
    out: &mut W,
) -> Result<ExportCounts> {
    with_aggregated_scores(connection, query, |scores| {
        let mut counts = ExportCounts::default();
        for score in scores.by_ref() {
            let mut score = score?;
            if with_text {
                score.text.get_or_insert_with(String::new);
            } else {
                score.text = None;
            }
            serde_json::to_writer(&mut *out, &score).with_context(|| {
                format!("failed to serialize document {}", score.document_id)
            })?;
            out.write_all(b"\n")?;
            counts.exported += 1;
            counts.codes.record(score.code);
        }
        counts.skipped = scores.skipped();
        Ok(counts)
    })
}
