use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::model::CorpusKind;

#[derive(Parser, Debug)]
#[command(
    name = "triage",
    version,
    about = "Triage score aggregation and assignment over a citation database"
)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        env = "TRIAGE_DB_PATH",
        default_value = ".cache/triage/triage.sqlite"
    )]
    pub db_path: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create or upgrade the database schema.
    Init,
    /// Register a triage or target corpus.
    AddCorpus(AddCorpusArgs),
    /// Assign codes from a `pmid code` list to documents of a target corpus.
    Assign(AssignArgs),
    /// Remove every score and feature of a triage/target corpus pair.
    DeleteScores(DeleteScoresArgs),
    /// Write one aggregated label per document as JSON Lines.
    Export(ExportArgs),
    Status(StatusArgs),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CorpusKindArg {
    Triage,
    Target,
}

impl From<CorpusKindArg> for CorpusKind {
    fn from(value: CorpusKindArg) -> Self {
        match value {
            CorpusKindArg::Triage => CorpusKind::Triage,
            CorpusKindArg::Target => CorpusKind::Target,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct AddCorpusArgs {
    #[arg(long, value_enum)]
    pub kind: CorpusKindArg,

    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub owner: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct AssignArgs {
    #[arg(long)]
    pub triage_corpus: String,

    #[arg(long)]
    pub target_corpus: String,

    #[arg(long)]
    pub code_list: PathBuf,

    #[arg(long, default_value_t = false)]
    pub replace: bool,
}

#[derive(Args, Debug, Clone)]
pub struct DeleteScoresArgs {
    #[arg(long)]
    pub triage_corpus: String,

    #[arg(long)]
    pub target_corpus: String,
}

#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    #[arg(long)]
    pub target_corpus: String,

    #[arg(long)]
    pub triage_corpus: Option<String>,

    #[arg(long, default_value_t = false)]
    pub skip_unknown: bool,

    #[arg(long, default_value_t = false)]
    pub with_text: bool,

    #[arg(long)]
    pub output: PathBuf,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long)]
    pub target_corpus: Option<String>,

    #[arg(long)]
    pub triage_corpus: Option<String>,
}
