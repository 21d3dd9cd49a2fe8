use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use cinefind_core::document::{load_docs, save_docs};
use cinefind_core::{
    Analyzer, AnalyzerConfig, DocStore, IndexCodec, MovieRecord, PositionalIndex, SearchConfig,
};

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "cinefind-indexer")]
#[command(about = "Build and maintain the movie inverted index", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index movie records from JSON/JSONL files or a directory
    Build {
        /// Input path (file or directory)
        #[arg(long)]
        input: String,
        /// Index file; repeated builds append, so a record must only ever
        /// be indexed once per file
        #[arg(long, default_value = "index.txt")]
        index: String,
        /// Document metadata store
        #[arg(long, default_value = "docs.json")]
        docs: String,
        /// Keep stopwords in the token stream
        #[arg(long, default_value_t = false)]
        keep_stopwords: bool,
        /// Skip stemming
        #[arg(long, default_value_t = false)]
        no_stem: bool,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            input,
            index,
            docs,
            keep_stopwords,
            no_stem,
        } => build(&input, &index, &docs, keep_stopwords, no_stem),
    }
}

fn build(
    input: &str,
    index_path: &str,
    docs_path: &str,
    keep_stopwords: bool,
    no_stem: bool,
) -> Result<()> {
    let analyzer = Analyzer::new(AnalyzerConfig {
        remove_stopwords: !keep_stopwords,
        stem: !no_stem,
        stopwords: None,
    });

    let files = collect_files(Path::new(input))?;
    anyhow::ensure!(!files.is_empty(), "no .json or .jsonl files under {input}");

    let mut index = PositionalIndex::new();
    let mut store = if Path::new(docs_path).exists() {
        load_docs(docs_path).with_context(|| format!("reading existing store {docs_path}"))?
    } else {
        DocStore::new()
    };

    let mut num_records = 0usize;
    for file in &files {
        let records = read_records(file).with_context(|| format!("reading {}", file.display()))?;
        tracing::info!(file = %file.display(), records = records.len(), "ingesting");
        for record in records {
            if store.contains_key(&record.id) {
                tracing::warn!(
                    id = %record.id,
                    "record already in store; re-indexing duplicates positions"
                );
            }
            for (field, tokens) in record.field_tokens(&analyzer) {
                index.add_tokens(&record.id, field, &tokens);
            }
            store.insert(record.id.clone(), record);
            num_records += 1;
        }
    }

    let codec = IndexCodec::new(&SearchConfig::default());
    codec
        .save(&index, index_path)
        .with_context(|| format!("appending index to {index_path}"))?;
    save_docs(docs_path, &store).with_context(|| format!("writing store {docs_path}"))?;

    tracing::info!(
        num_records,
        num_terms = index.term_count(),
        index = index_path,
        docs = docs_path,
        "index build complete"
    );
    Ok(())
}

fn collect_files(input: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).into_iter().filter_map(|e| e.ok()) {
            let path = entry.path();
            if path.is_file()
                && matches!(
                    path.extension().and_then(|e| e.to_str()),
                    Some("json") | Some("jsonl")
                )
            {
                files.push(path.to_path_buf());
            }
        }
        files.sort();
    } else if input.is_file() {
        files.push(input.to_path_buf());
    }
    Ok(files)
}

/// A `.json` file holds one record or an array of records; a `.jsonl` file
/// holds one record per line, blank lines skipped.
fn read_records(path: &Path) -> Result<Vec<MovieRecord>> {
    if path.extension().and_then(|e| e.to_str()) == Some("jsonl") {
        let reader = BufReader::new(File::open(path)?);
        let mut records = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str(&line)?);
        }
        return Ok(records);
    }
    let reader = BufReader::new(File::open(path)?);
    let value: serde_json::Value = serde_json::from_reader(reader)?;
    match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(Into::into))
            .collect(),
        other => Ok(vec![serde_json::from_value(other)?]),
    }
}
