use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::analyzer::Analyzer;
use crate::error::Result;

/// The movie schema's indexed fields, in order.
pub const MOVIE_FIELDS: [&str; 4] = ["title", "director", "cast", "plot"];

/// One movie record as delivered by the ingestion pipeline. Everything but
/// the id is optional; unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MovieRecord {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub director: Option<String>,
    #[serde(default)]
    pub cast: Vec<String>,
    #[serde(default)]
    pub plot: Option<String>,
}

impl MovieRecord {
    /// Normalized token sequences per field, in schema order. Cast member
    /// names are joined before normalization so the field carries one
    /// positional sequence.
    pub fn field_tokens(&self, analyzer: &Analyzer) -> Vec<(&'static str, Vec<String>)> {
        let cast = self.cast.join(", ");
        let cast_text = (!self.cast.is_empty()).then_some(cast.as_str());
        vec![
            ("title", analyzer.normalize(self.title.as_deref())),
            ("director", analyzer.normalize(self.director.as_deref())),
            ("cast", analyzer.normalize(cast_text)),
            ("plot", analyzer.normalize(self.plot.as_deref())),
        ]
    }

    /// Every field's tokens flattened into one sequence, the shape the
    /// ranker's corpus wants.
    pub fn corpus_tokens(&self, analyzer: &Analyzer) -> Vec<String> {
        self.field_tokens(analyzer)
            .into_iter()
            .flat_map(|(_, tokens)| tokens)
            .collect()
    }
}

/// Document metadata store, keyed by record id.
pub type DocStore = BTreeMap<String, MovieRecord>;

pub fn save_docs(path: impl AsRef<Path>, docs: &DocStore) -> Result<()> {
    let file = File::create(path.as_ref())?;
    serde_json::to_writer_pretty(BufWriter::new(file), docs)?;
    Ok(())
}

pub fn load_docs(path: impl AsRef<Path>) -> Result<DocStore> {
    let file = File::open(path.as_ref())?;
    let docs = serde_json::from_reader(BufReader::new(file))?;
    Ok(docs)
}
