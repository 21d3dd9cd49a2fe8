use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::config::SearchConfig;
use crate::error::{Result, SearchError};
use crate::index::PositionalIndex;

/// Line-oriented index persistence.
///
/// A term block starts with an unindented `field:term` header; each following
/// tab-indented `\tdoc_id: p1,p2,...` line is one document's ascending
/// position list. The block ends at the next unindented line. A legacy
/// single-field layout writes `term:df` headers instead; the decoder accepts
/// both and files that mix them. Doc ids must not contain `:`.
pub struct IndexCodec {
    known_fields: HashSet<String>,
    legacy_field: String,
}

impl Default for IndexCodec {
    fn default() -> Self {
        IndexCodec::new(&SearchConfig::default())
    }
}

impl IndexCodec {
    pub fn new(config: &SearchConfig) -> Self {
        IndexCodec {
            known_fields: config.fields.iter().cloned().collect(),
            legacy_field: "all".to_string(),
        }
    }

    /// Field name that legacy `term:df` blocks load under.
    pub fn with_legacy_field(mut self, field: impl Into<String>) -> Self {
        self.legacy_field = field.into();
        self
    }

    /// Append the index to `path`, creating the file if needed. Appending is
    /// what lets one index file accumulate several ingestion runs.
    pub fn save(&self, index: &PositionalIndex, path: impl AsRef<Path>) -> Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_ref())?;
        let mut out = BufWriter::new(file);
        for field in index.fields() {
            for (term, posting) in index.terms(field) {
                writeln!(out, "{field}:{term}")?;
                for (doc_id, positions) in posting {
                    let joined = positions
                        .iter()
                        .map(|p| p.to_string())
                        .collect::<Vec<_>>()
                        .join(",");
                    writeln!(out, "\t{doc_id}: {joined}")?;
                }
            }
        }
        out.flush()?;
        tracing::debug!(
            path = %path.as_ref().display(),
            terms = index.term_count(),
            "index appended"
        );
        Ok(())
    }

    /// Load a fresh index from `path`.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<PositionalIndex> {
        let mut index = PositionalIndex::new();
        self.load_into(&mut index, path)?;
        Ok(index)
    }

    /// Merge the file's postings into an existing index. Position lists for
    /// (field, term, doc) combinations present on both sides are extended,
    /// mirroring how repeated ingestion runs accumulate.
    pub fn load_into(&self, index: &mut PositionalIndex, path: impl AsRef<Path>) -> Result<()> {
        let reader = BufReader::new(File::open(path.as_ref())?);
        let mut current: Option<(String, String)> = None;
        let mut header_line = 0usize;
        let mut body_seen = true;
        for (line_no, line) in reader.lines().enumerate() {
            let line_no = line_no + 1;
            let line = line?;
            if line.is_empty() {
                continue;
            }
            if let Some(body) = line.strip_prefix('\t') {
                body_seen = true;
                let (field, term) = current.as_ref().ok_or_else(|| {
                    SearchError::format(line_no, "posting line before any term header")
                })?;
                let (doc_id, positions) = body.split_once(':').ok_or_else(|| {
                    SearchError::format(line_no, "posting line without a doc id separator")
                })?;
                let positions = positions
                    .trim()
                    .split(',')
                    .map(|p| {
                        p.trim().parse::<u32>().map_err(|_| {
                            SearchError::format(line_no, format!("invalid position {p:?}"))
                        })
                    })
                    .collect::<Result<Vec<u32>>>()?;
                index.merge_positions(field, term, doc_id.trim(), positions);
            } else {
                let (left, right) = line
                    .split_once(':')
                    .ok_or_else(|| SearchError::format(line_no, "header without a colon"))?;
                let (left, right) = (left.trim(), right.trim());
                if left.is_empty() || right.is_empty() {
                    return Err(SearchError::format(line_no, "empty header segment"));
                }
                if !body_seen {
                    return Err(SearchError::format(
                        header_line,
                        "term header without postings",
                    ));
                }
                header_line = line_no;
                body_seen = false;
                current = Some(if self.is_legacy_header(left, right) {
                    // `term:df` layout; the stored df is recomputed from the
                    // postings, so it is dropped here.
                    (self.legacy_field.clone(), left.to_string())
                } else {
                    (left.to_string(), right.to_string())
                });
            }
        }
        if !body_seen {
            return Err(SearchError::format(
                header_line,
                "term header without postings",
            ));
        }
        tracing::debug!(
            path = %path.as_ref().display(),
            terms = index.term_count(),
            "index loaded"
        );
        Ok(())
    }

    /// A header reads as legacy `term:df` when the right segment is a bare
    /// count and the left segment is not a configured field name. A known
    /// field keeps `field:term` meaning even for numeric terms like
    /// `title:2001`.
    fn is_legacy_header(&self, left: &str, right: &str) -> bool {
        !right.is_empty()
            && right.bytes().all(|b| b.is_ascii_digit())
            && !self.known_fields.contains(left)
    }
}
