use std::collections::BTreeSet;

use crate::analyzer::Analyzer;
use crate::config::SearchConfig;
use crate::error::Result;
use crate::index::{DocId, PositionalIndex};
use crate::query::{Atom, BoolOp, ParsedQuery, QueryParser};

/// Executes parsed queries against an index. Borrows everything it needs, so
/// building one per query over a stable index is cheap; the index is never
/// mutated during evaluation.
pub struct Searcher<'a> {
    index: &'a PositionalIndex,
    analyzer: &'a Analyzer,
    config: &'a SearchConfig,
    parser: QueryParser,
}

impl<'a> Searcher<'a> {
    pub fn new(index: &'a PositionalIndex, analyzer: &'a Analyzer, config: &'a SearchConfig) -> Self {
        Searcher {
            index,
            analyzer,
            config,
            parser: QueryParser::new(config.clone()),
        }
    }

    /// Parse and evaluate in one step.
    pub fn query(&self, query: &str) -> Result<BTreeSet<DocId>> {
        let parsed = self.parser.parse(query)?;
        tracing::debug!(atoms = parsed.atoms.len(), "evaluating query");
        Ok(self.evaluate(&parsed))
    }

    /// Fold atom result sets strictly left to right: AND intersects, OR
    /// unions, a missing operator (excess atoms) folds as AND.
    pub fn evaluate(&self, parsed: &ParsedQuery) -> BTreeSet<DocId> {
        let mut result: Option<BTreeSet<DocId>> = None;
        for (i, atom) in parsed.atoms.iter().enumerate() {
            let docs = self.resolve(atom);
            result = Some(match result {
                None => docs,
                Some(acc) => match parsed.operators.get(i - 1) {
                    Some(BoolOp::Or) => acc.union(&docs).cloned().collect(),
                    _ => acc.intersection(&docs).cloned().collect(),
                },
            });
        }
        result.unwrap_or_default()
    }

    fn resolve(&self, atom: &Atom) -> BTreeSet<DocId> {
        match atom {
            Atom::Term { field, text } => self.term_docs(field.as_deref(), text),
            Atom::Not(inner) => {
                let matched = self.resolve(inner);
                self.index
                    .all_doc_ids()
                    .difference(&matched)
                    .cloned()
                    .collect()
            }
            Atom::Phrase { field, text } => self.phrase(field.as_deref(), text),
            Atom::Proximity {
                distance,
                left,
                right,
            } => self.proximity(left, right, *distance),
        }
    }

    /// Fields an atom applies to: its qualifier, or every configured field.
    fn fields_for<'b>(&'b self, field: Option<&'b str>) -> Vec<&'b str> {
        match field {
            Some(f) => vec![f],
            None => self.config.fields.iter().map(String::as_str).collect(),
        }
    }

    /// Documents containing any token the text normalizes to, in any of the
    /// applicable fields.
    fn term_docs(&self, field: Option<&str>, text: &str) -> BTreeSet<DocId> {
        let terms = self.analyzer.normalize(Some(text));
        let mut docs = BTreeSet::new();
        for field in self.fields_for(field) {
            for term in &terms {
                if let Some(posting) = self.index.postings(field, term) {
                    docs.extend(posting.keys().cloned());
                }
            }
        }
        docs
    }

    /// Consecutive-position phrase match, anchored on the first term's
    /// postings. Unqualified phrases union their per-field matches.
    pub fn phrase(&self, field: Option<&str>, text: &str) -> BTreeSet<DocId> {
        let terms = self.analyzer.normalize(Some(text));
        let mut docs = BTreeSet::new();
        if terms.is_empty() {
            return docs;
        }
        for field in self.fields_for(field) {
            self.phrase_in_field(field, &terms, &mut docs);
        }
        docs
    }

    fn phrase_in_field(&self, field: &str, terms: &[String], out: &mut BTreeSet<DocId>) {
        let Some(first) = self.index.postings(field, &terms[0]) else {
            return;
        };
        for (doc_id, positions) in first {
            let hit = positions.iter().any(|&start| {
                terms[1..].iter().enumerate().all(|(offset, term)| {
                    self.index
                        .postings(field, term)
                        .and_then(|posting| posting.get(doc_id))
                        .is_some_and(|ps| ps.binary_search(&(start + offset as u32 + 1)).is_ok())
                })
            });
            if hit {
                out.insert(doc_id.clone());
            }
        }
    }

    /// Undirected proximity: both terms occur within `max_distance`
    /// positions of each other in the same field of the same document.
    pub fn proximity(&self, left: &str, right: &str, max_distance: u32) -> BTreeSet<DocId> {
        let mut docs = BTreeSet::new();
        let (Some(left), Some(right)) = (self.first_token(left), self.first_token(right)) else {
            return docs;
        };
        for field in self.fields_for(None) {
            let (Some(lp), Some(rp)) = (
                self.index.postings(field, &left),
                self.index.postings(field, &right),
            ) else {
                continue;
            };
            for (doc_id, left_positions) in lp {
                let Some(right_positions) = rp.get(doc_id) else {
                    continue;
                };
                let near = left_positions.iter().any(|&p1| {
                    right_positions
                        .iter()
                        .any(|&p2| p1.abs_diff(p2) <= max_distance)
                });
                if near {
                    docs.insert(doc_id.clone());
                }
            }
        }
        docs
    }

    /// Normalization may split a term; proximity takes the first produced
    /// token.
    fn first_token(&self, text: &str) -> Option<String> {
        self.analyzer.normalize(Some(text)).into_iter().next()
    }
}
