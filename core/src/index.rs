use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Externally assigned, opaque document identifier.
pub type DocId = String;

/// Per-(field, term) posting: doc id to the ascending positions at which the
/// term occurs in that document's field token sequence.
pub type Posting = BTreeMap<DocId, Vec<u32>>;

/// Multi-field positional inverted index: `field -> term -> doc -> positions`.
///
/// Populated additively; empty postings are never stored. Re-adding a
/// document's tokens duplicates its positions, so callers must start from a
/// fresh index (or a fresh document) rather than re-index in place.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PositionalIndex {
    fields: HashMap<String, HashMap<String, Posting>>,
}

impl PositionalIndex {
    pub fn new() -> Self {
        PositionalIndex::default()
    }

    /// Append one field's token sequence for a document: token at position
    /// `i` is recorded as an occurrence of that term at `i`.
    pub fn add_tokens(&mut self, doc_id: &str, field: &str, tokens: &[String]) {
        if tokens.is_empty() {
            return;
        }
        let terms = self.fields.entry(field.to_string()).or_default();
        for (pos, token) in tokens.iter().enumerate() {
            terms
                .entry(token.clone())
                .or_default()
                .entry(doc_id.to_string())
                .or_default()
                .push(pos as u32);
        }
    }

    /// Extend a posting with already-materialized positions; used by the
    /// codec when merging a persisted index in.
    pub(crate) fn merge_positions(
        &mut self,
        field: &str,
        term: &str,
        doc_id: &str,
        positions: Vec<u32>,
    ) {
        if positions.is_empty() {
            return;
        }
        self.fields
            .entry(field.to_string())
            .or_default()
            .entry(term.to_string())
            .or_default()
            .entry(doc_id.to_string())
            .or_default()
            .extend(positions);
    }

    /// The posting for a (field, term), if any occurrence was indexed.
    pub fn postings(&self, field: &str, term: &str) -> Option<&Posting> {
        self.fields.get(field)?.get(term)
    }

    /// Count of distinct documents containing the term in the field.
    pub fn document_frequency(&self, field: &str, term: &str) -> usize {
        self.postings(field, term).map_or(0, |p| p.len())
    }

    /// Union of doc ids across every posting; the universe for NOT-negation.
    pub fn all_doc_ids(&self) -> BTreeSet<DocId> {
        let mut ids = BTreeSet::new();
        for terms in self.fields.values() {
            for posting in terms.values() {
                ids.extend(posting.keys().cloned());
            }
        }
        ids
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn terms(&self, field: &str) -> impl Iterator<Item = (&str, &Posting)> {
        self.fields
            .get(field)
            .into_iter()
            .flat_map(|terms| terms.iter().map(|(t, p)| (t.as_str(), p)))
    }

    /// Total distinct (field, term) pairs.
    pub fn term_count(&self) -> usize {
        self.fields.values().map(|terms| terms.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn positions_match_token_order() {
        let mut index = PositionalIndex::new();
        index.add_tokens("d1", "title", &toks(&["blue", "people", "blue"]));
        let posting = index.postings("title", "blue").unwrap();
        assert_eq!(posting.get("d1").unwrap(), &vec![0, 2]);
        let posting = index.postings("title", "people").unwrap();
        assert_eq!(posting.get("d1").unwrap(), &vec![1]);
    }

    #[test]
    fn absent_lookups_are_empty() {
        let index = PositionalIndex::new();
        assert!(index.postings("title", "blue").is_none());
        assert_eq!(index.document_frequency("title", "blue"), 0);
        assert!(index.all_doc_ids().is_empty());
    }

    #[test]
    fn repeated_add_duplicates_positions() {
        let mut index = PositionalIndex::new();
        index.add_tokens("d1", "title", &toks(&["blue"]));
        index.add_tokens("d1", "title", &toks(&["blue"]));
        let posting = index.postings("title", "blue").unwrap();
        assert_eq!(posting.get("d1").unwrap(), &vec![0, 0]);
    }

    #[test]
    fn universe_spans_fields() {
        let mut index = PositionalIndex::new();
        index.add_tokens("d1", "title", &toks(&["blue"]));
        index.add_tokens("d2", "plot", &toks(&["red"]));
        let ids: Vec<_> = index.all_doc_ids().into_iter().collect();
        assert_eq!(ids, vec!["d1".to_string(), "d2".to_string()]);
        assert_eq!(index.term_count(), 2);
    }

    #[test]
    fn document_frequency_counts_docs_not_occurrences() {
        let mut index = PositionalIndex::new();
        index.add_tokens("d1", "plot", &toks(&["blue", "blue", "blue"]));
        index.add_tokens("d2", "plot", &toks(&["blue"]));
        assert_eq!(index.document_frequency("plot", "blue"), 2);
    }
}
