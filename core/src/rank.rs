use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use crate::analyzer::Analyzer;
use crate::index::{DocId, PositionalIndex};

/// Ranker input, distinct from the index: each document's full token
/// sequence, used only for document-local term frequency.
pub type Corpus = HashMap<DocId, Vec<String>>;

/// TF-IDF ranked retrieval over the flattened index.
///
/// Weights are precomputed once per corpus: `(1 + log10(tf)) * log10(N/df)`,
/// with df counted over the union of fields (the ranked view collapses the
/// multi-field index) and zero idf for unindexed terms. Documents in the
/// corpus but absent from the index score zero, they are not an error.
pub struct Ranker {
    weights: HashMap<DocId, HashMap<String, f64>>,
    term_docs: HashMap<String, BTreeSet<DocId>>,
}

impl Ranker {
    pub fn new(index: &PositionalIndex, corpus: &Corpus) -> Self {
        let mut term_docs: HashMap<String, BTreeSet<DocId>> = HashMap::new();
        for field in index.fields() {
            for (term, posting) in index.terms(field) {
                term_docs
                    .entry(term.to_string())
                    .or_default()
                    .extend(posting.keys().cloned());
            }
        }

        let n = corpus.len() as f64;
        let mut weights: HashMap<DocId, HashMap<String, f64>> = HashMap::new();
        for (doc_id, tokens) in corpus {
            let mut tf: HashMap<&str, u32> = HashMap::new();
            for token in tokens {
                *tf.entry(token.as_str()).or_insert(0) += 1;
            }
            let doc_weights = tf
                .into_iter()
                .map(|(term, count)| {
                    let df = term_docs.get(term).map_or(0, BTreeSet::len);
                    let idf = if df > 0 { (n / df as f64).log10() } else { 0.0 };
                    let weight = (1.0 + f64::from(count).log10()) * idf;
                    (term.to_string(), weight)
                })
                .collect();
            weights.insert(doc_id.clone(), doc_weights);
        }
        tracing::debug!(
            docs = corpus.len(),
            terms = term_docs.len(),
            "term weights precomputed"
        );
        Ranker { weights, term_docs }
    }

    /// Score a free-text query against the whole corpus. Results are ordered
    /// score-descending, doc id ascending on ties. Terms absent from the
    /// index contribute nothing.
    pub fn score(&self, analyzer: &Analyzer, query: &str) -> Vec<(DocId, f64)> {
        let mut scores: HashMap<DocId, f64> = HashMap::new();
        for term in analyzer.normalize(Some(query)) {
            let Some(docs) = self.term_docs.get(&term) else {
                continue;
            };
            for doc_id in docs {
                let weight = self
                    .weights
                    .get(doc_id)
                    .and_then(|w| w.get(&term))
                    .copied()
                    .unwrap_or(0.0);
                *scores.entry(doc_id.clone()).or_insert(0.0) += weight;
            }
        }
        let mut ranked: Vec<(DocId, f64)> = scores.into_iter().collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        ranked
    }

    /// [`Ranker::score`] truncated to the best `limit` documents.
    pub fn score_top(&self, analyzer: &Analyzer, query: &str, limit: usize) -> Vec<(DocId, f64)> {
        let mut ranked = self.score(analyzer, query);
        ranked.truncate(limit);
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn fixture() -> (PositionalIndex, Corpus) {
        let mut index = PositionalIndex::new();
        index.add_tokens("d1", "plot", &toks(&["blue", "people", "blue"]));
        index.add_tokens("d2", "plot", &toks(&["red", "people"]));
        let corpus: Corpus = [
            ("d1".to_string(), toks(&["blue", "people", "blue"])),
            ("d2".to_string(), toks(&["red", "people"])),
        ]
        .into_iter()
        .collect();
        (index, corpus)
    }

    #[test]
    fn exclusive_term_ranks_its_document_first() {
        let (index, corpus) = fixture();
        let ranker = Ranker::new(&index, &corpus);
        let ranked = ranker.score(&Analyzer::plain(), "blue");
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].0, "d1");
        // tf 2, df 1, N 2: (1 + log10 2) * log10 2
        let expected = (1.0 + 2f64.log10()) * 2f64.log10();
        assert!((ranked[0].1 - expected).abs() < 1e-9);
    }

    #[test]
    fn missing_terms_contribute_nothing() {
        let (index, corpus) = fixture();
        let ranker = Ranker::new(&index, &corpus);
        assert!(ranker.score(&Analyzer::plain(), "zebra").is_empty());
        // a present term alongside a missing one scores as the present one
        let with_missing = ranker.score(&Analyzer::plain(), "blue zebra");
        let alone = ranker.score(&Analyzer::plain(), "blue");
        assert_eq!(with_missing, alone);
    }

    #[test]
    fn ubiquitous_terms_have_zero_weight() {
        let (index, corpus) = fixture();
        let ranker = Ranker::new(&index, &corpus);
        // "people" is in both of the two docs, so idf = log10(2/2) = 0
        let ranked = ranker.score(&Analyzer::plain(), "people");
        assert_eq!(ranked.len(), 2);
        assert!(ranked.iter().all(|(_, score)| *score == 0.0));
        // zero scores tie; doc id ascending breaks the tie
        assert_eq!(ranked[0].0, "d1");
        assert_eq!(ranked[1].0, "d2");
    }

    #[test]
    fn limit_truncates_after_ordering() {
        let (index, corpus) = fixture();
        let ranker = Ranker::new(&index, &corpus);
        let top = ranker.score_top(&Analyzer::plain(), "blue people", 1);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].0, "d1");
    }

    #[test]
    fn corpus_doc_missing_from_index_scores_zero() {
        let (index, mut corpus) = fixture();
        corpus.insert("d3".to_string(), toks(&["blue"]));
        let ranker = Ranker::new(&index, &corpus);
        let ranked = ranker.score(&Analyzer::plain(), "blue");
        // d3 has no posting, so it never enters the accumulator
        assert!(ranked.iter().all(|(doc, _)| doc != "d3"));
    }
}
