use crate::persist::load_index;
use crate::store::DocumentStore;
use crate::tokenizer::tokenize;
use crate::{DocId, InvertedIndex};
use anyhow::Result;
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

const SNIPPET_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub doc_id: DocId,
    pub score: u32,
    pub url: String,
    pub snippet: String,
}

/// Boolean-AND retrieval over a loaded, read-only index. Cloning is cheap and
/// clones share the same index.
#[derive(Clone)]
pub struct SearchEngine {
    index: Arc<InvertedIndex>,
    store: DocumentStore,
}

impl SearchEngine {
    pub fn new(index: InvertedIndex, store: DocumentStore) -> Self {
        Self { index: Arc::new(index), store }
    }

    /// Open the store and load the index. A missing or malformed index fails here;
    /// there is no fallback to an empty one.
    pub fn open(db_path: &Path, index_path: &Path) -> Result<Self> {
        let index = load_index(index_path)?;
        let store = DocumentStore::open(db_path)?;
        tracing::info!(num_terms = index.num_terms(), num_docs = index.num_docs(), "search engine ready");
        Ok(Self::new(index, store))
    }

    pub fn index(&self) -> &InvertedIndex { &self.index }

    pub fn store(&self) -> &DocumentStore { &self.store }

    /// Ids of the documents containing every query term, ascending. Empty when the
    /// query has no terms or any term is missing from the index.
    pub fn candidates(&self, query: &str) -> Vec<DocId> {
        let mut ids: Vec<DocId> = intersect(&self.index, &tokenize(query)).into_iter().collect();
        ids.sort_unstable();
        ids
    }

    /// Run `query` and return hits ranked by score, ties by ascending document id.
    ///
    /// The score is the number of query terms. Every candidate of an AND query
    /// contains all of them, so all hits share the same score and the order is in
    /// effect the id order.
    pub fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        let terms = tokenize(query);
        if terms.is_empty() {
            return Ok(Vec::new());
        }
        let candidates = intersect(&self.index, &terms);

        let mut scored: Vec<(DocId, u32)> = candidates
            .into_iter()
            .map(|doc_id| (doc_id, score(&self.index, &terms, doc_id)))
            .collect();
        scored.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        let mut hits = Vec::with_capacity(scored.len());
        for (doc_id, score) in scored {
            match self.store.get(doc_id)? {
                Some(doc) => hits.push(SearchHit {
                    doc_id,
                    score,
                    url: doc.url,
                    snippet: snippet(&doc.text_content),
                }),
                None => tracing::warn!(doc_id, "indexed document missing from store"),
            }
        }
        Ok(hits)
    }
}

fn intersect(index: &InvertedIndex, terms: &[String]) -> HashSet<DocId> {
    let Some((first, rest)) = terms.split_first() else {
        return HashSet::new();
    };
    let mut result: HashSet<DocId> = match index.postings(first) {
        Some(list) => list.iter().copied().collect(),
        None => return HashSet::new(),
    };
    for term in rest {
        let Some(list) = index.postings(term) else {
            return HashSet::new();
        };
        let other: HashSet<DocId> = list.iter().copied().collect();
        result.retain(|id| other.contains(id));
        if result.is_empty() {
            break;
        }
    }
    result
}

// One point per query term present in the document. Duplicated query terms count
// once per occurrence in the query.
fn score(index: &InvertedIndex, terms: &[String], doc_id: DocId) -> u32 {
    terms
        .iter()
        .filter(|t| index.postings(t).is_some_and(|list| list.contains(&doc_id)))
        .count() as u32
}

/// First 100 characters of `text`, trimmed, followed by `...`.
pub fn snippet(text: &str) -> String {
    let head: String = text.chars().take(SNIPPET_CHARS).collect();
    format!("{}...", head.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::IndexBuilder;

    fn index_of(docs: &[(DocId, &str)]) -> InvertedIndex {
        let mut b = IndexBuilder::new();
        for (id, text) in docs {
            b.add_document(*id, text);
        }
        b.finish()
    }

    #[test]
    fn intersect_requires_every_term() {
        let idx = index_of(&[(1, "a1 b1"), (2, "a1"), (3, "b1")]);
        let terms = vec!["a1".to_string(), "b1".to_string()];
        assert_eq!(intersect(&idx, &terms), HashSet::from([1]));
    }

    #[test]
    fn unknown_term_empties_the_result() {
        let idx = index_of(&[(1, "a1 b1")]);
        let terms = vec!["a1".to_string(), "zzz".to_string()];
        assert!(intersect(&idx, &terms).is_empty());
        assert!(intersect(&idx, &[]).is_empty());
    }

    #[test]
    fn score_counts_query_terms() {
        let idx = index_of(&[(1, "cats dogs")]);
        let terms = vec!["cats".to_string(), "dogs".to_string(), "cats".to_string()];
        assert_eq!(score(&idx, &terms, 1), 3);
    }

    #[test]
    fn snippet_truncates_by_chars() {
        let long = "é".repeat(150);
        let s = snippet(&long);
        assert_eq!(s.chars().count(), 103);
        assert!(s.ends_with("..."));
        assert_eq!(snippet("  short text  "), "short text...");
    }
}
