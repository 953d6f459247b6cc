use crate::store::DocumentStore;
use crate::tokenizer::tokenize;
use crate::DocId;
use anyhow::Result;
use std::collections::{BTreeMap, HashSet};

/// Term -> posting list. A posting list holds each document id at most once, in the
/// order the documents were added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvertedIndex {
    postings: BTreeMap<String, Vec<DocId>>,
    num_docs: u32,
}

impl InvertedIndex {
    pub fn new() -> Self { Self::default() }

    pub(crate) fn from_parts(postings: BTreeMap<String, Vec<DocId>>, num_docs: u32) -> Self {
        Self { postings, num_docs }
    }

    pub(crate) fn postings_map(&self) -> &BTreeMap<String, Vec<DocId>> { &self.postings }

    pub fn postings(&self, term: &str) -> Option<&[DocId]> {
        self.postings.get(term).map(Vec::as_slice)
    }

    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.postings.keys().map(String::as_str)
    }

    pub fn num_terms(&self) -> usize { self.postings.len() }

    /// Number of documents the index was built from.
    pub fn num_docs(&self) -> u32 { self.num_docs }

    pub fn is_empty(&self) -> bool { self.postings.is_empty() }
}

/// One-shot batch construction of an [`InvertedIndex`].
#[derive(Default)]
pub struct IndexBuilder {
    postings: BTreeMap<String, Vec<DocId>>,
    seen_docs: HashSet<DocId>,
}

impl IndexBuilder {
    pub fn new() -> Self { Self::default() }

    /// Record presence of every term of `text` for `doc_id`. Term frequency is not
    /// kept; adding the same document twice has no further effect.
    pub fn add_document(&mut self, doc_id: DocId, text: &str) {
        if !self.seen_docs.insert(doc_id) {
            return;
        }
        let mut seen_in_doc: HashSet<String> = HashSet::new();
        for term in tokenize(text) {
            if seen_in_doc.contains(&term) {
                continue;
            }
            self.postings.entry(term.clone()).or_default().push(doc_id);
            seen_in_doc.insert(term);
        }
    }

    pub fn finish(self) -> InvertedIndex {
        InvertedIndex { postings: self.postings, num_docs: self.seen_docs.len() as u32 }
    }
}

/// Build an index over every document currently in `store`. Must run after crawling
/// has finished; the store is read once, front to back.
pub fn build_from_store(store: &DocumentStore) -> Result<InvertedIndex> {
    let total = store.len();
    let mut builder = IndexBuilder::new();
    for (i, doc) in store.documents().enumerate() {
        let doc = doc?;
        tracing::debug!(doc_id = doc.id, progress = i + 1, total, "indexing document");
        builder.add_document(doc.id, &doc.text_content);
    }
    let index = builder.finish();
    tracing::info!(num_docs = index.num_docs(), num_terms = index.num_terms(), "index built");
    Ok(index)
}
