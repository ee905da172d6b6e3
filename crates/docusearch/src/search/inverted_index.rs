use std::collections::{HashMap, HashSet};

use crate::search::document::DocumentId;

/// One occurrence of a term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Posting {
    pub doc_id: DocumentId,
    pub position: usize,
}

/// Term to postings map. Each list is in insertion order: documents in the
/// order they were indexed, ascending position within a document.
#[derive(Debug, Default)]
pub struct InvertedIndex {
    postings: HashMap<String, Vec<Posting>>,
    total_postings: usize,
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one posting per token, using the token's ordinal as position.
    pub fn add_document(&mut self, doc_id: DocumentId, tokens: &[String]) {
        for (position, token) in tokens.iter().enumerate() {
            self.postings
                .entry(token.clone())
                .or_default()
                .push(Posting { doc_id, position });
        }
        self.total_postings += tokens.len();
    }

    pub fn postings(&self, term: &str) -> &[Posting] {
        self.postings.get(term).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Drops every posting of the given documents; terms left without
    /// postings disappear from the index.
    pub fn remove_documents(&mut self, doc_ids: &HashSet<DocumentId>) {
        if doc_ids.is_empty() {
            return;
        }
        let mut removed = 0;
        self.postings.retain(|_, list| {
            let before = list.len();
            list.retain(|posting| !doc_ids.contains(&posting.doc_id));
            removed += before - list.len();
            !list.is_empty()
        });
        self.total_postings -= removed;
    }

    /// Number of distinct terms.
    pub fn term_count(&self) -> usize {
        self.postings.len()
    }

    pub fn posting_count(&self) -> usize {
        self.total_postings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_postings_keep_insertion_order() {
        let mut index = InvertedIndex::new();
        index.add_document(DocumentId(0), &tokens(&["a", "b", "a"]));
        index.add_document(DocumentId(1), &tokens(&["a"]));

        assert_eq!(
            index.postings("a"),
            &[
                Posting { doc_id: DocumentId(0), position: 0 },
                Posting { doc_id: DocumentId(0), position: 2 },
                Posting { doc_id: DocumentId(1), position: 0 },
            ]
        );
        assert_eq!(index.term_count(), 2);
        assert_eq!(index.posting_count(), 4);
        assert!(index.postings("zzz").is_empty());
    }

    #[test]
    fn test_remove_documents_purges_terms() {
        let mut index = InvertedIndex::new();
        index.add_document(DocumentId(0), &tokens(&["shared", "only0"]));
        index.add_document(DocumentId(1), &tokens(&["shared"]));

        index.remove_documents(&HashSet::from([DocumentId(0)]));

        assert!(index.postings("only0").is_empty());
        assert_eq!(index.postings("shared").len(), 1);
        assert_eq!(index.term_count(), 1);
        assert_eq!(index.posting_count(), 1);
    }
}
