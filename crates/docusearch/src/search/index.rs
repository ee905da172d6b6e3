//! Keyword search over extracted document metadata.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::RwLock;

use serde::Serialize;

use crate::config::SearchConfig;
use crate::jobs::Metadata;
use crate::search::document::{Author, DocumentId, IndexedDocument};
use crate::search::inverted_index::InvertedIndex;
use crate::search::snippet::extract_snippet;
use crate::search::tokenizer::tokenize;
use crate::sync;

/// Postings before this position earn an extra half point.
const EARLY_POSITION: usize = 100;
const HIT_SCORE: f64 = 1.0;
const EARLY_BONUS: f64 = 0.5;

/// A ranked search hit.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredDocument {
    pub doc_id: DocumentId,
    pub filename: String,
    pub title: String,
    pub file_type: String,
    pub upload_date: String,
    pub author: Vec<Author>,
    pub topic: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub published_date: String,
    pub score: f64,
    pub snippet: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IndexStats {
    pub total_documents: usize,
    pub total_terms: usize,
    pub average_terms_per_doc: f64,
}

#[derive(Default)]
struct IndexState {
    documents: BTreeMap<DocumentId, IndexedDocument>,
    index: InvertedIndex,
    next_id: u64,
}

/// Document table plus inverted index behind one lock, so id assignment,
/// document storage and posting insertion are a single atomic step.
pub struct SearchIndex {
    state: RwLock<IndexState>,
    default_limit: usize,
    max_limit: usize,
    snippet_length: usize,
}

impl SearchIndex {
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            state: RwLock::new(IndexState::default()),
            default_limit: config.default_limit,
            max_limit: config.results_limit,
            snippet_length: config.snippet_length,
        }
    }

    pub fn default_limit(&self) -> usize {
        self.default_limit
    }

    /// Indexes a parsed document and returns its new id.
    pub fn index_document(&self, metadata: &Metadata, filename: &str) -> DocumentId {
        self.insert(metadata, filename, None)
    }

    /// Like [`index_document`](Self::index_document), tagging the document
    /// with the job that produced it.
    pub fn index_job_document(
        &self,
        metadata: &Metadata,
        filename: &str,
        job_id: &str,
    ) -> DocumentId {
        self.insert(metadata, filename, Some(job_id.to_string()))
    }

    fn insert(&self, metadata: &Metadata, filename: &str, job_id: Option<String>) -> DocumentId {
        let _span = tracing::info_span!("search.index", filename).entered();
        let mut state = sync::write(&self.state, "Search index");

        let doc_id = DocumentId(state.next_id);
        state.next_id += 1;

        let document = IndexedDocument::from_metadata(doc_id, job_id, filename, metadata);
        let tokens = tokenize(&document.searchable_text());
        state.index.add_document(doc_id, &tokens);
        state.documents.insert(doc_id, document);

        log::debug!("Indexed {} as {} ({} tokens)", filename, doc_id, tokens.len());
        doc_id
    }

    /// Ranks documents by metadata term hits.
    ///
    /// Each posting of a query token adds 1.0, plus 0.5 when it sits in the
    /// first 100 positions. Ties are broken by ascending document id.
    pub fn search(&self, query: &str, limit: usize) -> Vec<ScoredDocument> {
        let _span = tracing::info_span!("search.query").entered();
        let terms = tokenize(query);
        if terms.is_empty() {
            return Vec::new();
        }
        let limit = limit.min(self.max_limit);

        let state = sync::read(&self.state, "Search index");

        let mut scores: HashMap<DocumentId, f64> = HashMap::new();
        for term in &terms {
            for posting in state.index.postings(term) {
                let score = scores.entry(posting.doc_id).or_insert(0.0);
                *score += HIT_SCORE;
                if posting.position < EARLY_POSITION {
                    *score += EARLY_BONUS;
                }
            }
        }

        let mut ranked: Vec<(DocumentId, f64)> =
            scores.into_iter().filter(|(_, score)| *score > 0.0).collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        ranked.truncate(limit);

        ranked
            .into_iter()
            .filter_map(|(doc_id, score)| {
                let document = state.documents.get(&doc_id)?;
                let snippet =
                    extract_snippet(&document.searchable_text(), &terms, self.snippet_length);
                Some(ScoredDocument {
                    doc_id,
                    filename: document.filename.clone(),
                    title: document.display_title().to_string(),
                    file_type: document.file_type.clone(),
                    upload_date: document.upload_date.clone(),
                    author: document.author.clone(),
                    topic: document.topic.clone(),
                    abstract_text: document.abstract_text.clone(),
                    published_date: document.published_date.clone(),
                    score,
                    snippet,
                })
            })
            .collect()
    }

    pub fn document(&self, doc_id: DocumentId) -> Option<IndexedDocument> {
        sync::read(&self.state, "Search index")
            .documents
            .get(&doc_id)
            .cloned()
    }

    /// Removes every document indexed under `job_id`. Returns how many.
    pub fn remove_job_documents(&self, job_id: &str) -> usize {
        let mut state = sync::write(&self.state, "Search index");
        let doomed: HashSet<DocumentId> = state
            .documents
            .values()
            .filter(|doc| doc.job_id.as_deref() == Some(job_id))
            .map(|doc| doc.doc_id)
            .collect();

        state.documents.retain(|id, _| !doomed.contains(id));
        state.index.remove_documents(&doomed);

        if !doomed.is_empty() {
            log::info!("Removed {} indexed documents of job {}", doomed.len(), job_id);
        }
        doomed.len()
    }

    pub fn get_document_count(&self) -> usize {
        sync::read(&self.state, "Search index").documents.len()
    }

    pub fn get_index_stats(&self) -> IndexStats {
        let state = sync::read(&self.state, "Search index");
        let total_documents = state.documents.len();
        let average_terms_per_doc = if total_documents == 0 {
            0.0
        } else {
            state.index.posting_count() as f64 / total_documents as f64
        };
        IndexStats {
            total_documents,
            total_terms: state.index.term_count(),
            average_terms_per_doc,
        }
    }
}
