pub mod document;
pub mod index;
pub mod inverted_index;
pub mod snippet;
pub mod tokenizer;

pub use document::{Author, AuthorName, DocumentId, IndexedDocument, NOT_FOUND};
pub use index::{IndexStats, ScoredDocument, SearchIndex};
pub use inverted_index::{InvertedIndex, Posting};
pub use snippet::extract_snippet;
pub use tokenizer::tokenize;
