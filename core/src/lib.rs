pub mod index;
pub mod persist;
pub mod search;
pub mod store;
pub mod tokenizer;

pub use index::{IndexBuilder, InvertedIndex};
pub use search::{SearchEngine, SearchHit};
pub use store::{Document, DocumentStore, InsertOutcome};

/// Store-assigned document identifier. Strictly increasing, starting at 1.
pub type DocId = u32;
