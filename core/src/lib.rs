pub mod document;
pub mod offsets;
pub mod paths;
pub mod postings;
pub mod tokenizer;

pub use paths::IndexPaths;
pub use postings::{DecodeError, DocId, Posting};
