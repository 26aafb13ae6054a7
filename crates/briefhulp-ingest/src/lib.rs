//! Briefhulp Ingest: turning uploads into text and filling the example corpus.

pub mod catalog;
pub mod chunking;
pub mod file;
pub mod ingest;
pub mod ocr;
pub mod samples;

pub use catalog::LetterOrigin;
pub use chunking::{RecursiveChunker, TextChunk};
pub use file::{decode_text, FileKind};
pub use ingest::{content_hash, IngestReport, Ingester};
pub use ocr::TextExtractor;
