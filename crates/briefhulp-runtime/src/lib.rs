//! Runtime orchestrator: the assistant's task verbs.
//!
//! Every verb is one prompt template plus one hosted completion call. The
//! explain verb first retrieves similar example letters from the corpus
//! and passes their summaries along as reference.

pub mod assistant;
pub mod retrieval;
pub mod types;

pub use assistant::Assistant;
pub use retrieval::retrieve_examples;
pub use types::*;
