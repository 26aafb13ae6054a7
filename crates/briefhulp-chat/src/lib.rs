//! LLM access and everything that is said to it: provider config and
//! streaming clients, the Dutch prompt templates, parsing of the explain
//! markers, and the reply-letter kinds and tones.

pub mod analysis;
pub mod config;
pub mod letter;
pub mod prompts;
pub mod providers;
pub mod types;

pub use analysis::{parse_explanation, LetterAnalysis, ParsedExplanation, SuggestedAction};
pub use config::LLMConfig;
pub use letter::{DraftPrefill, DraftRequest, LetterKind, Tone};
pub use prompts::ReferenceExample;
pub use providers::{complete, stream_llm, test_api_key, BoxedStream, LlmRequest, StreamChunk};
pub use types::*;
