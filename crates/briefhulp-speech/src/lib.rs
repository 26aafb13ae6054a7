//! Briefhulp Speech: reads explanations aloud.
//!
//! Explanations are markdown with icon bullets. Before synthesis the text is
//! cleaned so the voice does not read out asterisks or emoji names, then
//! split into pieces short enough for the TTS endpoint.

pub mod clean;
pub mod synth;

pub use clean::{clean_for_speech, split_for_speech, MAX_PIECE_CHARS};
pub use synth::SpeechSynthesizer;
