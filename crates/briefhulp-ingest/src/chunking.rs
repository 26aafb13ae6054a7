//! Recursive character chunking of example letters.
//!
//! 512 chars is roughly the 256-token window of all-MiniLM-L6-v2.

/// Default chunk size in bytes of UTF-8 text.
pub const DEFAULT_CHUNK_SIZE: usize = 512;

/// A chunk with its byte range in the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    pub text: String,
    pub chunk_index: usize,
    pub start_char: usize,
    pub end_char: usize,
}

/// Splits on paragraph breaks first, then lines, sentences and words,
/// falling back to a hard cut for unbroken runs.
pub struct RecursiveChunker {
    pub chunk_size: usize,
    separators: Vec<&'static str>,
}

impl Default for RecursiveChunker {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl RecursiveChunker {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            separators: vec!["\n\n", "\n", ". ", " "],
        }
    }

    pub fn chunk(&self, text: &str) -> Vec<TextChunk> {
        let pieces = self.split_text(text, &self.separators);
        let mut result = Vec::with_capacity(pieces.len());
        let mut cursor = 0;

        for piece in pieces {
            // Every piece is a contiguous slice of `text`, in order
            let start = text[cursor..]
                .find(piece.as_str())
                .map(|i| cursor + i)
                .unwrap_or(cursor);
            let end = start + piece.len();
            cursor = end;

            if piece.trim().is_empty() {
                continue;
            }
            result.push(TextChunk {
                text: piece,
                chunk_index: result.len(),
                start_char: start,
                end_char: end,
            });
        }
        result
    }

    fn split_text(&self, text: &str, separators: &[&'static str]) -> Vec<String> {
        if text.len() <= self.chunk_size {
            return vec![text.to_string()];
        }
        let Some((&separator, remaining)) = separators.split_first() else {
            return self.hard_split(text);
        };

        let mut chunks = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        let mut current_size = 0usize;

        for split in text.split(separator) {
            let added = if current.is_empty() {
                split.len()
            } else {
                split.len() + separator.len()
            };

            if split.len() > self.chunk_size {
                if !current.is_empty() {
                    chunks.push(current.join(separator));
                    current.clear();
                    current_size = 0;
                }
                chunks.extend(self.split_text(split, remaining));
            } else if current_size + added > self.chunk_size && !current.is_empty() {
                chunks.push(current.join(separator));
                current = vec![split];
                current_size = split.len();
            } else {
                current.push(split);
                current_size += added;
            }
        }

        if !current.is_empty() {
            chunks.push(current.join(separator));
        }
        chunks
    }

    /// Cut at `chunk_size` bytes, backing off to a char boundary.
    fn hard_split(&self, text: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut rest = text;
        while !rest.is_empty() {
            let mut cut = self.chunk_size.min(rest.len());
            while !rest.is_char_boundary(cut) {
                cut -= 1;
            }
            if cut == 0 {
                // chunk_size smaller than one char
                cut = rest.chars().next().map(char::len_utf8).unwrap_or(rest.len());
            }
            out.push(rest[..cut].to_string());
            rest = &rest[cut..];
        }
        out
    }
}
