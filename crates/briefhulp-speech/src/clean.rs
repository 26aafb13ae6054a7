//! Text preparation for speech.

use once_cell::sync::Lazy;
use regex::Regex;

/// Longest piece the TTS endpoint accepts in one request.
pub const MAX_PIECE_CHARS: usize = 100;

static ICONS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[🏢🎯💰🗓ℹ📅📌✅❌⚠]\x{FE0F}?").expect("valid regex"));
static HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\s*#+\s*").expect("valid regex"));
static BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\s*[*-]\s+").expect("valid regex"));
static SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+").expect("valid regex"));
static BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{2,}").expect("valid regex"));

/// Strip markdown emphasis, headings, bullets and list icons.
pub fn clean_for_speech(text: &str) -> String {
    let text = ICONS.replace_all(text, "");
    let text = text.replace('\u{FE0F}', "");
    let text = HEADING.replace_all(&text, "");
    let text = BULLET.replace_all(&text, "");
    let text = text.replace("**", "").replace('*', "");
    let text = SPACES.replace_all(&text, " ");
    let text = text
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n");
    BLANK_LINES.replace_all(&text, "\n").trim().to_string()
}

/// Split `text` into pieces of at most `max_chars` characters.
///
/// A piece is cut after the last sentence end that fits, otherwise after
/// the last comma, otherwise at the last space. Words longer than
/// `max_chars` are cut hard.
pub fn split_for_speech(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut pieces = Vec::new();
    let mut rest = text.trim();

    while !rest.is_empty() {
        if rest.chars().count() <= max_chars {
            pieces.push(rest.to_string());
            break;
        }

        // Byte index just past the first `max_chars` characters
        let window_end = rest
            .char_indices()
            .nth(max_chars)
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        let window = &rest[..window_end];

        let cut = last_cut_after(window, &['.', '!', '?', '\n', ':', ';'])
            .or_else(|| last_cut_after(window, &[',']))
            .or_else(|| window.rfind(' ').filter(|&i| i > 0))
            .unwrap_or(window_end);

        let piece = rest[..cut].trim();
        if !piece.is_empty() {
            pieces.push(piece.to_string());
        }
        rest = rest[cut..].trim_start();
    }

    pieces
}

/// Byte index just after the last occurrence of any of `marks`.
fn last_cut_after(window: &str, marks: &[char]) -> Option<usize> {
    window
        .char_indices()
        .filter(|(_, c)| marks.contains(c))
        .map(|(i, c)| i + c.len_utf8())
        .last()
}
