//! File kinds accepted for letters and example documents, and text decoding.

use std::path::Path;

/// What an uploaded or ingested file contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Text,
    Pdf,
    Image,
    Unsupported,
}

impl FileKind {
    /// Detect the kind from a file name's extension.
    pub fn from_name(name: &str) -> Self {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        match ext.as_str() {
            "txt" | "md" => Self::Text,
            "pdf" => Self::Pdf,
            "jpg" | "jpeg" | "png" | "tif" | "tiff" | "bmp" | "webp" => Self::Image,
            _ => Self::Unsupported,
        }
    }

    /// Suffix used for the temp file handed to external tools.
    pub fn temp_suffix(&self) -> &'static str {
        match self {
            Self::Pdf => ".pdf",
            Self::Image => ".png",
            Self::Text | Self::Unsupported => ".txt",
        }
    }
}

/// Windows-1252 code points for bytes 0x80..=0x9F. Unassigned bytes map to
/// the C1 control of the same value, as most decoders do.
const CP1252_HIGH: [char; 32] = [
    '\u{20AC}', '\u{0081}', '\u{201A}', '\u{0192}', '\u{201E}', '\u{2026}', '\u{2020}', '\u{2021}',
    '\u{02C6}', '\u{2030}', '\u{0160}', '\u{2039}', '\u{0152}', '\u{008D}', '\u{017D}', '\u{008F}',
    '\u{0090}', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{2022}', '\u{2013}', '\u{2014}',
    '\u{02DC}', '\u{2122}', '\u{0161}', '\u{203A}', '\u{0153}', '\u{009D}', '\u{017E}', '\u{0178}',
];

fn decode_cp1252(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| match b {
            0x80..=0x9F => CP1252_HIGH[(b - 0x80) as usize],
            _ => b as char,
        })
        .collect()
}

/// Decode text bytes: UTF-8 first, Windows-1252 when that fails.
/// A leading UTF-8 byte order mark is dropped.
pub fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            tracing::debug!("Input is not UTF-8, decoding as Windows-1252");
            decode_cp1252(bytes)
        }
    }
}
