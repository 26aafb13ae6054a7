//! Client for a Google-Translate-style TTS endpoint.
//!
//! The endpoint takes `GET ?ie=UTF-8&client=tw-ob&tl=<lang>&q=<text>` and
//! answers with an MP3 fragment. Longer texts are rendered piece by piece
//! and the MP3 frames concatenated, which players handle as one stream.

use std::time::Duration;

use briefhulp_core::{Error, Result, SpeechSettings, TtlCache};
use reqwest::Client;
use tracing::{debug, warn};

use crate::clean::{clean_for_speech, split_for_speech, MAX_PIECE_CHARS};

const CACHE_TTL: Duration = Duration::from_secs(60 * 60);

pub struct SpeechSynthesizer {
    client: Client,
    settings: SpeechSettings,
    cache: TtlCache<Vec<u8>>,
}

impl SpeechSynthesizer {
    pub fn new(client: Client, settings: SpeechSettings) -> Self {
        let cache = TtlCache::new(settings.cache_entries, CACHE_TTL);
        Self {
            client,
            settings,
            cache,
        }
    }

    pub fn language(&self) -> &str {
        &self.settings.language
    }

    pub fn endpoint(&self) -> &str {
        &self.settings.endpoint
    }

    /// Render `text` as MP3 bytes.
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let cleaned = clean_for_speech(text);
        if cleaned.is_empty() {
            return Err(Error::Validation("nothing to read aloud".into()));
        }
        if let Some(audio) = self.cache.get(&cleaned) {
            debug!("Speech cache hit ({} bytes)", audio.len());
            return Ok(audio);
        }

        let pieces = split_for_speech(&cleaned, MAX_PIECE_CHARS);
        let total = pieces.len();
        let mut audio = Vec::new();
        for (i, piece) in pieces.iter().enumerate() {
            let bytes = self.fetch_piece(piece, i, total).await?;
            audio.extend_from_slice(&bytes);
        }

        debug!("Synthesized {} pieces into {} bytes", total, audio.len());
        self.cache.put(cleaned, audio.clone());
        Ok(audio)
    }

    async fn fetch_piece(&self, piece: &str, index: usize, total: usize) -> Result<Vec<u8>> {
        let idx = index.to_string();
        let total_str = total.to_string();
        let textlen = piece.chars().count().to_string();

        let resp = self
            .client
            .get(&self.settings.endpoint)
            .query(&[
                ("ie", "UTF-8"),
                ("client", "tw-ob"),
                ("tl", self.settings.language.as_str()),
                ("q", piece),
                ("idx", idx.as_str()),
                ("total", total_str.as_str()),
                ("textlen", textlen.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                warn!("TTS request failed: {}", e);
                Error::Speech(e.to_string())
            })?;

        let status = resp.status();
        if !status.is_success() {
            warn!("TTS endpoint returned {}", status);
            return Err(Error::Speech(format!("TTS endpoint returned status {status}")));
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| Error::Speech(e.to_string()))?;
        if bytes.is_empty() {
            return Err(Error::Speech("TTS endpoint returned no audio".into()));
        }
        Ok(bytes.to_vec())
    }
}
