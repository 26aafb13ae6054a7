//! Example-corpus ingestion: file → text → document → chunks → embeddings.

use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::catalog::LetterOrigin;
use crate::chunking::RecursiveChunker;
use crate::file::FileKind;
use crate::ocr::TextExtractor;
use briefhulp_core::{Error, Result};
use briefhulp_infer::EmbedderBackend;
use briefhulp_store::{ChunkKind, ExampleDocument, NewExample, SqliteStore};

/// Suffix of the optional ready-made summary next to an example letter.
pub const SUMMARY_SUFFIX: &str = ".summary.txt";

/// Outcome of an ingestion run.
#[derive(Debug, Default, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    pub added: usize,
    pub updated: usize,
    pub skipped: usize,
    /// Documents that received chunks in this run.
    pub indexed: usize,
    /// Added documents still waiting for a summary.
    pub pending: usize,
    /// `(file name, error)` for files that could not be ingested.
    pub failed: Vec<(String, String)>,
}

enum FileOutcome {
    Added { indexed: bool },
    Updated { indexed: bool },
    Unchanged,
}

/// Fills the example corpus.
pub struct Ingester<'a> {
    store: &'a SqliteStore,
    embedder: &'a dyn EmbedderBackend,
    extractor: &'a TextExtractor,
    chunker: RecursiveChunker,
}

impl<'a> Ingester<'a> {
    pub fn new(
        store: &'a SqliteStore,
        embedder: &'a dyn EmbedderBackend,
        extractor: &'a TextExtractor,
    ) -> Self {
        Self {
            store,
            embedder,
            extractor,
            chunker: RecursiveChunker::default(),
        }
    }

    /// Ingest every `.txt`/`.md`/`.pdf` letter in `dir` (not recursive).
    /// A failing file is reported and skipped.
    pub async fn ingest_dir(&self, dir: &Path) -> Result<IngestReport> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && is_letter_file(p))
            .collect();
        paths.sort();

        let mut report = IngestReport::default();
        for path in &paths {
            let name = display_name(path);
            match self.ingest_file(path).await {
                Ok(FileOutcome::Added { indexed }) => {
                    report.added += 1;
                    if indexed {
                        report.indexed += 1;
                    } else {
                        report.pending += 1;
                    }
                }
                Ok(FileOutcome::Updated { indexed }) => {
                    report.updated += 1;
                    if indexed {
                        report.indexed += 1;
                    } else {
                        report.pending += 1;
                    }
                }
                Ok(FileOutcome::Unchanged) => report.skipped += 1,
                Err(e) => {
                    warn!("Failed to ingest {}: {}", name, e);
                    report.failed.push((name, e.to_string()));
                }
            }
        }

        info!(
            "Ingested {}: {} added, {} updated, {} unchanged, {} failed, {} pending summary",
            dir.display(),
            report.added,
            report.updated,
            report.skipped,
            report.failed.len(),
            report.pending
        );
        Ok(report)
    }

    async fn ingest_file(&self, path: &Path) -> Result<FileOutcome> {
        let filename = display_name(path);
        let text = self.extractor.extract_path(path).await?;
        let hash = content_hash(&text);

        if self.store.find_example_by_hash(&hash)?.is_some() {
            debug!("Unchanged, skipping: {}", filename);
            return Ok(FileOutcome::Unchanged);
        }

        // Same file name with new content replaces the old document
        let replaced = match self.store.find_example_by_filename(&filename)? {
            Some(old) => {
                self.store.delete_example(old.id)?;
                true
            }
            None => false,
        };

        let summary = read_sidecar_summary(path).await;
        let origin = LetterOrigin::from_filename(&filename);
        let metadata = serde_json::json!({
            "file_size": std::fs::metadata(path).map(|m| m.len()).unwrap_or(0),
            "source_name": origin.as_ref().map(|o| o.display_source()),
        });

        let doc_id = self.store.add_example(NewExample {
            filename: filename.clone(),
            text,
            summary,
            source: origin.as_ref().map(|o| o.source.clone()),
            subject: origin.and_then(|o| o.subject),
            metadata: Some(metadata),
            content_hash: Some(hash),
        })?;

        let indexed = match self.store.get_example(doc_id)? {
            Some(doc) if doc.summary.is_some() => {
                self.index_document(&doc)?;
                true
            }
            _ => false,
        };

        Ok(if replaced {
            FileOutcome::Updated { indexed }
        } else {
            FileOutcome::Added { indexed }
        })
    }

    /// (Re)build the chunks of a summarized document: one summary chunk,
    /// then passages of the full text. Returns the number of chunks.
    pub fn index_document(&self, doc: &ExampleDocument) -> Result<usize> {
        let summary = doc
            .summary
            .as_deref()
            .ok_or_else(|| Error::Validation(format!("{} has no summary yet", doc.filename)))?;

        self.store.clear_chunks(doc.id)?;

        let mut pieces: Vec<(ChunkKind, String, Option<(i32, i32)>)> =
            vec![(ChunkKind::Summary, summary.to_string(), None)];
        for chunk in self.chunker.chunk(&doc.text) {
            pieces.push((
                ChunkKind::Passage,
                chunk.text,
                Some((chunk.start_char as i32, chunk.end_char as i32)),
            ));
        }

        let embeddings = if self.embedder.is_available() {
            let texts: Vec<&str> = pieces.iter().map(|(_, t, _)| t.as_str()).collect();
            self.embedder.embed_batch(&texts)
        } else {
            Vec::new()
        };

        for (i, (kind, text, range)) in pieces.iter().enumerate() {
            let chunk_id = self.store.add_chunk(doc.id, *kind, text, i as i32, *range)?;
            if let Some(Some(result)) = embeddings.get(i) {
                self.store.add_chunk_embedding(chunk_id, &result.embedding)?;
            }
        }

        debug!("Indexed {} into {} chunks", doc.filename, pieces.len());
        Ok(pieces.len())
    }

    /// Index every summarized document that has no chunks yet.
    pub fn index_unindexed(&self) -> Result<usize> {
        let docs = self.store.unindexed_examples(usize::MAX)?;
        for doc in &docs {
            self.index_document(doc)?;
        }
        Ok(docs.len())
    }
}

fn is_letter_file(path: &Path) -> bool {
    let name = display_name(path);
    !name.ends_with(SUMMARY_SUFFIX)
        && matches!(FileKind::from_name(&name), FileKind::Text | FileKind::Pdf)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string()
}

async fn read_sidecar_summary(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    let sidecar = path.with_file_name(format!("{}{}", stem, SUMMARY_SUFFIX));
    let bytes = tokio::fs::read(&sidecar).await.ok()?;
    let text = crate::file::decode_text(&bytes);
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Compute SHA-256 content hash.
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}
