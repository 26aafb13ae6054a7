//! Example-letter retrieval for the explain prompt.

use std::collections::HashMap;

use briefhulp_core::{Result, RetrievalSettings};
use briefhulp_infer::EmbedderBackend;
use briefhulp_store::{SearchHit, SqliteStore};
use tracing::debug;

use crate::types::ExampleMatch;

/// Characters of the letter used as the search query.
const MAX_QUERY_CHARS: usize = 2000;
/// Chunks fetched per example wanted, before grouping by document.
const HITS_PER_EXAMPLE: usize = 4;

/// Rank example letters by similarity to `query`, best document hit first.
///
/// Hybrid BM25 + vector search when the embedder is available, BM25 only
/// otherwise. Only documents with a summary are returned.
pub fn retrieve_examples(
    store: &SqliteStore,
    embedder: &dyn EmbedderBackend,
    query: &str,
    settings: &RetrievalSettings,
) -> Result<Vec<ExampleMatch>> {
    if settings.top_k == 0 || query.trim().is_empty() {
        return Ok(Vec::new());
    }
    let query: String = query.chars().take(MAX_QUERY_CHARS).collect();
    let fetch = settings.top_k * HITS_PER_EXAMPLE;

    let hits = match embedder.embed(&query) {
        Some(result) if embedder.is_available() => {
            store.hybrid_search(&query, &result.embedding, fetch, settings.rrf_k)?
        }
        _ => store.bm25_search(&query, fetch)?,
    };
    debug!("Retrieval: {} chunk hits", hits.len());

    let mut matches = Vec::new();
    for (doc_id, score) in best_per_document(&hits) {
        let Some(doc) = store.get_example(doc_id)? else {
            continue;
        };
        if doc.summary.is_none() {
            continue;
        }
        matches.push(ExampleMatch {
            doc_id,
            filename: doc.filename,
            source: doc.source,
            subject: doc.subject,
            summary: doc.summary,
            score,
        });
        if matches.len() == settings.top_k {
            break;
        }
    }
    Ok(matches)
}

/// Best score per document, highest first. Ties keep hit order.
fn best_per_document(hits: &[SearchHit]) -> Vec<(i64, f64)> {
    let mut best: HashMap<i64, (usize, f64)> = HashMap::new();
    for (rank, hit) in hits.iter().enumerate() {
        best.entry(hit.doc_id)
            .and_modify(|(_, score)| {
                if hit.score > *score {
                    *score = hit.score;
                }
            })
            .or_insert((rank, hit.score));
    }

    let mut ranked: Vec<(i64, usize, f64)> =
        best.into_iter().map(|(doc, (rank, score))| (doc, rank, score)).collect();
    ranked.sort_by(|a, b| b.2.total_cmp(&a.2).then(a.1.cmp(&b.1)));
    ranked.into_iter().map(|(doc, _, score)| (doc, score)).collect()
}
