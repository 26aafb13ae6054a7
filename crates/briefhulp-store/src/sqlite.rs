//! SQLite store for the example-letter corpus: FTS5 BM25 + int8 vector
//! search fused with Reciprocal Rank Fusion, plus the local feedback log.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use ndarray::{Array1, Array2, Axis};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::embedding::{dequantize_uint8, quantize_uint8};
use crate::schema::{FTS_SCHEMA_SQL, FTS_TRIGGERS_SQL, SCHEMA_SQL};
use crate::types::*;
use briefhulp_core::{Error, Result};

const DB_FILE: &str = "briefhulp.db";

/// SQLite store with FTS5 full-text search and int8 vector search.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
    embedding_dim: usize,
    /// Normalized embeddings for cosine search, reloaded lazily when dirty.
    embedding_matrix: Mutex<EmbeddingMatrix>,
}

struct EmbeddingMatrix {
    /// Shape (N, dim), rows L2-normalized.
    matrix: Array2<f32>,
    chunk_ids: Vec<i64>,
    dirty: bool,
}

fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

fn db_err(e: rusqlite::Error) -> Error {
    Error::Database(e.to_string())
}

impl SqliteStore {
    /// Open or create the store in `db_dir` (file `briefhulp.db`).
    pub fn open(db_dir: impl AsRef<Path>, embedding_dim: usize) -> Result<Self> {
        let db_dir = db_dir.as_ref();
        std::fs::create_dir_all(db_dir).map_err(|e| Error::Storage(e.to_string()))?;
        let db_path = db_dir.join(DB_FILE);

        let conn = Connection::open(&db_path).map_err(db_err)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(db_err)?;

        let full_schema = format!("{}\n{}\n{}", SCHEMA_SQL, FTS_SCHEMA_SQL, FTS_TRIGGERS_SQL);
        conn.execute_batch(&full_schema)
            .map_err(|e| Error::Database(format!("Schema init failed: {}", e)))?;

        let store = Self {
            conn: Mutex::new(conn),
            db_path,
            embedding_dim,
            embedding_matrix: Mutex::new(EmbeddingMatrix {
                matrix: Array2::zeros((0, embedding_dim)),
                chunk_ids: Vec::new(),
                dirty: true,
            }),
        };

        store.load_embedding_matrix()?;

        info!(
            "SqliteStore initialized: {} examples, {} chunks, dim={}, path={}",
            store.count_examples()?,
            store.count_chunks()?,
            embedding_dim,
            store.db_path.display()
        );

        Ok(store)
    }

    pub fn embedding_dim(&self) -> usize {
        self.embedding_dim
    }

    // ---------------------------------------------------------------
    // Example documents
    // ---------------------------------------------------------------

    /// Insert an example letter. Returns the new document ID.
    pub fn add_example(&self, example: NewExample) -> Result<i64> {
        let meta_json = example
            .metadata
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let conn = self.conn.lock();
        let id = conn
            .prepare_cached(
                "INSERT INTO documents (filename, text, summary, source, subject, \
                 metadata_json, content_hash, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )
            .map_err(db_err)?
            .insert(params![
                example.filename,
                example.text,
                example.summary,
                example.source,
                example.subject,
                meta_json,
                example.content_hash,
                now_millis(),
            ])
            .map_err(|e| {
                if e.to_string().contains("UNIQUE constraint") {
                    Error::DuplicateContent(
                        example
                            .content_hash
                            .clone()
                            .unwrap_or_else(|| example.filename.clone()),
                    )
                } else {
                    db_err(e)
                }
            })?;
        Ok(id)
    }

    pub fn get_example(&self, doc_id: i64) -> Result<Option<ExampleDocument>> {
        self.query_example("SELECT * FROM documents WHERE id = ?1", params![doc_id])
    }

    pub fn find_example_by_hash(&self, content_hash: &str) -> Result<Option<ExampleDocument>> {
        self.query_example(
            "SELECT * FROM documents WHERE content_hash = ?1",
            params![content_hash],
        )
    }

    pub fn find_example_by_filename(&self, filename: &str) -> Result<Option<ExampleDocument>> {
        self.query_example(
            "SELECT * FROM documents WHERE filename = ?1",
            params![filename],
        )
    }

    fn query_example(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Option<ExampleDocument>> {
        let conn = self.conn.lock();
        let row = conn
            .prepare_cached(sql)
            .map_err(db_err)?
            .query_row(params, |row| Ok(Self::row_to_example(row)))
            .optional()
            .map_err(db_err)?;
        Ok(row)
    }

    /// Delete an example and its chunks (cascade).
    pub fn delete_example(&self, doc_id: i64) -> Result<bool> {
        let count = self
            .conn
            .lock()
            .execute("DELETE FROM documents WHERE id = ?1", params![doc_id])
            .map_err(db_err)?;
        if count > 0 {
            self.embedding_matrix.lock().dirty = true;
        }
        Ok(count > 0)
    }

    /// Set (or replace) the A2 summary of an example.
    pub fn set_summary(&self, doc_id: i64, summary: &str) -> Result<bool> {
        let count = self
            .conn
            .lock()
            .execute(
                "UPDATE documents SET summary = ?1, updated_at = ?2 WHERE id = ?3",
                params![summary, now_millis(), doc_id],
            )
            .map_err(db_err)?;
        Ok(count > 0)
    }

    pub fn count_examples(&self) -> Result<i64> {
        self.count("SELECT COUNT(*) FROM documents")
    }

    /// Examples still waiting for a summary.
    pub fn pending_examples(&self, limit: usize) -> Result<Vec<ExampleDocument>> {
        self.query_examples(
            "SELECT * FROM documents WHERE summary IS NULL ORDER BY id ASC LIMIT ?1",
            limit,
        )
    }

    /// Summarized examples that have no chunks yet.
    pub fn unindexed_examples(&self, limit: usize) -> Result<Vec<ExampleDocument>> {
        self.query_examples(
            "SELECT d.* FROM documents d \
             WHERE d.summary IS NOT NULL \
               AND NOT EXISTS (SELECT 1 FROM chunks c WHERE c.doc_id = d.id) \
             ORDER BY d.id ASC LIMIT ?1",
            limit,
        )
    }

    fn query_examples(&self, sql: &str, limit: usize) -> Result<Vec<ExampleDocument>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(sql).map_err(db_err)?;
        let rows = stmt
            .query_map(params![limit.min(i64::MAX as usize) as i64], |row| {
                Ok(Self::row_to_example(row))
            })
            .map_err(db_err)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    // ---------------------------------------------------------------
    // Chunks
    // ---------------------------------------------------------------

    /// Insert a chunk. Returns the new chunk ID.
    pub fn add_chunk(
        &self,
        doc_id: i64,
        kind: ChunkKind,
        text: &str,
        chunk_index: i32,
        char_range: Option<(i32, i32)>,
    ) -> Result<i64> {
        let conn = self.conn.lock();
        let id = conn
            .prepare_cached(
                "INSERT INTO chunks (doc_id, kind, text, chunk_index, char_start, char_end, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )
            .map_err(db_err)?
            .insert(params![
                doc_id,
                kind.as_str(),
                text,
                chunk_index,
                char_range.map(|r| r.0),
                char_range.map(|r| r.1),
                now_millis(),
            ])
            .map_err(db_err)?;
        Ok(id)
    }

    /// Remove all chunks of a document, e.g. before re-indexing.
    pub fn clear_chunks(&self, doc_id: i64) -> Result<usize> {
        let count = self
            .conn
            .lock()
            .execute("DELETE FROM chunks WHERE doc_id = ?1", params![doc_id])
            .map_err(db_err)?;
        if count > 0 {
            self.embedding_matrix.lock().dirty = true;
        }
        Ok(count)
    }

    /// Store a quantized embedding for a chunk.
    pub fn add_chunk_embedding(&self, chunk_id: i64, embedding: &Array1<f32>) -> Result<()> {
        if embedding.len() != self.embedding_dim {
            return Err(Error::Storage(format!(
                "Embedding has {} dimensions, store expects {}",
                embedding.len(),
                self.embedding_dim
            )));
        }
        let (q_bytes, scale, offset) = quantize_uint8(embedding);
        self.conn
            .lock()
            .execute(
                "INSERT OR REPLACE INTO chunk_embeddings (chunk_id, embedding, scale, offset_val) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![chunk_id, q_bytes, scale, offset],
            )
            .map_err(db_err)?;
        self.embedding_matrix.lock().dirty = true;
        Ok(())
    }

    pub fn get_chunk(&self, chunk_id: i64) -> Result<Option<Chunk>> {
        let conn = self.conn.lock();
        let row = conn
            .prepare_cached("SELECT * FROM chunks WHERE id = ?1")
            .map_err(db_err)?
            .query_row(params![chunk_id], |row| Ok(Self::row_to_chunk(row)))
            .optional()
            .map_err(db_err)?;
        Ok(row)
    }

    pub fn get_chunks_for_document(&self, doc_id: i64) -> Result<Vec<Chunk>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached("SELECT * FROM chunks WHERE doc_id = ?1 ORDER BY chunk_index")
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![doc_id], |row| Ok(Self::row_to_chunk(row)))
            .map_err(db_err)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    pub fn count_chunks(&self) -> Result<i64> {
        self.count("SELECT COUNT(*) FROM chunks")
    }

    // ---------------------------------------------------------------
    // BM25 Search (FTS5)
    // ---------------------------------------------------------------

    /// Full-text search using FTS5 BM25 ranking.
    pub fn bm25_search(&self, query: &str, top_k: usize) -> Result<Vec<SearchHit>> {
        let fts_query = Self::sanitize_fts_query(query);
        if fts_query.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached(
                "SELECT c.id, c.doc_id, c.kind, c.text, chunks_fts.rank AS bm25_score \
                 FROM chunks_fts \
                 JOIN chunks c ON c.id = chunks_fts.rowid \
                 WHERE chunks_fts MATCH ?1 \
                 ORDER BY chunks_fts.rank \
                 LIMIT ?2",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![fts_query, top_k as i64], |row| {
                let bm25_score: f64 = row.get("bm25_score").unwrap_or(0.0);
                let kind: String = row.get("kind")?;
                Ok(SearchHit {
                    chunk_id: row.get("id")?,
                    doc_id: row.get("doc_id")?,
                    kind: ChunkKind::parse(&kind),
                    text: row.get("text")?,
                    // FTS5 rank is negative; negate so higher is better
                    score: -bm25_score,
                })
            })
            .map_err(db_err)?;

        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    /// Turn free text into an FTS5 MATCH expression: each word quoted, joined by OR.
    /// Punctuation and one-character tokens (amounts, dates) are dropped.
    fn sanitize_fts_query(query: &str) -> String {
        query
            .split_whitespace()
            .map(|t| t.chars().filter(|c| c.is_alphanumeric()).collect::<String>())
            .filter(|t| t.chars().count() > 1)
            .map(|t| format!("\"{}\"", t))
            .collect::<Vec<_>>()
            .join(" OR ")
    }

    // ---------------------------------------------------------------
    // Vector Search
    // ---------------------------------------------------------------

    fn load_embedding_matrix(&self) -> Result<()> {
        let mut chunk_ids = Vec::new();
        let mut embeddings: Vec<Array1<f32>> = Vec::new();

        {
            let conn = self.conn.lock();
            let mut stmt = conn
                .prepare("SELECT chunk_id, embedding, scale, offset_val FROM chunk_embeddings")
                .map_err(db_err)?;
            let rows = stmt
                .query_map([], |row| {
                    let chunk_id: i64 = row.get(0)?;
                    let blob: Vec<u8> = row.get(1)?;
                    let scale: f64 = row.get(2)?;
                    let offset: f64 = row.get(3)?;
                    Ok((chunk_id, blob, scale as f32, offset as f32))
                })
                .map_err(db_err)?;

            for row in rows {
                let (cid, blob, scale, offset) = row.map_err(db_err)?;
                if blob.len() != self.embedding_dim {
                    continue;
                }
                chunk_ids.push(cid);
                embeddings.push(dequantize_uint8(&blob, scale, offset));
            }
        }

        let mut matrix = Array2::zeros((embeddings.len(), self.embedding_dim));
        for (i, emb) in embeddings.iter().enumerate() {
            let norm = emb.dot(emb).sqrt();
            if norm > 1e-9 {
                matrix.row_mut(i).assign(&(emb / norm));
            }
        }

        let mut mat = self.embedding_matrix.lock();
        mat.matrix = matrix;
        mat.chunk_ids = chunk_ids;
        mat.dirty = false;
        debug!("Loaded {} embeddings into matrix", mat.chunk_ids.len());
        Ok(())
    }

    fn ensure_matrix_loaded(&self) -> Result<()> {
        let dirty = self.embedding_matrix.lock().dirty;
        if dirty {
            self.load_embedding_matrix()?;
        }
        Ok(())
    }

    /// Cosine similarity search over all embedded chunks.
    pub fn vector_search(
        &self,
        query_embedding: &Array1<f32>,
        top_k: usize,
    ) -> Result<Vec<SearchHit>> {
        self.ensure_matrix_loaded()?;

        let q_norm = query_embedding.dot(query_embedding).sqrt();
        if q_norm < 1e-9 || query_embedding.len() != self.embedding_dim {
            return Ok(Vec::new());
        }
        let q = query_embedding / q_norm;

        let top: Vec<(i64, f64)> = {
            let mat = self.embedding_matrix.lock();
            if mat.matrix.nrows() == 0 {
                return Ok(Vec::new());
            }
            let similarities = mat.matrix.dot(&q);
            let mut indexed: Vec<(usize, f32)> =
                similarities.iter().copied().enumerate().collect();
            indexed.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
            indexed.truncate(top_k);
            indexed
                .into_iter()
                .map(|(i, s)| (mat.chunk_ids[i], s as f64))
                .collect()
        };

        let mut results = Vec::with_capacity(top.len());
        for (cid, score) in top {
            if let Some(chunk) = self.get_chunk(cid)? {
                results.push(SearchHit {
                    chunk_id: chunk.id,
                    doc_id: chunk.doc_id,
                    kind: chunk.kind,
                    text: chunk.text,
                    score,
                });
            }
        }
        Ok(results)
    }

    // ---------------------------------------------------------------
    // Reciprocal Rank Fusion
    // ---------------------------------------------------------------

    /// RRF score = sum(1 / (k + rank)) across result lists.
    pub fn reciprocal_rank_fusion(
        bm25_results: &[SearchHit],
        vector_results: &[SearchHit],
        k: usize,
    ) -> Vec<SearchHit> {
        let mut rrf_scores: HashMap<i64, f64> = HashMap::new();
        let mut chunk_map: HashMap<i64, &SearchHit> = HashMap::new();

        for list in [bm25_results, vector_results] {
            for (rank, hit) in list.iter().enumerate() {
                *rrf_scores.entry(hit.chunk_id).or_insert(0.0) +=
                    1.0 / (k as f64 + rank as f64 + 1.0);
                chunk_map.entry(hit.chunk_id).or_insert(hit);
            }
        }

        let mut sorted: Vec<(i64, f64)> = rrf_scores.into_iter().collect();
        sorted.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });

        sorted
            .into_iter()
            .filter_map(|(cid, score)| {
                chunk_map.get(&cid).map(|hit| SearchHit {
                    score,
                    ..(*hit).clone()
                })
            })
            .collect()
    }

    /// Combined BM25 + vector search with RRF fusion.
    pub fn hybrid_search(
        &self,
        query: &str,
        query_embedding: &Array1<f32>,
        top_k: usize,
        rrf_k: usize,
    ) -> Result<Vec<SearchHit>> {
        let bm25_hits = self.bm25_search(query, top_k)?;
        let vector_hits = self.vector_search(query_embedding, top_k)?;
        Ok(Self::reciprocal_rank_fusion(&bm25_hits, &vector_hits, rrf_k))
    }

    // ---------------------------------------------------------------
    // Feedback log (append-only)
    // ---------------------------------------------------------------

    pub fn append_feedback(&self, feedback: &NewFeedback) -> Result<i64> {
        let conn = self.conn.lock();
        let id = conn
            .prepare_cached(
                "INSERT INTO feedback (session_id, score, summary_text, original_text, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .map_err(db_err)?
            .insert(params![
                feedback.session_id,
                feedback.score,
                feedback.summary_text,
                feedback.original_text,
                now_millis(),
            ])
            .map_err(db_err)?;
        Ok(id)
    }

    pub fn feedback_for_session(&self, session_id: &str) -> Result<Vec<FeedbackRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached("SELECT * FROM feedback WHERE session_id = ?1 ORDER BY id ASC")
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![session_id], |row| {
                Ok(FeedbackRecord {
                    id: row.get("id")?,
                    session_id: row.get("session_id")?,
                    score: row.get("score")?,
                    summary_text: row.get("summary_text")?,
                    original_text: row.get("original_text")?,
                    created_at: row.get("created_at")?,
                })
            })
            .map_err(db_err)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    pub fn count_feedback(&self) -> Result<i64> {
        self.count("SELECT COUNT(*) FROM feedback")
    }

    // ---------------------------------------------------------------
    // Stats
    // ---------------------------------------------------------------

    pub fn get_stats(&self) -> Result<StoreStats> {
        let total_documents = self.count_examples()?;
        let summarized_documents =
            self.count("SELECT COUNT(*) FROM documents WHERE summary IS NOT NULL")?;
        let total_chunks = self.count_chunks()?;
        let embeddings_stored = self.count("SELECT COUNT(*) FROM chunk_embeddings")?;
        let feedback_records = self.count_feedback()?;

        let db_size = std::fs::metadata(&self.db_path).map(|m| m.len()).unwrap_or(0);
        let matrix_rows = self.embedding_matrix.lock().matrix.nrows();

        Ok(StoreStats {
            total_documents,
            summarized_documents,
            pending_documents: total_documents - summarized_documents,
            total_chunks,
            embeddings_stored,
            embedding_dimension: self.embedding_dim,
            feedback_records,
            db_path: self.db_path.to_string_lossy().to_string(),
            db_size_mb: db_size as f64 / (1024.0 * 1024.0),
            matrix_rows,
        })
    }

    fn count(&self, sql: &str) -> Result<i64> {
        self.conn
            .lock()
            .query_row(sql, [], |row| row.get(0))
            .map_err(db_err)
    }

    // ---------------------------------------------------------------
    // Row Mapping Helpers
    // ---------------------------------------------------------------

    fn row_to_example(row: &rusqlite::Row<'_>) -> ExampleDocument {
        ExampleDocument {
            id: row.get("id").unwrap_or(0),
            filename: row.get("filename").unwrap_or_default(),
            text: row.get("text").unwrap_or_default(),
            summary: row.get("summary").ok().flatten(),
            source: row.get("source").ok().flatten(),
            subject: row.get("subject").ok().flatten(),
            metadata: row
                .get::<_, Option<String>>("metadata_json")
                .ok()
                .flatten()
                .and_then(|s| serde_json::from_str(&s).ok()),
            content_hash: row.get("content_hash").ok().flatten(),
            created_at: row.get("created_at").unwrap_or(0),
            updated_at: row.get("updated_at").ok().flatten(),
        }
    }

    fn row_to_chunk(row: &rusqlite::Row<'_>) -> Chunk {
        let kind: String = row.get("kind").unwrap_or_default();
        Chunk {
            id: row.get("id").unwrap_or(0),
            doc_id: row.get("doc_id").unwrap_or(0),
            kind: ChunkKind::parse(&kind),
            text: row.get("text").unwrap_or_default(),
            chunk_index: row.get("chunk_index").unwrap_or(0),
            char_start: row.get("char_start").ok().flatten(),
            char_end: row.get("char_end").ok().flatten(),
            created_at: row.get("created_at").unwrap_or(0),
        }
    }
}
