//! Briefhulp: explains official Dutch letters in simple language.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use briefhulp_core::BriefhulpConfig;
use briefhulp_infer::EmbedderBackend;
use briefhulp_ingest::{Ingester, TextExtractor};
use briefhulp_server::{build_router, AppState};
use briefhulp_store::SqliteStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn resolve_data_dir() -> PathBuf {
    std::env::var("BRIEFHULP_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let exe_dir = std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|p| p.to_path_buf()));
            if let Some(dir) = exe_dir {
                let parent_data = dir.join("../data");
                if parent_data.exists() {
                    return parent_data;
                }
            }
            PathBuf::from("data")
        })
}

struct Backend {
    config: BriefhulpConfig,
    store: Arc<SqliteStore>,
    embedder: Arc<dyn EmbedderBackend>,
}

fn open_backend() -> anyhow::Result<Backend> {
    let data_dir = resolve_data_dir();
    info!("Data directory: {}", data_dir.display());

    let config = BriefhulpConfig::from_env(&data_dir)
        .with_context(|| format!("Failed to prepare data directory {}", data_dir.display()))?;
    let store = SqliteStore::open(&config.data_paths.knowledge, config.embedding_dim)
        .map_err(|e| anyhow::anyhow!("Failed to open store: {}", e))?;
    let embedder = briefhulp_infer::create_embedder(&config.data_paths.models);

    Ok(Backend {
        config,
        store: Arc::new(store),
        embedder,
    })
}

async fn ingest(backend: &Backend, dir: &Path) -> anyhow::Result<()> {
    let extractor = TextExtractor::new(backend.config.ocr.clone());
    let ingester = Ingester::new(&backend.store, backend.embedder.as_ref(), &extractor);
    let report = ingester
        .ingest_dir(dir)
        .await
        .map_err(|e| anyhow::anyhow!("Ingestion of {} failed: {}", dir.display(), e))?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    if report.pending > 0 {
        println!("{} letters have no summary yet; run `briefhulp summarize`.", report.pending);
    }
    Ok(())
}

async fn summarize(backend: Backend) -> anyhow::Result<()> {
    let state = AppState::from_config(backend.config, backend.store, backend.embedder);
    let report = state
        .assistant
        .summarize_pending()
        .await
        .map_err(|e| anyhow::anyhow!("Summarizing failed: {}", e))?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn print_help() {
    println!("Briefhulp: explains official Dutch letters in simple language");
    println!();
    println!("Usage: briefhulp [command]");
    println!();
    println!("Commands:");
    println!("  (none) | serve           Start the server");
    println!("  ingest [dir]             Add example letters (.txt/.md/.pdf) to the corpus");
    println!("  summarize                Write A2 summaries for examples that have none");
    println!("  seed [dir]               Write the built-in sample letters and ingest them");
    println!("  help                     Show this help message");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("serve");

    match command {
        "serve" => {}
        "ingest" => {
            let backend = open_backend()?;
            let dir = args
                .get(2)
                .map(PathBuf::from)
                .unwrap_or_else(|| backend.config.data_paths.examples.clone());
            return ingest(&backend, &dir).await;
        }
        "summarize" => {
            return summarize(open_backend()?).await;
        }
        "seed" => {
            let backend = open_backend()?;
            let dir = args
                .get(2)
                .map(PathBuf::from)
                .unwrap_or_else(|| backend.config.data_paths.examples.clone());
            let written = briefhulp_ingest::samples::write_samples(&dir)
                .map_err(|e| anyhow::anyhow!("Writing samples failed: {}", e))?;
            println!("Wrote {} sample letters to {}", written, dir.display());
            return ingest(&backend, &dir).await;
        }
        "--help" | "-h" | "help" => {
            print_help();
            return Ok(());
        }
        other => {
            eprintln!("Unknown command: {}. Use 'briefhulp help' for usage.", other);
            std::process::exit(1);
        }
    }

    let backend = open_backend()?;
    let port = backend.config.port;
    let state = Arc::new(AppState::from_config(
        backend.config,
        backend.store,
        backend.embedder,
    ));
    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Briefhulp listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
