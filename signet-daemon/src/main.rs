//! The Signet daemon: opens the store, wires the embedding provider
//! chain, starts the background workers, and serves the HTTP surface
//! (spec §4.N / §9) until a shutdown signal arrives.

use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info, warn, Level};
use tracing_subscriber::EnvFilter;

use signet_core::config::SignetConfig;
use signet_core::traits::{EmbeddingProvider, ExtractionProvider};
use signet_embeddings::build_provider_chain;
use signet_http::{serve, AppState};
use signet_repair::RepairRegistry;
use signet_session::SessionManager;
use signet_storage::Accessor;
use signet_worker::HttpExtractionProvider;

const CONFIG_CANDIDATES: &[&str] = &["agent.yaml", "AGENT.yaml", "config.yaml"];

fn parse_args() {
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--help" | "-h" => {
                println!("signet-daemon {}", env!("CARGO_PKG_VERSION"));
                println!();
                println!("Portable agent memory daemon: hybrid recall, content-addressed");
                println!("storage, extraction and repair workers, over a small HTTP API.");
                println!();
                println!("ENVIRONMENT:");
                println!("    SIGNET_PATH    Agents directory (default: current directory)");
                println!("    SIGNET_PORT    HTTP listen port (default: 3850)");
                println!("    SIGNET_HOST    HTTP listen host (default: localhost)");
                println!("    RUST_LOG       Log level filter (e.g. debug, info, warn)");
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("signet-daemon {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            other => {
                eprintln!("error: unknown argument '{other}'");
                eprintln!("Try 'signet-daemon --help' for more information.");
                std::process::exit(1);
            }
        }
    }
}

fn agents_dir() -> PathBuf {
    std::env::var("SIGNET_PATH").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("."))
}

fn find_config_file(agents_dir: &Path) -> Option<PathBuf> {
    CONFIG_CANDIDATES.iter().map(|name| agents_dir.join(name)).find(|path| path.is_file())
}

fn listen_addr() -> SocketAddr {
    let host = std::env::var("SIGNET_HOST").unwrap_or_else(|_| "localhost".to_string());
    let host = if host == "localhost" { "127.0.0.1".to_string() } else { host };
    let port: u16 = std::env::var("SIGNET_PORT").ok().and_then(|p| p.parse().ok()).unwrap_or(3850);
    format!("{host}:{port}").parse().unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], 3850)))
}

fn write_pid_file(agents_dir: &Path) {
    let daemon_dir = agents_dir.join(".daemon");
    if let Err(e) = std::fs::create_dir_all(&daemon_dir) {
        warn!(error = %e, "could not create .daemon directory, skipping pid file");
        return;
    }
    if let Err(e) = std::fs::write(daemon_dir.join("pid"), std::process::id().to_string()) {
        warn!(error = %e, "could not write pid file");
    }
}

async fn shutdown_signal(mut trigger: watch::Sender<bool>) {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to listen for ctrl+c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to listen for SIGTERM")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
    let _ = trigger.send(true);
}

/// Retention sweeper: unchanged-interval loop hard-deleting past-window
/// soft-deleted rows in one transaction per batch (spec §4 "Retention
/// window").
async fn run_retention_sweeper(accessor: Arc<Accessor>, window_ms: i64, interval_ms: i64, mut shutdown: watch::Receiver<bool>) {
    loop {
        let result = accessor.with_write_tx(|conn| {
            signet_storage::queries::maintenance::sweep_retention(conn, window_ms, chrono::Utc::now(), 500)
        });
        match result {
            Ok(swept) if swept > 0 => info!(swept, "retention sweep completed"),
            Ok(_) => {}
            Err(e) => warn!(error = %e, "retention sweep failed"),
        }

        let sleep = tokio::time::sleep(std::time::Duration::from_millis(interval_ms.max(0) as u64));
        tokio::select! {
            _ = sleep => {}
            changed = shutdown.changed() => {
                if changed.is_ok() && *shutdown.borrow() {
                    break;
                }
            }
        }
        if *shutdown.borrow() {
            break;
        }
    }
}

/// Markdown ingestion feed: watches `memory/*.md` (spec §4.L) and
/// remembers any new or changed chunk through the same `remember()`
/// pipeline an HTTP caller would use.
async fn run_markdown_feed(
    memory_dir: PathBuf,
    accessor: Arc<Accessor>,
    embeddings: Arc<dyn EmbeddingProvider>,
    config: SignetConfig,
    mut shutdown: watch::Receiver<bool>,
) {
    if let Err(e) = std::fs::create_dir_all(&memory_dir) {
        warn!(error = %e, dir = %memory_dir.display(), "could not create memory directory, markdown feed disabled");
        return;
    }

    let (_watcher, mut rx) = match signet_ingest::watcher::watch_markdown_dir(&memory_dir) {
        Ok(pair) => pair,
        Err(e) => {
            warn!(error = %e, "could not start markdown watcher, feed disabled");
            return;
        }
    };

    let mut feed = signet_ingest::IngestionFeed::new();
    let chunk_target = config.pipeline_v2.guardrails.chunk_target_chars;

    loop {
        tokio::select! {
            path = rx.recv() => {
                let Some(path) = path else { break };
                if path.file_name().and_then(|f| f.to_str()) == Some("MEMORY.md") {
                    continue;
                }
                let content = match std::fs::read_to_string(&path) {
                    Ok(c) => c,
                    Err(e) => {
                        warn!(error = %e, path = %path.display(), "could not read ingestion file");
                        continue;
                    }
                };
                let Some(chunks) = feed.scan(&path, &content, chunk_target) else { continue };
                for chunk in chunks {
                    let raw = match &chunk.heading {
                        Some(h) => format!("{h}\n{}", chunk.body),
                        None => chunk.body,
                    };
                    let req = signet_ingest::RememberRequest {
                        raw,
                        who: None,
                        project: None,
                        importance: None,
                        tags: None,
                        pinned: None,
                    };
                    if let Err(e) = signet_ingest::remember(&accessor, embeddings.as_ref(), &config, req).await {
                        warn!(error = %e, path = %path.display(), "markdown ingestion failed");
                    }
                }
            }
            changed = shutdown.changed() => {
                if changed.is_ok() && *shutdown.borrow() {
                    break;
                }
            }
        }
    }
}

#[tokio::main]
async fn main() {
    parse_args();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with_writer(io::stderr)
        .with_target(false)
        .with_ansi(false)
        .init();

    info!("signet-daemon v{} starting", env!("CARGO_PKG_VERSION"));

    let agents_dir = agents_dir();
    let memory_dir = agents_dir.join("memory");
    if let Err(e) = std::fs::create_dir_all(&memory_dir) {
        error!(error = %e, dir = %memory_dir.display(), "could not create memory directory");
        std::process::exit(1);
    }

    let config = match find_config_file(&agents_dir) {
        Some(path) => {
            info!(path = %path.display(), "loading configuration");
            SignetConfig::load(&path)
        }
        None => {
            info!("no agent.yaml/AGENT.yaml/config.yaml found, using defaults");
            SignetConfig::default()
        }
    };

    let db_path = memory_dir.join("memories.db");
    let accessor = match Accessor::init(&db_path) {
        Ok(a) => {
            info!(path = %db_path.display(), "store opened");
            a
        }
        Err(e) => {
            error!(error = %e, "failed to open store");
            std::process::exit(1);
        }
    };

    let embeddings: Arc<dyn EmbeddingProvider> = Arc::new(build_provider_chain(&config.embedding));
    let extraction: Arc<dyn ExtractionProvider> = Arc::new(HttpExtractionProvider::new(
        config.embedding.base_url.clone(),
        config.pipeline_v2.extraction.model.clone(),
        config.embedding.api_key.clone(),
        config.pipeline_v2.extraction.timeout_ms,
    ));

    let state = Arc::new(AppState {
        accessor: accessor.clone(),
        embeddings: embeddings.clone(),
        reranker: None,
        config: config.clone(),
        repair: RepairRegistry::new(),
        sessions: SessionManager::new(),
    });

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(shutdown_signal(shutdown_tx));

    tokio::spawn(signet_worker::run_extraction_worker(accessor.clone(), extraction, config.clone(), shutdown_rx.clone()));
    tokio::spawn(signet_worker::run_embedding_tracker(
        accessor.clone(),
        embeddings.clone(),
        config.pipeline_v2.worker.poll_ms,
        shutdown_rx.clone(),
    ));
    tokio::spawn(run_retention_sweeper(
        accessor.clone(),
        config.retention.window_ms,
        config.pipeline_v2.autonomous.maintenance_interval_ms,
        shutdown_rx.clone(),
    ));
    tokio::spawn(run_markdown_feed(memory_dir, accessor.clone(), embeddings.clone(), config.clone(), shutdown_rx.clone()));

    write_pid_file(&agents_dir);

    let addr = listen_addr();
    if let Err(e) = serve(state, addr, shutdown_rx).await {
        error!(error = %e, %addr, "HTTP server failed");
        std::process::exit(1);
    }

    info!("signet-daemon shut down");
}
