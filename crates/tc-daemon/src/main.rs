//! tc-daemon entry point. Thin by design: load config and secrets, connect
//! to Postgres, build the shared state, wire middleware, spawn the
//! background scheduler, serve HTTP. Route handlers live in `routes.rs`;
//! scheduled tasks live in `tasks.rs`.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use tc_daemon::{routes, state, tasks};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{info, Level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Dev convenience only; production injects env vars directly. Silent if
    // the file is absent.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let mode = tc_config::RunMode::parse(&std::env::var("TC_RUN_MODE").unwrap_or_else(|_| "paper".to_string()))
        .context("parsing TC_RUN_MODE")?;
    let config_paths = config_paths_from_env();
    let loaded = tc_config::load_layered_yaml(&config_paths.iter().map(String::as_str).collect::<Vec<_>>())
        .context("loading layered config")?;
    let secrets = tc_config::resolve_secrets_for_mode(&loaded.config_json, mode).context("resolving secrets")?;

    let pool = tc_db::connect_from_env().await.context("connecting to database")?;
    tc_db::migrate(&pool).await.context("running migrations")?;

    let audit_path = std::env::var("TC_AUDIT_LOG_PATH").unwrap_or_else(|_| "./data/audit.jsonl".to_string());
    let audit = tc_audit::AuditWriter::new(&audit_path).context("opening audit journal")?;

    let shared = Arc::new(state::AppState::new(pool, secrets, state::IngressConfig::default(), audit));

    tasks::spawn_all(Arc::clone(&shared));

    let app = routes::build_router(Arc::clone(&shared)).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    let addr = bind_addr_from_env().unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 8899)));
    info!("tc-daemon listening on http://{addr}");

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await.context("server crashed")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .json()
        .init();
}

fn bind_addr_from_env() -> Option<SocketAddr> {
    std::env::var("TC_DAEMON_ADDR").ok()?.parse().ok()
}

fn config_paths_from_env() -> Vec<String> {
    std::env::var("TC_CONFIG_PATHS")
        .map(|v| v.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
        .unwrap_or_default()
}
