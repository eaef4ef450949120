//! Shared runtime state handed to every Axum handler.

use std::sync::Arc;

use sqlx::PgPool;
use tc_audit::AuditWriter;
use tc_broker::PaperBroker;
use tc_config::ResolvedSecrets;
use tc_primitives::Decimal8;
use tc_reconcile::SnapshotWatermark;
use tokio::sync::Mutex;

#[derive(Clone, Copy, Debug)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

/// Ingress-tuning knobs that would otherwise be magic numbers in the
/// handler. Not reloaded at runtime yet — see `tc_config::RuntimeConfigCache`
/// for the seam a future settings-reload feature would plug into.
#[derive(Clone, Copy, Debug)]
pub struct IngressConfig {
    pub max_alert_age_sec: i64,
}

impl Default for IngressConfig {
    fn default() -> Self {
        Self { max_alert_age_sec: 180 }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub secrets: ResolvedSecrets,
    pub ingress: IngressConfig,
    pub build: BuildInfo,
    pub audit: Arc<Mutex<AuditWriter>>,
    /// The engine's only order-dispatch path in this binary — no live MT5
    /// session is ever opened here (that needs decrypted credentials and a
    /// broker round trip, which this always-on process deliberately avoids;
    /// see `tasks.rs`). Lives for the daemon's uptime, so its bookkeeping
    /// can drift from the database across a restart — `paper_broker_reconcile`
    /// exists to catch exactly that drift.
    pub paper_broker: Arc<Mutex<PaperBroker>>,
    pub reconcile_watermark: Arc<Mutex<SnapshotWatermark>>,
}

impl AppState {
    pub fn new(pool: PgPool, secrets: ResolvedSecrets, ingress: IngressConfig, audit: AuditWriter) -> Self {
        Self {
            pool,
            secrets,
            ingress,
            build: BuildInfo { service: "tc-daemon", version: env!("CARGO_PKG_VERSION") },
            audit: Arc::new(Mutex::new(audit)),
            paper_broker: Arc::new(Mutex::new(PaperBroker::new(5, Decimal8::from_f64(1.0)))),
            reconcile_watermark: Arc::new(Mutex::new(SnapshotWatermark::new())),
        }
    }
}
