//! Request and response bodies for the daemon's HTTP surface. No business
//! logic lives here — just the wire shapes.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlertWebhookBody {
    pub source: String,
    pub symbol: String,
    pub timeframe: String,
    pub direction: tc_schemas::SignalDirection,
    pub payload: serde_json::Value,
    #[serde(default)]
    pub dedupe_key: Option<String>,
}

/// Body returned on `401`/`422`/`410` — the webhook never retries a
/// rejected alert, so the reason has to be legible to a human reading logs.
#[derive(Debug, Clone, Serialize)]
pub struct AlertRejectedResponse {
    pub error: String,
    pub reason: String,
}

/// Body returned by the success path. The daemon persists the signal and
/// responds `410 Gone` — decisioning happens on the next engine cycle, not
/// synchronously inside the webhook — but still reports what was stored so
/// an operator inspecting logs can correlate the two.
#[derive(Debug, Clone, Serialize)]
pub struct AlertPersistedResponse {
    pub signal_id: Uuid,
    pub deduped: bool,
}
