//! Axum router and handlers for tc-daemon. `build_router` is the single
//! entry point; `main.rs` attaches middleware on top of it so the scenario
//! tests in `tests/` can exercise the bare router.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::api_types::{AlertPersistedResponse, AlertRejectedResponse, AlertWebhookBody, HealthResponse};
use crate::auth::{verify_alert_auth, SIGNATURE_HEADER, TOKEN_HEADER};
use crate::dedupe::{canonical_json, compute_dedupe_key};
use crate::state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/health", get(health))
        .route("/alerts/webhook/", post(alerts_webhook))
        .with_state(state)
}

async fn health(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { ok: true, service: st.build.service, version: st.build.version }))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name)?.to_str().ok()
}

fn rejected(status: StatusCode, reason: &str) -> Response {
    (status, Json(AlertRejectedResponse { error: "alert rejected".to_string(), reason: reason.to_string() })).into_response()
}

/// `POST /alerts/webhook/` — persists the signal and nothing more.
/// Decisioning happens on the engine's own cycle, not inline here, so a
/// caller waiting on this response learns only that the alert was stored
/// (or why it wasn't), never whether a trade resulted from it.
async fn alerts_webhook(State(st): State<Arc<AppState>>, headers: HeaderMap, body: Bytes) -> Response {
    if let Err(failure) = verify_alert_auth(
        st.secrets.alert_shared_token.as_deref(),
        st.secrets.alert_hmac_secret.as_deref(),
        header_str(&headers, TOKEN_HEADER),
        header_str(&headers, SIGNATURE_HEADER),
        &body,
    ) {
        warn!(reason = %failure, "alerts_webhook auth rejected");
        return rejected(StatusCode::UNAUTHORIZED, &failure.to_string());
    }

    let parsed: AlertWebhookBody = match serde_json::from_slice(&body) {
        Ok(b) => b,
        Err(e) => return rejected(StatusCode::UNPROCESSABLE_ENTITY, &format!("invalid_body: {e}")),
    };

    let now = Utc::now();
    if let Some(bar_time_ms) = parsed.payload.pointer("/bar/time").and_then(|v| v.as_i64()) {
        let age_sec = (now.timestamp_millis() - bar_time_ms) / 1000;
        if age_sec > st.ingress.max_alert_age_sec {
            return rejected(StatusCode::UNPROCESSABLE_ENTITY, "stale_alert");
        }
    }

    let canonical_payload = canonical_json(&parsed.payload);
    let dedupe_key = compute_dedupe_key(parsed.dedupe_key.as_deref(), &canonical_payload, st.secrets.alert_hmac_secret.as_deref());

    let signal = tc_schemas::Signal {
        id: Uuid::new_v4(),
        source: parsed.source,
        symbol: parsed.symbol,
        timeframe: parsed.timeframe,
        direction: parsed.direction,
        payload: parsed.payload,
        dedupe_key,
        bot_id: None,
        created_at: now,
    };

    match tc_db::insert_signal_deduped(&st.pool, &signal).await {
        Ok(inserted) => {
            let deduped = inserted.is_none();
            info!(signal_id = %signal.id, symbol = %signal.symbol, deduped, "alerts_webhook persisted");
            // The endpoint is deprecated in favor of a future direct-to-decision
            // path; 410 tells integrations the body was accepted but the
            // resource (synchronous decisioning) no longer lives here.
            (StatusCode::GONE, Json(AlertPersistedResponse { signal_id: signal.id, deduped })).into_response()
        }
        Err(e) => {
            let mut audit = st.audit.lock().await;
            let _ = audit.task_failure("alerts_webhook", &e.to_string());
            warn!(error = %e, "alerts_webhook persist failed");
            rejected(StatusCode::INTERNAL_SERVER_ERROR, "persist_failed")
        }
    }
}
