use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use fortune_core::{deep_dive, synthesize, DeepDive, FortuneRequest, Reading, Upsell, ValidationError};
use fortune_suggest::{get_reading, ReadingOutcome, ReadingSource};

use crate::{ApiError, AppState};

#[derive(Debug, Serialize)]
pub struct PaidSection {
    pub source: ReadingSource,
    pub reading: Reading,
    pub plan: DeepDive,
}

#[derive(Debug, Serialize)]
pub struct FortuneResponse {
    pub ok: bool,
    pub user: FortuneRequest,
    pub free: Reading,
    pub paid: Option<PaidSection>,
    pub upsell: Upsell,
}

pub(crate) async fn alive() -> Json<Value> {
    Json(json!({
        "ok": true,
        "hint": "API is alive. Use POST with JSON body."
    }))
}

/// Bare `OPTIONS` without CORS request headers.
pub(crate) async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

pub(crate) async fn method_not_allowed() -> ApiError {
    ApiError::Method
}

pub(crate) async fn healthz(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "generation_configured": state.generation_configured,
    }))
}

fn parse_body(body: &Bytes) -> Result<Value, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(json!({}));
    }
    serde_json::from_slice(body).map_err(|_| {
        ApiError::validation(
            ValidationError::NotAnObject,
            Value::String(String::from_utf8_lossy(body).into_owned()),
        )
    })
}

pub(crate) async fn fortune(
    State(state): State<Arc<AppState>>,
    Query(params): Query<Vec<(String, String)>>,
    body: Bytes,
) -> Result<Json<FortuneResponse>, ApiError> {
    if !state.config.verifier.verify(&params) {
        warn!(params = params.len(), "rejected request with invalid proxy signature");
        return Err(ApiError::Auth);
    }

    let body = parse_body(&body)?;
    let request = FortuneRequest::from_body(&body).map_err(|e| ApiError::validation(e, body.clone()))?;

    let free = synthesize(
        &request.birth_date,
        request.birth_time_or_empty(),
        request.birth_city_or_empty(),
    );

    let unlocked = request
        .unlock_code
        .as_deref()
        .is_some_and(|code| state.config.is_unlock_code(code));

    let (paid, upsell) = if unlocked {
        let outcome = match tokio::time::timeout(
            state.config.generation_timeout,
            get_reading(state.generator.as_ref(), &request, &state.catalog),
        )
        .await
        {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(
                    timeout_secs = state.config.generation_timeout.as_secs(),
                    "generation timed out, falling back to local synthesis"
                );
                ReadingOutcome::fallback(&request)
            }
        };
        let plan = deep_dive(&outcome.reading);
        let upsell = Upsell {
            should_offer: false,
            ..outcome.reading.upsell.clone()
        };
        info!(source = ?outcome.source, framing = ?plan.framing, "served unlocked reading");
        let paid = PaidSection {
            source: outcome.source,
            reading: outcome.reading,
            plan,
        };
        (Some(paid), upsell)
    } else {
        if request.unlock_code.is_some() {
            info!("unknown unlock code, serving free tier");
        }
        (None, free.upsell.clone())
    };

    Ok(Json(FortuneResponse {
        ok: true,
        user: request,
        free,
        paid,
        upsell,
    }))
}
