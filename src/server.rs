//! HTTP API surface: generation endpoint, preview endpoint, router assembly.

use crate::cleaner;
use crate::error::ServiceError;
use crate::health;
use crate::metrics::METRICS;
use crate::model::{GenerateResponse, PreviewRequest};
use crate::preview::{self, PreviewError};
use crate::sanitizer;
use crate::state::AppState;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Instant;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/generate", post(generate_handler))
        .route("/api/preview", post(preview_handler))
        .route("/health", get(health::liveness_handler))
        .route("/ready", get(health::readiness_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

async fn metrics_handler() -> (StatusCode, String) {
    (StatusCode::OK, METRICS.encode())
}

struct GenerateOutcome {
    status: &'static str,
    response: Response,
}

/// `POST /api/generate`: prompt in, `{code, warnings?/success?/error?}` out.
pub async fn generate_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let started = Instant::now();
    METRICS.active_requests.inc();
    let outcome = handle_generate(&state, payload).await;
    METRICS.active_requests.dec();

    match outcome {
        Ok(GenerateOutcome { status, response }) => {
            METRICS.record_generate(status, started.elapsed());
            response
        }
        Err(err) => {
            let status = if err.status_code() == StatusCode::BAD_REQUEST {
                "rejected"
            } else {
                "error"
            };
            METRICS.record_generate(status, started.elapsed());
            err.into_response()
        }
    }
}

async fn handle_generate(
    state: &AppState,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<GenerateOutcome, ServiceError> {
    let Json(body) = payload
        .map_err(|_| ServiceError::InvalidPrompt("Invalid JSON in request body".to_string()))?;

    // Prompt shape and length are settled before any outbound call.
    let prompt = match body.get("prompt") {
        Some(Value::String(prompt)) => prompt.clone(),
        _ => {
            return Err(ServiceError::InvalidPrompt(
                "Prompt is required and must be a string".to_string(),
            ));
        }
    };

    let trimmed = prompt.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::InvalidPrompt(
            "Prompt cannot be empty".to_string(),
        ));
    }

    let max_len = state.config().max_prompt_len;
    if prompt.chars().count() > max_len {
        return Err(ServiceError::InvalidPrompt(format!(
            "Prompt must be less than {max_len} characters"
        )));
    }

    tracing::info!(
        prompt_excerpt = %excerpt(trimmed, 50),
        credential_configured = state.config().has_credential(),
        "generate request"
    );

    let result = state.client().generate(trimmed).await;
    if let Some(error) = result.error {
        return Ok(GenerateOutcome {
            status: "error",
            response: (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(GenerateResponse::failure(error)),
            )
                .into_response(),
        });
    }

    // Validation runs over the raw generated code; the caller always gets
    // the cleaned text back.
    let clean_code = cleaner::clean(&result.code);
    let validation = sanitizer::validate_generated_code(&result.code);
    tracing::debug!(
        code_len = clean_code.len(),
        valid = validation.is_valid,
        "generation complete"
    );

    if !validation.is_valid {
        tracing::warn!(
            summary = %sanitizer::warning_summary(&validation.errors),
            "code validation failed"
        );
        METRICS.validation_failures_total.inc();
        return Ok(GenerateOutcome {
            status: "degraded",
            response: (
                StatusCode::OK,
                Json(GenerateResponse::degraded(clean_code, validation.errors)),
            )
                .into_response(),
        });
    }

    Ok(GenerateOutcome {
        status: "success",
        response: (StatusCode::OK, Json(GenerateResponse::success(clean_code))).into_response(),
    })
}

/// `POST /api/preview`: component source in, sandbox-ready document out.
pub async fn preview_handler(payload: Result<Json<PreviewRequest>, JsonRejection>) -> Response {
    let Ok(Json(request)) = payload else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Invalid JSON in request body" })),
        )
            .into_response();
    };

    match preview::build_preview(&request.code) {
        Ok(document) => {
            METRICS.previews_built_total.inc();
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "text/html; charset=utf-8"),
                    // The document executes untrusted scripts; it must never
                    // run with the host origin's privileges, even when loaded
                    // outside the intended iframe.
                    (header::CONTENT_SECURITY_POLICY, "sandbox allow-scripts"),
                ],
                document,
            )
                .into_response()
        }
        Err(err @ PreviewError::UnsafeCode) => {
            METRICS.previews_rejected_total.inc();
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": err.to_string() })),
            )
                .into_response()
        }
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": ServiceError::Internal(err.to_string()).to_string() })),
        )
            .into_response(),
    }
}

fn excerpt(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}
