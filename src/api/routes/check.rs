//! Batch check handlers.

use super::{CancelRequest, CheckRequest, CheckResponse};
use crate::api::AppState;
use crate::error::Error;
use crate::normalize::split_identifier_list;
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// POST /check - Check a package list against every source
#[utoipa::path(
    post,
    path = "/check",
    tag = "check",
    request_body = CheckRequest,
    responses(
        (status = 200, description = "One record per normalized identifier", body = CheckResponse),
        (status = 400, description = "Empty or oversized package list", body = crate::error::ApiError),
        (status = 409, description = "A newer check of the same session replaced this one", body = crate::error::ApiError),
        (status = 502, description = "A required source failed", body = crate::error::ApiError),
        (status = 504, description = "A required source timed out", body = crate::error::ApiError)
    )
)]
pub async fn check_packages(
    State(state): State<AppState>,
    Json(request): Json<CheckRequest>,
) -> Response {
    let identifiers: Vec<String> = request
        .packages
        .iter()
        .flat_map(|entry| split_identifier_list(entry))
        .collect();

    if identifiers.is_empty() {
        return Error::InvalidInput("no packages given".to_string()).into_response();
    }
    let limit = state.config.api.max_packages_per_request;
    if identifiers.len() > limit {
        return Error::InvalidInput(format!(
            "{} packages given, at most {limit} allowed per request",
            identifiers.len()
        ))
        .into_response();
    }

    let session = request.session.as_deref().filter(|s| !s.is_empty());
    match state
        .checker
        .check_packages_in(session, &identifiers)
        .await
    {
        Ok(report) => {
            let upgrade = request
                .runtime_version
                .as_deref()
                .and_then(|current| report.upgrade_advice(current));
            (StatusCode::OK, Json(CheckResponse { report, upgrade })).into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "package check failed");
            e.into_response()
        }
    }
}

/// POST /check/cancel - Abandon a check in flight
#[utoipa::path(
    post,
    path = "/check/cancel",
    tag = "check",
    request_body = CancelRequest,
    responses(
        (status = 204, description = "Matching check (if any) cancelled"),
        (status = 400, description = "Neither session nor batch id given", body = crate::error::ApiError)
    )
)]
pub async fn cancel_check(
    State(state): State<AppState>,
    Json(request): Json<CancelRequest>,
) -> Response {
    let cancelled = match (request.batch_id, request.session.as_deref()) {
        (Some(batch), _) => state.checker.cancel_batch(batch),
        (None, Some(session)) => state.checker.cancel_session(session),
        (None, None) => {
            return Error::InvalidInput("session or batch_id required".to_string())
                .into_response();
        }
    };
    tracing::debug!(cancelled, "cancel request handled");
    StatusCode::NO_CONTENT.into_response()
}

/// POST /manifest - Extract checkable identifiers from a package manifest
#[utoipa::path(
    post,
    path = "/manifest",
    tag = "check",
    request_body(content = String, description = "Raw package manifest JSON", content_type = "application/json"),
    responses(
        (status = 200, description = "Identifiers and runtime version", body = crate::normalize::ManifestPackages),
        (status = 422, description = "Manifest unreadable or without dependencies", body = crate::error::ApiError)
    )
)]
pub async fn parse_manifest(State(state): State<AppState>, body: String) -> Response {
    match state.checker.parse_manifest(&body) {
        Ok(manifest) => (StatusCode::OK, Json(manifest)).into_response(),
        Err(e) => e.into_response(),
    }
}
