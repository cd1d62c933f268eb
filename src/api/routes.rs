use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::rsvp::{RsvpRecord, RsvpStats};

use super::{error::ApiError, state::AppState};

/// Header carrying the wipe secret.
pub const ADMIN_PASSWORD_HEADER: &str = "x-admin-password";

/// `POST /api/rsvps` body.
#[derive(Debug, Deserialize)]
pub struct UpsertRequest {
    /// Guest name; blank or missing is rejected.
    pub name: Option<String>,
    /// Missing or null reads as not attending.
    #[serde(default)]
    pub attending: Option<bool>,
    /// Optional dish.
    #[serde(default)]
    pub dish: Option<String>,
}

/// `POST /api/rsvps` success body.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpsertResponse {
    /// Always true.
    pub success: bool,
    /// True when an existing guest was updated.
    pub updated: bool,
}

/// `DELETE /api/rsvps` success body.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SuccessResponse {
    /// Always true.
    pub success: bool,
}

/// `GET /api/rsvps`
pub async fn list_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<RsvpRecord>>, ApiError> {
    let records = state
        .repo
        .list_all()
        .await
        .map_err(|e| ApiError::from_repo(e, "Failed to fetch RSVPs"))?;
    Ok(Json(records))
}

/// `GET /api/rsvps/stats`
pub async fn stats_handler(State(state): State<Arc<AppState>>) -> Result<Json<RsvpStats>, ApiError> {
    let stats = state
        .repo
        .stats()
        .await
        .map_err(|e| ApiError::from_repo(e, "Failed to fetch RSVPs"))?;
    Ok(Json(stats))
}

/// `POST /api/rsvps`
pub async fn upsert_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<UpsertRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UpsertResponse>), ApiError> {
    let Json(req) = payload.map_err(|rejection| {
        debug!(%rejection, "rejected rsvp body");
        ApiError::MalformedPayload
    })?;

    let outcome = state
        .repo
        .upsert(
            req.name.as_deref().unwrap_or_default(),
            req.attending.unwrap_or(false),
            req.dish.as_deref(),
        )
        .await
        .map_err(|e| ApiError::from_repo(e, "Failed to save RSVP"))?;

    let status = if outcome.is_update() {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((
        status,
        Json(UpsertResponse {
            success: true,
            updated: outcome.is_update(),
        }),
    ))
}

/// `DELETE /api/rsvps`
pub async fn wipe_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<SuccessResponse>, ApiError> {
    let supplied = headers
        .get(ADMIN_PASSWORD_HEADER)
        .and_then(|v| v.to_str().ok());

    state
        .repo
        .wipe_all(supplied, &state.admin_password)
        .await
        .map_err(|e| ApiError::from_repo(e, "Failed to wipe RSVPs"))?;
    Ok(Json(SuccessResponse { success: true }))
}
