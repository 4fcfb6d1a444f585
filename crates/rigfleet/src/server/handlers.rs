//! Route handlers. Each one is a thin shim over a `Fleet` operation.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::{Value, json};

use rigfleet_core::{DeviceRecord, DeviceTransport, DeviceView, PushOutcome};

use super::AppState;
use super::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct AddDeviceRequest {
    pub address: String,
}

#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    pub subnet: String,
}

// ── Health ──────────────────────────────────────────────────────────

pub async fn health<T: DeviceTransport>(
    State(state): State<AppState<T>>,
) -> Result<Json<Value>, ApiError> {
    let tracked = state.fleet.registry().list_tracked()?.len();
    Ok(Json(json!({ "status": "ok", "tracked": tracked })))
}

// ── Devices ─────────────────────────────────────────────────────────

/// `GET /api/devices`: probe and reconcile every tracked device.
pub async fn list_devices<T: DeviceTransport>(
    State(state): State<AppState<T>>,
) -> Result<Json<Vec<DeviceView>>, ApiError> {
    Ok(Json(state.fleet.list_devices().await?))
}

/// `POST /api/devices`: track and probe once.
///
/// 201 when the device answered; 404 when it was tracked but did not.
pub async fn add_device<T: DeviceTransport>(
    State(state): State<AppState<T>>,
    payload: Result<Json<AddDeviceRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = payload?;
    let added = state.fleet.add_device(&req.address).await?;

    if added.is_online() {
        Ok((StatusCode::CREATED, Json(added.device)).into_response())
    } else {
        let body = json!({
            "error": "Device added, but it appears to be offline.",
            "device": added.device,
        });
        Ok((StatusCode::NOT_FOUND, Json(body)).into_response())
    }
}

/// `GET /api/devices/{address}`: stored record, no probe.
pub async fn get_device<T: DeviceTransport>(
    State(state): State<AppState<T>>,
    Path(address): Path<String>,
) -> Result<Json<DeviceRecord>, ApiError> {
    state
        .fleet
        .device(&address)?
        .map(Json)
        .ok_or(ApiError::NotFound(address))
}

/// `DELETE /api/devices/{address}`: idempotent.
pub async fn remove_device<T: DeviceTransport>(
    State(state): State<AppState<T>>,
    Path(address): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let removed = state.fleet.remove_device(&address).await?;
    Ok(Json(json!({ "success": true, "removed": removed })))
}

// ── Discovery ───────────────────────────────────────────────────────

/// `POST /api/scan`: devices in the subnet that answered.
pub async fn scan<T: DeviceTransport>(
    State(state): State<AppState<T>>,
    payload: Result<Json<ScanRequest>, JsonRejection>,
) -> Result<Json<Vec<DeviceView>>, ApiError> {
    let Json(req) = payload?;
    let report = state.fleet.scan(&req.subnet).await?;
    Ok(Json(report.online))
}

// ── Settings push ───────────────────────────────────────────────────

/// `POST /api/devices/update` (alias `/api/update-all`): one entry per
/// tracked device.
pub async fn push_settings<T: DeviceTransport>(
    State(state): State<AppState<T>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Vec<PushOutcome>>, ApiError> {
    let Json(body) = payload?;
    let report = state.fleet.push(&body).await?;
    Ok(Json(report.into_entries()))
}
