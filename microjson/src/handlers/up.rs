use axum::{extract::State, Json};
use serde::Serialize;

use crate::{state::ServiceInfo, types::DateTime};

#[derive(Debug, Serialize)]
pub struct UpResponse {
    pub status: &'static str,
    pub version: String,
    pub booted: DateTime,
    pub uptime: f64,
    pub hostname: String,
}

/// Liveness and version report.
pub async fn up(State(info): State<ServiceInfo>) -> Json<UpResponse> {
    Json(UpResponse {
        status: "OK",
        version: info.version.clone(),
        booted: info.booted,
        uptime: info.uptime_seconds(),
        hostname: info.hostname.clone(),
    })
}
