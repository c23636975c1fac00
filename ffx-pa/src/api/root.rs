//! Service descriptor at `/`

use axum::{routing::get, Json, Router};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub message: String,
    pub version: String,
    pub endpoints: BTreeMap<&'static str, &'static str>,
}

/// GET /
pub async fn service_info() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        message: "Francoflex Pronunciation API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        endpoints: BTreeMap::from([
            ("health", "/health"),
            ("pronunciation_analysis", "/pronunciation_analysis"),
        ]),
    })
}

pub fn root_routes() -> Router<AppState> {
    Router::new().route("/", get(service_info))
}
