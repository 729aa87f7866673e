use crate::infra::{AppState, Services};
use admissions::access::with_access_gate;
use admissions::applications::application_router;
use admissions::identity::identity_router;
use admissions::uploads::{upload_router, UploadSigner};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde_json::json;

/// Every public and gated route, wrapped by the access gate.
pub(crate) fn with_admission_routes<G>(services: &Services<G>) -> Router
where
    G: UploadSigner + 'static,
{
    let router = Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .merge(identity_router(services.identity.clone()))
        .merge(application_router(services.admissions.clone()))
        .merge(upload_router(services.uploads.clone()));

    with_access_gate(router, services.gate.clone())
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
