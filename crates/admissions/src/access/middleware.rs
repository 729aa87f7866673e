use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::{from_fn_with_state, Next};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::json;
use tracing::warn;

use super::gate::AccessGate;
use crate::identity::ApplicantRepository;

/// Wrap every route already registered on `router` with the access gate.
pub fn with_access_gate<S>(router: Router, gate: Arc<AccessGate<S>>) -> Router
where
    S: ApplicantRepository + 'static,
{
    router.layer(from_fn_with_state(gate, enforce_access::<S>))
}

/// Resolves the caller and inserts it as a request extension, or answers
/// 401/403 without reaching the handler.
pub async fn enforce_access<S>(
    State(gate): State<Arc<AccessGate<S>>>,
    mut request: Request,
    next: Next,
) -> Response
where
    S: ApplicantRepository + 'static,
{
    let authorization = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    let method = request.method().clone();
    let path = request.uri().path().to_owned();

    match gate.authorize(&method, &path, authorization.as_deref()) {
        Ok(Some(caller)) => {
            request.extensions_mut().insert(caller);
            next.run(request).await
        }
        Ok(None) => next.run(request).await,
        Err(err) => {
            let status = err.status_code();
            warn!(%method, %path, %status, reason = %err, "access denied");
            (status, Json(json!({ "error": err.to_string() }))).into_response()
        }
    }
}
