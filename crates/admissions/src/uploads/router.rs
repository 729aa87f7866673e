use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Extension, Json, Router,
};
use serde_json::json;

use super::policy::{UploadRejection, UploadRequest};
use super::service::UploadAuthorizationService;
use super::signer::UploadSigner;
use crate::access::Caller;

pub fn upload_router<G>(service: Arc<UploadAuthorizationService<G>>) -> Router
where
    G: UploadSigner + 'static,
{
    Router::new()
        .route("/media/signed-url", post(signed_url_handler::<G>))
        .with_state(service)
}

pub(crate) async fn signed_url_handler<G>(
    State(service): State<Arc<UploadAuthorizationService<G>>>,
    Extension(caller): Extension<Caller>,
    Json(request): Json<UploadRequest>,
) -> Response
where
    G: UploadSigner + 'static,
{
    match service.authorize(&caller.account_id, request).await {
        Ok(credential) => (StatusCode::CREATED, Json(credential)).into_response(),
        Err(rejection) => {
            let status = match rejection {
                UploadRejection::Signing(_) => StatusCode::BAD_GATEWAY,
                _ => StatusCode::BAD_REQUEST,
            };
            let payload = json!({
                "error": rejection.to_string(),
                "reason": rejection.reason(),
            });
            (status, Json(payload)).into_response()
        }
    }
}
