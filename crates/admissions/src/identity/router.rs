use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use serde_json::json;

use super::repository::ApplicantRepository;
use super::service::{Credentials, IdentityError, IdentityService};
use crate::access::Caller;
use crate::store::RepositoryError;

/// Signup, login, and self-service account endpoints.
pub fn identity_router<S>(service: Arc<IdentityService<S>>) -> Router
where
    S: ApplicantRepository + 'static,
{
    Router::new()
        .route("/auth/signup", post(signup_handler::<S>))
        .route("/auth/login", post(login_handler::<S>))
        .route(
            "/auth/me",
            get(profile_handler::<S>).delete(delete_account_handler::<S>),
        )
        .with_state(service)
}

pub(crate) async fn signup_handler<S>(
    State(service): State<Arc<IdentityService<S>>>,
    Json(credentials): Json<Credentials>,
) -> Response
where
    S: ApplicantRepository + 'static,
{
    match service.signup(credentials) {
        Ok(session) => (StatusCode::CREATED, Json(session)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn login_handler<S>(
    State(service): State<Arc<IdentityService<S>>>,
    Json(credentials): Json<Credentials>,
) -> Response
where
    S: ApplicantRepository + 'static,
{
    match service.login(credentials) {
        Ok(session) => (StatusCode::OK, Json(session)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn profile_handler<S>(
    State(service): State<Arc<IdentityService<S>>>,
    Extension(caller): Extension<Caller>,
) -> Response
where
    S: ApplicantRepository + 'static,
{
    match service.profile(&caller.account_id) {
        Ok(account) => (StatusCode::OK, Json(account)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn delete_account_handler<S>(
    State(service): State<Arc<IdentityService<S>>>,
    Extension(caller): Extension<Caller>,
) -> Response
where
    S: ApplicantRepository + 'static,
{
    match service.delete_account(&caller.account_id) {
        Ok(account) => (StatusCode::OK, Json(account)).into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: IdentityError) -> Response {
    let status = match &err {
        IdentityError::InvalidEmail | IdentityError::WeakPassword(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        IdentityError::EmailTaken | IdentityError::Repository(RepositoryError::Conflict) => {
            StatusCode::CONFLICT
        }
        IdentityError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        IdentityError::NotFound | IdentityError::Repository(RepositoryError::NotFound) => {
            StatusCode::NOT_FOUND
        }
        IdentityError::Hashing(_)
        | IdentityError::Token(_)
        | IdentityError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}
