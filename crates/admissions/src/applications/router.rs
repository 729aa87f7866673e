use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Extension, Router,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::domain::{ApplicationId, ApplicationPatch, ApplicationSubmission};
use super::repository::ApplicationRepository;
use super::service::{AdmissionService, ApplicationServiceError};
use super::status::{GlobalStatus, StatusPatch};
use crate::access::Caller;
use crate::identity::ApplicantId;
use crate::store::RepositoryError;

/// Router builder exposing application intake and review endpoints.
/// Every handler expects the access gate to have attached a [`Caller`].
pub fn application_router<S>(service: Arc<AdmissionService<S>>) -> Router
where
    S: ApplicationRepository + 'static,
{
    Router::new()
        .route(
            "/applications",
            post(submit_handler::<S>).get(list_handler::<S>),
        )
        .route("/applications/me", get(own_application_handler::<S>))
        .route(
            "/applications/user/:user_id",
            get(by_applicant_handler::<S>),
        )
        .route(
            "/applications/status/:application_id",
            put(status_handler::<S>),
        )
        .route(
            "/applications/:id",
            get(get_handler::<S>)
                .put(update_handler::<S>)
                .delete(delete_handler::<S>),
        )
        .route("/applications/:id/report", put(report_handler::<S>))
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListQuery {
    status: Option<GlobalStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ReportOverride {
    report_key: Option<String>,
}

pub(crate) async fn submit_handler<S>(
    State(service): State<Arc<AdmissionService<S>>>,
    Extension(caller): Extension<Caller>,
    axum::Json(submission): axum::Json<ApplicationSubmission>,
) -> Response
where
    S: ApplicationRepository + 'static,
{
    let created = caller.application_id.is_none();
    match service.submit(&caller.account_id, submission) {
        Ok(view) => {
            let status = if created {
                StatusCode::CREATED
            } else {
                StatusCode::OK
            };
            (status, axum::Json(view)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn update_handler<S>(
    State(service): State<Arc<AdmissionService<S>>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
    axum::Json(patch): axum::Json<ApplicationPatch>,
) -> Response
where
    S: ApplicationRepository + 'static,
{
    match service.update(&caller.account_id, &ApplicationId(id), patch) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn own_application_handler<S>(
    State(service): State<Arc<AdmissionService<S>>>,
    Extension(caller): Extension<Caller>,
) -> Response
where
    S: ApplicationRepository + 'static,
{
    match service.get_by_applicant(&caller.account_id) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn get_handler<S>(
    State(service): State<Arc<AdmissionService<S>>>,
    Path(id): Path<Uuid>,
) -> Response
where
    S: ApplicationRepository + 'static,
{
    match service.get(&ApplicationId(id)) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn by_applicant_handler<S>(
    State(service): State<Arc<AdmissionService<S>>>,
    Path(user_id): Path<Uuid>,
) -> Response
where
    S: ApplicationRepository + 'static,
{
    match service.get_by_applicant(&ApplicantId(user_id)) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn list_handler<S>(
    State(service): State<Arc<AdmissionService<S>>>,
    Query(query): Query<ListQuery>,
) -> Response
where
    S: ApplicationRepository + 'static,
{
    match service.list(query.status) {
        Ok(views) => (StatusCode::OK, axum::Json(views)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn status_handler<S>(
    State(service): State<Arc<AdmissionService<S>>>,
    Extension(caller): Extension<Caller>,
    Path(application_id): Path<Uuid>,
    axum::Json(patch): axum::Json<StatusPatch>,
) -> Response
where
    S: ApplicationRepository + 'static,
{
    match service.update_status(&caller.account_id, &ApplicationId(application_id), patch) {
        Ok(status) => (StatusCode::OK, axum::Json(status)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn report_handler<S>(
    State(service): State<Arc<AdmissionService<S>>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
    axum::Json(body): axum::Json<ReportOverride>,
) -> Response
where
    S: ApplicationRepository + 'static,
{
    match service.override_report(&caller.account_id, &ApplicationId(id), body.report_key) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn delete_handler<S>(
    State(service): State<Arc<AdmissionService<S>>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> Response
where
    S: ApplicationRepository + 'static,
{
    match service.delete(&caller.account_id, &ApplicationId(id)) {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: ApplicationServiceError) -> Response {
    let (status, payload) = match &err {
        ApplicationServiceError::Validation(errors) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({
                "error": err.to_string(),
                "fields": errors.fields().collect::<Vec<_>>(),
            }),
        ),
        ApplicationServiceError::Forbidden => {
            (StatusCode::FORBIDDEN, json!({ "error": err.to_string() }))
        }
        ApplicationServiceError::Locked(_) | ApplicationServiceError::RoundClosed(_) => {
            (StatusCode::CONFLICT, json!({ "error": err.to_string() }))
        }
        ApplicationServiceError::Repository(RepositoryError::NotFound) => (
            StatusCode::NOT_FOUND,
            json!({ "error": "application not found" }),
        ),
        ApplicationServiceError::Repository(RepositoryError::Conflict) => (
            StatusCode::CONFLICT,
            json!({ "error": "application already exists" }),
        ),
        ApplicationServiceError::Repository(RepositoryError::Unavailable(_)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": err.to_string() }),
        ),
    };
    (status, axum::Json(payload)).into_response()
}
