use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{ApplicationId, ClassId, InstitutionId, NationalId};
use super::service::{AdmissionService, AdmissionServiceError};
use super::store::AdmissionStore;

/// Router builder exposing the engine's HTTP endpoints.
pub fn admission_router<S>(service: Arc<AdmissionService<S>>) -> Router
where
    S: AdmissionStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/admissions/institutions/:institution_id/lottery",
            post(run_lottery_handler::<S>),
        )
        .route(
            "/api/v1/admissions/institutions/:institution_id/lottery/reset",
            post(reset_lottery_handler::<S>),
        )
        .route(
            "/api/v1/admissions/institutions/:institution_id/waitlist/orders",
            post(assign_order_handler::<S>),
        )
        .route(
            "/api/v1/admissions/institutions/:institution_id/statistics",
            get(statistics_handler::<S>),
        )
        .route(
            "/api/v1/admissions/applications/:application_id/manual-admissions",
            post(manual_admit_handler::<S>),
        )
        .route(
            "/api/v1/admissions/applications/:application_id/cancellations",
            post(cancel_handler::<S>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub struct AssignOrderRequest {
    pub application_id: String,
    pub national_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ManualAdmitRequest {
    pub national_id: String,
    pub class_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CancellationRequest {
    pub national_id: String,
    pub reason: String,
}

pub(crate) async fn run_lottery_handler<S>(
    State(service): State<Arc<AdmissionService<S>>>,
    Path(institution_id): Path<String>,
) -> Response
where
    S: AdmissionStore + 'static,
{
    match service.run_lottery(&InstitutionId(institution_id)) {
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn reset_lottery_handler<S>(
    State(service): State<Arc<AdmissionService<S>>>,
    Path(institution_id): Path<String>,
) -> Response
where
    S: AdmissionStore + 'static,
{
    match service.reset_lottery(&InstitutionId(institution_id)) {
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn assign_order_handler<S>(
    State(service): State<Arc<AdmissionService<S>>>,
    Path(institution_id): Path<String>,
    axum::Json(request): axum::Json<AssignOrderRequest>,
) -> Response
where
    S: AdmissionStore + 'static,
{
    match service.assign_next_order(
        &InstitutionId(institution_id),
        &ApplicationId(request.application_id),
        &NationalId(request.national_id),
    ) {
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn statistics_handler<S>(
    State(service): State<Arc<AdmissionService<S>>>,
    Path(institution_id): Path<String>,
) -> Response
where
    S: AdmissionStore + 'static,
{
    match service.statistics(&InstitutionId(institution_id)) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn manual_admit_handler<S>(
    State(service): State<Arc<AdmissionService<S>>>,
    Path(application_id): Path<String>,
    axum::Json(request): axum::Json<ManualAdmitRequest>,
) -> Response
where
    S: AdmissionStore + 'static,
{
    match service.manual_admit(
        &ApplicationId(application_id),
        &NationalId(request.national_id),
        &ClassId(request.class_id),
    ) {
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn cancel_handler<S>(
    State(service): State<Arc<AdmissionService<S>>>,
    Path(application_id): Path<String>,
    axum::Json(request): axum::Json<CancellationRequest>,
) -> Response
where
    S: AdmissionStore + 'static,
{
    match service.cancel_participant(
        &ApplicationId(application_id),
        &NationalId(request.national_id),
        &request.reason,
    ) {
        Ok(applicant) => (StatusCode::OK, axum::Json(applicant.view())).into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: AdmissionServiceError) -> Response {
    let status = match &error {
        AdmissionServiceError::InstitutionNotFound(_)
        | AdmissionServiceError::ApplicantNotFound
        | AdmissionServiceError::ParticipantNotFound
        | AdmissionServiceError::ClassNotFound(_) => StatusCode::NOT_FOUND,
        AdmissionServiceError::ClassFull(_) | AdmissionServiceError::AlreadyCancelled => {
            StatusCode::CONFLICT
        }
        AdmissionServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        AdmissionServiceError::OrderingInconsistent(_) | AdmissionServiceError::Store(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let payload = json!({
        "success": false,
        "message": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
