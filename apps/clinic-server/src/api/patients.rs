// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Patient record endpoints.
//!
//! | Operation | Doctor | Receptionist |
//! |-----------|--------|--------------|
//! | create    | no     | yes          |
//! | view      | yes    | yes          |
//! | update    | yes    | yes          |
//! | delete    | no     | yes          |
//!
//! Each handler admits the caller for its action before the body is
//! deserialized, so a refused role gets 403 whatever it sent.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;

use super::run_blocking;
use crate::{
    auth::{Action, AuthenticatedUser, BearerToken},
    error::ApiError,
    models::{CreatePatientRequest, MessageResponse, PatientEnvelope, UpdatePatientRequest},
    state::AppState,
};

fn admit(state: &AppState, token: &str, action: Action) -> Result<AuthenticatedUser, ApiError> {
    Ok(state.gate.admit(token, action, Utc::now())?)
}

#[utoipa::path(
    post,
    path = "/api/patient",
    tag = "Patients",
    security(("bearer" = [])),
    request_body = CreatePatientRequest,
    responses(
        (status = 201, description = "Patient created", body = PatientEnvelope),
        (status = 400, description = "Invalid body"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Role may not create patients"),
        (status = 409, description = "Email already in use"),
    )
)]
pub async fn create_patient(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    body: Bytes,
) -> Result<(StatusCode, Json<PatientEnvelope>), ApiError> {
    let caller = admit(&state, &token, Action::CreatePatient)?;
    let Json(request) = Json::<CreatePatientRequest>::from_bytes(&body)?;

    let patients = state.patients.clone();
    let patient = run_blocking(move || patients.create(request, caller.role)).await?;
    Ok((StatusCode::CREATED, Json(PatientEnvelope { patient })))
}

#[utoipa::path(
    get,
    path = "/api/patient/{id}",
    tag = "Patients",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Patient record", body = PatientEnvelope),
        (status = 400, description = "Invalid id"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Role may not view patients"),
        (status = 404, description = "Patient not found"),
    )
)]
pub async fn get_patient(
    Path(id): Path<String>,
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> Result<Json<PatientEnvelope>, ApiError> {
    let caller = admit(&state, &token, Action::ViewPatient)?;

    let patients = state.patients.clone();
    let patient = run_blocking(move || patients.get_by_id(&id, caller.role)).await?;
    Ok(Json(PatientEnvelope { patient }))
}

#[utoipa::path(
    put,
    path = "/api/patient/{id}",
    tag = "Patients",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Patient id")),
    request_body = UpdatePatientRequest,
    responses(
        (status = 200, description = "Patient updated", body = PatientEnvelope),
        (status = 400, description = "Invalid id or body"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Role may not update patients"),
        (status = 404, description = "Patient not found"),
        (status = 409, description = "Email already in use"),
    )
)]
pub async fn update_patient(
    Path(id): Path<String>,
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    body: Bytes,
) -> Result<Json<PatientEnvelope>, ApiError> {
    let caller = admit(&state, &token, Action::UpdatePatient)?;
    let Json(request) = Json::<UpdatePatientRequest>::from_bytes(&body)?;

    let patients = state.patients.clone();
    let patient = run_blocking(move || patients.update_by_id(&id, request, caller.role)).await?;
    Ok(Json(PatientEnvelope { patient }))
}

#[utoipa::path(
    delete,
    path = "/api/patient/{id}",
    tag = "Patients",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Patient deleted", body = MessageResponse),
        (status = 400, description = "Invalid id"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Role may not delete patients"),
        (status = 404, description = "Patient not found"),
    )
)]
pub async fn delete_patient(
    Path(id): Path<String>,
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> Result<Json<MessageResponse>, ApiError> {
    let caller = admit(&state, &token, Action::DeletePatient)?;

    let patients = state.patients.clone();
    run_blocking(move || patients.delete_by_id(&id, caller.role)).await?;
    Ok(Json(MessageResponse::new("Patient deleted successfully")))
}
