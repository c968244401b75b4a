use std::sync::Arc;
use axum::{
    extract::{Path, Query, State, Extension},
    http::StatusCode,
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_models::pagination::{Pagination, SortOrder};
use shared_utils::extractor::require_admin;

use crate::models::{PatientError, PatientListQuery, PatientProfileRequest, PatientSortField};
use crate::services::PatientService;

impl From<PatientError> for AppError {
    fn from(err: PatientError) -> Self {
        match err {
            PatientError::NotFound => AppError::NotFound(err.to_string()),
            PatientError::ValidationError(msg) => AppError::ValidationError(msg),
            _ => AppError::BadRequest(err.to_string()),
        }
    }
}

#[axum::debug_handler]
pub async fn create_patient(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<PatientProfileRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    request.validate()?;
    let service = PatientService::new(&config);

    let account = service.get_user_account(&user.id, auth.token())
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .ok_or(PatientError::UserProfileMissing)?;

    let patient = service.create_patient(&account, &request, auth.token())
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    Ok((StatusCode::CREATED, Json(json!({
        "message": "Patient profile is saved successfully",
        "data": patient
    }))))
}

#[axum::debug_handler]
pub async fn get_patient(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let patient = PatientService::new(&config)
        .get_patient(patient_id, auth.token())
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .ok_or(PatientError::NotFound)?;

    Ok(Json(json!({ "data": patient })))
}

#[axum::debug_handler]
pub async fn update_patient(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(patient_id): Path<Uuid>,
    Json(request): Json<PatientProfileRequest>,
) -> Result<Json<Value>, AppError> {
    request.validate()?;

    let patient = PatientService::new(&config)
        .update_patient(patient_id, &request, auth.token())
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .ok_or(PatientError::NotFound)?;

    Ok(Json(json!({
        "message": "patient record is updated successfully",
        "data": patient
    })))
}

#[axum::debug_handler]
pub async fn delete_patient(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user, "delete patient records")?;

    let deleted = PatientService::new(&config)
        .delete_patient(patient_id, auth.token())
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    if !deleted {
        return Err(PatientError::NotFound.into());
    }

    info!("Patient {} deleted by {}", patient_id, user.id);
    Ok(Json(json!({ "message": "patient record is deleted successfully" })))
}

#[axum::debug_handler]
pub async fn list_patients(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(query): Query<PatientListQuery>,
) -> Result<Json<Value>, AppError> {
    let dob_range = query.dob_range()?;
    let sort = match query.sortby.as_deref() {
        Some(raw) => {
            let field = PatientSortField::parse(raw).ok_or(PatientError::InvalidSortField)?;
            Some((field, SortOrder::from_param(query.sortorder.as_deref())))
        }
        None => None,
    };
    let pagination = Pagination::new(query.page, query.page_size, config.default_page_size);

    let patients = PatientService::new(&config)
        .list_patients(&query, dob_range, sort, pagination, auth.token())
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(Json(json!({
        "data": patients,
        "page": pagination.page,
        "page_size": pagination.page_size,
        "count": patients.len()
    })))
}
