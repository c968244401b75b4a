use std::sync::Arc;

use axum::{
    extract::{Extension, Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_models::pagination::{Pagination, SortOrder};
use shared_utils::extractor::require_admin;

use crate::models::{
    CreateSlotRequest, DoctorError, DoctorListQuery, DoctorProfileRequest, DoctorSortField,
};
use crate::services::{
    availability::AvailabilityService,
    bulk_upload::{self, BulkUploadError, UploadedFile},
    doctor::DoctorService,
    repository::SupabaseSlotRepository,
};

/// Multipart field carrying the spreadsheet.
pub const UPLOAD_FIELD: &str = "upload_file";

impl From<DoctorError> for AppError {
    fn from(err: DoctorError) -> Self {
        match err {
            DoctorError::NotFound => AppError::NotFound(err.to_string()),
            DoctorError::UserProfileMissing
            | DoctorError::InvalidSortField => AppError::BadRequest(err.to_string()),
            DoctorError::ValidationError(msg) => AppError::ValidationError(msg),
        }
    }
}

#[axum::debug_handler]
pub async fn create_doctor(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<DoctorProfileRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let token = auth.token();
    request.validate()?;

    let doctor_service = DoctorService::new(&state);

    let account = doctor_service.get_user_account(&user.id, token).await
        .map_err(|e| AppError::Database(e.to_string()))?
        .ok_or(DoctorError::UserProfileMissing)?;

    let doctor = doctor_service.create_doctor(&account, &request, token).await
        .map_err(|e| AppError::Database(e.to_string()))?;

    Ok((StatusCode::CREATED, Json(json!({
        "message": "doctor profile is saved successfully",
        "data": doctor
    }))))
}

#[axum::debug_handler]
pub async fn list_doctors(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(query): Query<DoctorListQuery>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    let sort = match query.sortby.as_deref() {
        Some(raw) => {
            let field = DoctorSortField::parse(raw).ok_or(DoctorError::InvalidSortField)?;
            Some((field, SortOrder::from_param(query.sortorder.as_deref())))
        }
        None => None,
    };
    let pagination = Pagination::new(query.page, query.page_size, state.default_page_size);

    let doctors = DoctorService::new(&state)
        .list_doctors(&query, sort, pagination, token).await
        .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(Json(json!({
        "data": doctors,
        "page": pagination.page,
        "page_size": pagination.page_size,
        "count": doctors.len()
    })))
}

#[axum::debug_handler]
pub async fn get_doctor(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let doctor = DoctorService::new(&state)
        .get_doctor(doctor_id, auth.token()).await
        .map_err(|e| AppError::Database(e.to_string()))?
        .ok_or(DoctorError::NotFound)?;

    Ok(Json(json!({ "data": doctor })))
}

#[axum::debug_handler]
pub async fn update_doctor(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<DoctorProfileRequest>,
) -> Result<Json<Value>, AppError> {
    request.validate()?;

    let doctor = DoctorService::new(&state)
        .update_doctor(doctor_id, &request, auth.token()).await
        .map_err(|e| AppError::Database(e.to_string()))?
        .ok_or(DoctorError::NotFound)?;

    Ok(Json(json!({
        "message": "doctor profile is updated successfully",
        "data": doctor
    })))
}

#[axum::debug_handler]
pub async fn delete_doctor(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user, "delete doctor profiles")?;

    let deleted = DoctorService::new(&state)
        .delete_doctor(doctor_id, auth.token()).await
        .map_err(|e| AppError::Database(e.to_string()))?;
    if !deleted {
        return Err(DoctorError::NotFound.into());
    }

    info!("Doctor {} deleted by {}", doctor_id, user.id);
    Ok(Json(json!({ "message": "doctor's record deleted successfully" })))
}

#[axum::debug_handler]
pub async fn create_slot(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateSlotRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let token = auth.token();
    require_admin(&user, "create availability slots")?;

    if request.end_time <= request.start_time {
        return Err(AppError::BadRequest("end_time must be after start_time".to_string()));
    }

    DoctorService::new(&state)
        .get_doctor(doctor_id, token).await
        .map_err(|e| AppError::Database(e.to_string()))?
        .ok_or(DoctorError::NotFound)?;

    let slot = AvailabilityService::new(&state)
        .create_slot(doctor_id, &request, token).await
        .map_err(|e| AppError::Database(e.to_string()))?;

    Ok((StatusCode::CREATED, Json(json!({
        "message": "Time slot for doctor availability is created successfully",
        "data": slot
    }))))
}

#[axum::debug_handler]
pub async fn bulk_upload_slots(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Value>), BulkUploadError> {
    require_admin(&user, "upload doctor availability")?;

    let file = read_upload_field(&mut multipart).await?;
    debug!("Bulk upload of {} ({} bytes) by {}", file.file_name, file.size(), user.id);

    let repository = SupabaseSlotRepository::new(&state, auth.token());
    let created = bulk_upload::process_upload(&file, state.max_upload_bytes, &repository, &repository).await?;

    Ok((StatusCode::CREATED, Json(json!({
        "message": "Data for doctor availability is uploaded successfully",
        "created": created
    }))))
}

async fn read_upload_field(multipart: &mut Multipart) -> Result<UploadedFile, BulkUploadError> {
    while let Some(field) = multipart.next_field().await
        .map_err(|e| BulkUploadError::InputRejected(e.body_text()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await
            .map_err(|e| BulkUploadError::InputRejected(e.body_text()))?;
        return Ok(UploadedFile::new(file_name, bytes.to_vec()));
    }

    Err(BulkUploadError::InputRejected(format!("{} is required", UPLOAD_FIELD)))
}
