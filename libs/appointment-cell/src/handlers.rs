use std::sync::Arc;

use axum::{
    extract::{Path, Query, State, Extension},
    http::StatusCode,
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use serde_json::{json, Value};
use uuid::Uuid;

use patient_cell::services::PatientService;
use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_models::pagination::{Pagination, SortOrder};

use crate::models::{
    AppointmentError, AppointmentListQuery, AppointmentSortField, BookAppointmentQuery,
    BookAppointmentRequest, CreatePrescriptionRequest,
};
use crate::services::{AppointmentService, BookingService, SupabaseBookingRepository};

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::NotFound
            | AppointmentError::DoctorNotFound
            | AppointmentError::PatientNotFound
            | AppointmentError::SlotNotAvailable => AppError::NotFound(err.to_string()),
            AppointmentError::ConflictDetected => AppError::Conflict(err.to_string()),
            AppointmentError::ValidationError(msg) => AppError::ValidationError(msg),
            AppointmentError::DatabaseError(msg) => AppError::Database(msg),
            AppointmentError::AlreadyBookedWithDoctor
            | AppointmentError::InvalidDateRange
            | AppointmentError::InvalidSortField => AppError::BadRequest(err.to_string()),
        }
    }
}

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Query(query): Query<BookAppointmentQuery>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let repository = SupabaseBookingRepository::new(&state, auth.token());

    let appointment = BookingService::new(&repository)
        .book_appointment(&user.id, query.doctor_id, &request)
        .await?;

    Ok((StatusCode::CREATED, Json(json!({
        "message": "Appointment with doctor is booked successfully",
        "status": appointment.status.to_string(),
        "data": appointment
    }))))
}

#[axum::debug_handler]
pub async fn list_patient_appointments(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Query(query): Query<AppointmentListQuery>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    let patient = PatientService::new(&state)
        .find_patient_by_user_id(&user.id, token)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .ok_or(AppointmentError::PatientNotFound)?;

    let date_range = query.date_range()?;
    let sort = match query.sortby.as_deref() {
        Some(raw) => {
            let field = AppointmentSortField::parse(raw).ok_or(AppointmentError::InvalidSortField)?;
            Some((field, SortOrder::from_param(query.sortorder.as_deref())))
        }
        None => None,
    };
    let pagination = Pagination::new(query.page, query.page_size, state.default_page_size);

    let appointments = AppointmentService::new(&state)
        .list_patient_appointments(patient.id, &query, date_range, sort, pagination, token)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(Json(json!({
        "data": appointments,
        "page": pagination.page,
        "page_size": pagination.page_size,
        "count": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn create_prescription(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<CreatePrescriptionRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let token = auth.token();
    request.validate()?;

    let service = AppointmentService::new(&state);
    service.get_appointment(appointment_id, token)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .ok_or(AppointmentError::NotFound)?;

    let prescription = service.create_prescription(appointment_id, &request, token)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    Ok((StatusCode::CREATED, Json(json!({
        "message": "prescription added successfully in the appointment",
        "data": prescription
    }))))
}
