use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use shared_models::formats::{dmy_date, hm_time, parse_date};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppointmentStatus {
    #[serde(rename = "B", alias = "BOOKED")]
    Booked,
    #[serde(rename = "C", alias = "CANCELLED")]
    Cancelled,
}

impl AppointmentStatus {
    pub fn code(&self) -> &'static str {
        match self {
            AppointmentStatus::Booked => "B",
            AppointmentStatus::Cancelled => "C",
        }
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppointmentStatus::Booked => write!(f, "BOOKED"),
            AppointmentStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub doctor_username: String,
    pub patient_username: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
}

/// Row to insert into `appointments`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewAppointment {
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub doctor_username: String,
    pub patient_username: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookAppointmentQuery {
    pub doctor_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    #[serde(with = "dmy_date")]
    pub date: NaiveDate,
    #[serde(with = "hm_time")]
    pub time: NaiveTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppointmentSortField {
    Date,
    Status,
    DoctorUsername,
    PatientUsername,
    CreatedAt,
}

impl AppointmentSortField {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "date" => Some(Self::Date),
            "status" => Some(Self::Status),
            "doctor_username" => Some(Self::DoctorUsername),
            "patient_username" => Some(Self::PatientUsername),
            "created_at" => Some(Self::CreatedAt),
            _ => None,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Status => "status",
            Self::DoctorUsername => "doctor_username",
            Self::PatientUsername => "patient_username",
            Self::CreatedAt => "created_at",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppointmentListQuery {
    pub specialization: Option<String>,
    /// Doctor username.
    pub doctor: Option<String>,
    pub status: Option<AppointmentStatus>,
    pub min_date: Option<String>,
    pub max_date: Option<String>,
    pub sortby: Option<String>,
    pub sortorder: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl AppointmentListQuery {
    /// Inclusive date window, applied only when both bounds are given.
    pub fn date_range(&self) -> Result<Option<(NaiveDate, NaiveDate)>, AppointmentError> {
        match (self.min_date.as_deref(), self.max_date.as_deref()) {
            (Some(min), Some(max)) if !min.is_empty() && !max.is_empty() => {
                let min = parse_date(min).ok_or(AppointmentError::InvalidDateRange)?;
                let max = parse_date(max).ok_or(AppointmentError::InvalidDateRange)?;
                Ok(Some((min, max)))
            }
            _ => Ok(None),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prescription {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub notes: String,
    pub medications: String,
    pub issued_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePrescriptionRequest {
    pub notes: String,
    pub medications: String,
}

impl CreatePrescriptionRequest {
    pub fn validate(&self) -> Result<(), AppointmentError> {
        if self.notes.trim().is_empty() || self.medications.trim().is_empty() {
            return Err(AppointmentError::ValidationError(
                "notes and medications cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment not found by provided appointment_id")]
    NotFound,

    #[error("Doctor's record not found by provided p.k")]
    DoctorNotFound,

    #[error("Patient's record not found by provided p.k")]
    PatientNotFound,

    #[error("Time slot is not available for the appointment")]
    SlotNotAvailable,

    #[error("Appointment is already booked with the selected doctor at given date")]
    AlreadyBookedWithDoctor,

    #[error("Doctor already has an appointment at given date and time")]
    ConflictDetected,

    #[error("Unable to parse min_date/max_date. Please provide the dates in proper format")]
    InvalidDateRange,

    #[error("Invalid sortby option. Please try again")]
    InvalidSortField,

    #[error("{0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<anyhow::Error> for AppointmentError {
    fn from(err: anyhow::Error) -> Self {
        AppointmentError::DatabaseError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_wire_codes() {
        assert_eq!(serde_json::to_value(AppointmentStatus::Booked).unwrap(), json!("B"));
        let status: AppointmentStatus = serde_json::from_value(json!("C")).unwrap();
        assert_eq!(status, AppointmentStatus::Cancelled);
        assert_eq!(AppointmentStatus::Booked.to_string(), "BOOKED");
    }

    #[test]
    fn test_booking_request_formats() {
        let request: BookAppointmentRequest = serde_json::from_value(json!({
            "date": "03-06-2024",
            "time": "09:30"
        }))
        .unwrap();
        assert_eq!(request.date, NaiveDate::from_ymd_opt(2024, 6, 3).unwrap());
        assert_eq!(request.time, NaiveTime::from_hms_opt(9, 30, 0).unwrap());

        assert!(serde_json::from_value::<BookAppointmentRequest>(json!({
            "date": "2024-06-03",
            "time": "09:30"
        }))
        .is_err());
    }

    #[test]
    fn test_date_range() {
        let query = AppointmentListQuery {
            min_date: Some("01-06-2024".to_string()),
            max_date: Some("30-06-2024".to_string()),
            ..Default::default()
        };
        assert!(query.date_range().unwrap().is_some());

        let query = AppointmentListQuery {
            min_date: Some("june".to_string()),
            max_date: Some("30-06-2024".to_string()),
            ..Default::default()
        };
        assert!(matches!(query.date_range(), Err(AppointmentError::InvalidDateRange)));

        assert!(AppointmentListQuery::default().date_range().unwrap().is_none());
    }

    #[test]
    fn test_sort_fields() {
        assert_eq!(AppointmentSortField::parse("doctor_username"), Some(AppointmentSortField::DoctorUsername));
        assert_eq!(AppointmentSortField::parse("time"), None);
    }
}
