use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc, NaiveTime, NaiveDate};

use shared_models::formats::{dmy_date, hm_time, option_hm_time};

pub use shared_models::auth::UserAccount;

pub const MAX_PROFILE_FIELD_LENGTH: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub clinic_id: Option<Uuid>,
    pub specialization: String,
    pub available_days: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub created_at: DateTime<Utc>,
}

impl Doctor {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Body shared by profile creation and the full PATCH update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorProfileRequest {
    pub specialization: String,
    pub available_days: String,
    #[serde(with = "hm_time")]
    pub start_time: NaiveTime,
    #[serde(with = "hm_time")]
    pub end_time: NaiveTime,
    pub clinic_id: Option<Uuid>,
}

impl DoctorProfileRequest {
    pub fn validate(&self) -> Result<(), DoctorError> {
        for (field, value) in [
            ("specialization", &self.specialization),
            ("available_days", &self.available_days),
        ] {
            if value.trim().is_empty() {
                return Err(DoctorError::ValidationError(format!("{} cannot be empty", field)));
            }
            if value.chars().count() > MAX_PROFILE_FIELD_LENGTH {
                return Err(DoctorError::ValidationError(format!(
                    "{} must be at most {} characters", field, MAX_PROFILE_FIELD_LENGTH
                )));
            }
        }

        if self.end_time <= self.start_time {
            return Err(DoctorError::ValidationError("end_time must be after start_time".to_string()));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoctorSortField {
    Specialization,
    StartTime,
    EndTime,
    FirstName,
    LastName,
    CreatedAt,
}

impl DoctorSortField {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "specialization" => Some(Self::Specialization),
            "start_time" => Some(Self::StartTime),
            "end_time" => Some(Self::EndTime),
            "first_name" => Some(Self::FirstName),
            "last_name" => Some(Self::LastName),
            "created_at" => Some(Self::CreatedAt),
            _ => None,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            Self::Specialization => "specialization",
            Self::StartTime => "start_time",
            Self::EndTime => "end_time",
            Self::FirstName => "first_name",
            Self::LastName => "last_name",
            Self::CreatedAt => "created_at",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DoctorListQuery {
    pub specialization: Option<String>,
    #[serde(default, with = "option_hm_time")]
    pub start_time: Option<NaiveTime>,
    #[serde(default, with = "option_hm_time")]
    pub end_time: Option<NaiveTime>,
    pub sortby: Option<String>,
    pub sortorder: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctorAvailabilitySlot {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_available: bool,
}

/// Row to insert into `doctor_availability`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewSlot {
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_available: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSlotRequest {
    #[serde(with = "dmy_date")]
    pub date: NaiveDate,
    #[serde(with = "hm_time")]
    pub start_time: NaiveTime,
    #[serde(with = "hm_time")]
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DoctorError {
    NotFound,
    UserProfileMissing,
    InvalidSortField,
    ValidationError(String),
}

impl std::fmt::Display for DoctorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DoctorError::NotFound => write!(f, "doctor doesn't exist by provided doctor_id"),
            DoctorError::UserProfileMissing => write!(f, "User profile is not available with this username"),
            DoctorError::InvalidSortField => write!(f, "please provide a valid sortby option"),
            DoctorError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for DoctorError {}
