use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc, NaiveDate};

use shared_models::formats::dmy_date;

pub const MAX_PHONE_NUMBER_LENGTH: usize = 12;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    #[default]
    M,
    F,
    T,
    O,
}

impl Gender {
    pub fn code(&self) -> &'static str {
        match self {
            Gender::M => "M",
            Gender::F => "F",
            Gender::T => "T",
            Gender::O => "O",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub dob: NaiveDate,
    pub gender: Gender,
    pub phone_number: String,
    pub created_at: DateTime<Utc>,
}

impl Patient {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Body for both profile creation and PATCH updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientProfileRequest {
    #[serde(with = "dmy_date")]
    pub dob: NaiveDate,
    #[serde(default)]
    pub gender: Gender,
    pub phone_number: String,
}

impl PatientProfileRequest {
    pub fn validate(&self) -> Result<(), PatientError> {
        let phone = self.phone_number.trim();
        if phone.is_empty() {
            return Err(PatientError::ValidationError("phone_number cannot be empty".to_string()));
        }
        if phone.chars().count() > MAX_PHONE_NUMBER_LENGTH {
            return Err(PatientError::ValidationError(format!(
                "phone_number must be at most {} characters", MAX_PHONE_NUMBER_LENGTH
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatientSortField {
    FirstName,
    LastName,
    Dob,
    Gender,
    CreatedAt,
}

impl PatientSortField {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "first_name" => Some(Self::FirstName),
            "last_name" => Some(Self::LastName),
            "dob" => Some(Self::Dob),
            "gender" => Some(Self::Gender),
            "created_at" => Some(Self::CreatedAt),
            _ => None,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            Self::FirstName => "first_name",
            Self::LastName => "last_name",
            Self::Dob => "dob",
            Self::Gender => "gender",
            Self::CreatedAt => "created_at",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatientListQuery {
    pub gender: Option<Gender>,
    pub min_dob: Option<String>,
    pub max_dob: Option<String>,
    pub search: Option<String>,
    pub sortby: Option<String>,
    pub sortorder: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DobRange {
    pub min: NaiveDate,
    pub max: NaiveDate,
}

impl PatientListQuery {
    /// The range applies only when both bounds are given.
    pub fn dob_range(&self) -> Result<Option<DobRange>, PatientError> {
        match (self.min_dob.as_deref(), self.max_dob.as_deref()) {
            (Some(min), Some(max)) if !min.is_empty() && !max.is_empty() => {
                let min = shared_models::formats::parse_date(min).ok_or(PatientError::InvalidDobRange)?;
                let max = shared_models::formats::parse_date(max).ok_or(PatientError::InvalidDobRange)?;
                Ok(Some(DobRange { min, max }))
            }
            _ => Ok(None),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatientError {
    #[error("patient doesn't exists by provided patient_id")]
    NotFound,

    #[error("User profile is not available with given username")]
    UserProfileMissing,

    #[error("Unable to parse min_dob/max_dob. Please provide the dates in proper format")]
    InvalidDobRange,

    #[error("Invalid sortby value. Please try again.")]
    InvalidSortField,

    #[error("{0}")]
    ValidationError(String),
}
