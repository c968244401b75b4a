use anyhow::{Result, anyhow};
use chrono::{NaiveDate, NaiveTime};
use reqwest::Method;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{CreateSlotRequest, DoctorAvailabilitySlot, NewSlot};

pub struct AvailabilityService {
    supabase: SupabaseClient,
}

impl AvailabilityService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Creates one available slot for a doctor.
    pub async fn create_slot(
        &self,
        doctor_id: Uuid,
        request: &CreateSlotRequest,
        auth_token: &str,
    ) -> Result<DoctorAvailabilitySlot> {
        debug!("Creating slot for doctor {} on {}", doctor_id, request.date);

        if request.end_time <= request.start_time {
            return Err(anyhow!("end_time must be after start_time"));
        }

        let slot = NewSlot {
            doctor_id,
            date: request.date,
            start_time: request.start_time,
            end_time: request.end_time,
            is_available: true,
        };

        self.insert_slots(vec![slot], auth_token).await?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Failed to create availability slot"))
    }

    /// Bulk insert; PostgREST writes an array body in a single statement.
    pub async fn insert_slots(
        &self,
        slots: Vec<NewSlot>,
        auth_token: &str,
    ) -> Result<Vec<DoctorAvailabilitySlot>> {
        if slots.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Inserting {} availability slots", slots.len());
        let body: Value = serde_json::to_value(&slots)?;

        self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/doctor_availability",
            Some(auth_token),
            Some(body),
            Some(SupabaseClient::return_representation()),
        ).await
    }

    /// An available slot of `doctor_id` on `date` that covers `time`, if any.
    pub async fn find_existing_slot(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
        auth_token: &str,
    ) -> Result<Option<DoctorAvailabilitySlot>> {
        let time = time.format("%H:%M:%S");
        let path = format!(
            "/rest/v1/doctor_availability?doctor_id=eq.{}&date=eq.{}&start_time=lte.{}&end_time=gte.{}&is_available=is.true&limit=1",
            doctor_id,
            date.format("%Y-%m-%d"),
            time,
            time,
        );

        let result: Vec<DoctorAvailabilitySlot> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        Ok(result.into_iter().next())
    }
}
