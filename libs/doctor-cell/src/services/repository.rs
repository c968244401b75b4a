use anyhow::Result;
use async_trait::async_trait;

use shared_config::AppConfig;

use crate::models::{Doctor, DoctorAvailabilitySlot, NewSlot};
use crate::services::availability::AvailabilityService;
use crate::services::bulk_upload::{DoctorDirectory, SlotStore};
use crate::services::doctor::DoctorService;

/// Supabase-backed lookups and writes for the bulk upload, scoped to the caller's token.
pub struct SupabaseSlotRepository<'a> {
    doctors: DoctorService,
    availability: AvailabilityService,
    auth_token: &'a str,
}

impl<'a> SupabaseSlotRepository<'a> {
    pub fn new(config: &AppConfig, auth_token: &'a str) -> Self {
        Self {
            doctors: DoctorService::new(config),
            availability: AvailabilityService::new(config),
            auth_token,
        }
    }
}

#[async_trait]
impl DoctorDirectory for SupabaseSlotRepository<'_> {
    async fn find_doctor_by_username(&self, username: &str) -> Result<Option<Doctor>> {
        self.doctors.find_doctor_by_username(username, self.auth_token).await
    }
}

#[async_trait]
impl SlotStore for SupabaseSlotRepository<'_> {
    async fn insert_slots(&self, slots: Vec<NewSlot>) -> Result<Vec<DoctorAvailabilitySlot>> {
        self.availability.insert_slots(slots, self.auth_token).await
    }
}
