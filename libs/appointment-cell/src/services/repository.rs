use anyhow::Result;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

use doctor_cell::models::{Doctor, DoctorAvailabilitySlot};
use doctor_cell::services::{AvailabilityService, DoctorService};
use patient_cell::models::Patient;
use patient_cell::services::PatientService;
use shared_config::AppConfig;

use crate::models::{Appointment, NewAppointment};
use crate::services::appointment::AppointmentService;
use crate::services::booking::BookingRepository;

pub struct SupabaseBookingRepository<'a> {
    doctors: DoctorService,
    availability: AvailabilityService,
    patients: PatientService,
    appointments: AppointmentService,
    auth_token: &'a str,
}

impl<'a> SupabaseBookingRepository<'a> {
    pub fn new(config: &AppConfig, auth_token: &'a str) -> Self {
        Self {
            doctors: DoctorService::new(config),
            availability: AvailabilityService::new(config),
            patients: PatientService::new(config),
            appointments: AppointmentService::new(config),
            auth_token,
        }
    }
}

#[async_trait]
impl BookingRepository for SupabaseBookingRepository<'_> {
    async fn find_doctor(&self, doctor_id: Uuid) -> Result<Option<Doctor>> {
        self.doctors.get_doctor(doctor_id, self.auth_token).await
    }

    async fn find_patient_for_user(&self, user_id: &str) -> Result<Option<Patient>> {
        self.patients.find_patient_by_user_id(user_id, self.auth_token).await
    }

    async fn find_existing_slot(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<Option<DoctorAvailabilitySlot>> {
        self.availability.find_existing_slot(doctor_id, date, time, self.auth_token).await
    }

    async fn find_patient_booking(
        &self,
        doctor_id: Uuid,
        patient_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<Appointment>> {
        self.appointments.find_patient_booking(doctor_id, patient_id, date, self.auth_token).await
    }

    async fn find_conflicting_appointment(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<Option<Appointment>> {
        self.appointments.find_conflicting_appointment(doctor_id, date, time, self.auth_token).await
    }

    async fn insert_appointment(&self, appointment: NewAppointment) -> Result<Appointment> {
        self.appointments.insert_appointment(&appointment, self.auth_token).await
    }
}
