use anyhow::Result;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use tracing::{info, warn};
use uuid::Uuid;

use doctor_cell::models::{Doctor, DoctorAvailabilitySlot};
use patient_cell::models::Patient;

use crate::models::{Appointment, AppointmentError, AppointmentStatus, BookAppointmentRequest, NewAppointment};

/// Lookups and the single write that booking needs.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn find_doctor(&self, doctor_id: Uuid) -> Result<Option<Doctor>>;

    async fn find_patient_for_user(&self, user_id: &str) -> Result<Option<Patient>>;

    /// An available slot of the doctor on `date` with `start_time <= time <= end_time`.
    async fn find_existing_slot(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<Option<DoctorAvailabilitySlot>>;

    async fn find_patient_booking(
        &self,
        doctor_id: Uuid,
        patient_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<Appointment>>;

    async fn find_conflicting_appointment(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<Option<Appointment>>;

    async fn insert_appointment(&self, appointment: NewAppointment) -> Result<Appointment>;
}

pub struct BookingService<'a, R: ?Sized> {
    repository: &'a R,
}

impl<'a, R: BookingRepository + ?Sized> BookingService<'a, R> {
    pub fn new(repository: &'a R) -> Self {
        Self { repository }
    }

    /// Books `request` for the patient profile owned by `user_id`.
    pub async fn book_appointment(
        &self,
        user_id: &str,
        doctor_id: Uuid,
        request: &BookAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        let doctor = self.repository.find_doctor(doctor_id).await?
            .ok_or(AppointmentError::DoctorNotFound)?;
        let patient = self.repository.find_patient_for_user(user_id).await?
            .ok_or(AppointmentError::PatientNotFound)?;

        if self.repository
            .find_existing_slot(doctor.id, request.date, request.time).await?
            .is_none()
        {
            return Err(AppointmentError::SlotNotAvailable);
        }

        if self.repository
            .find_patient_booking(doctor.id, patient.id, request.date).await?
            .is_some()
        {
            return Err(AppointmentError::AlreadyBookedWithDoctor);
        }

        if let Some(existing) = self.repository
            .find_conflicting_appointment(doctor.id, request.date, request.time).await?
        {
            warn!("Doctor {} already booked at {} {} by appointment {}",
                  doctor.username, request.date, request.time, existing.id);
            return Err(AppointmentError::ConflictDetected);
        }

        let appointment = self.repository.insert_appointment(NewAppointment {
            doctor_id: doctor.id,
            patient_id: patient.id,
            doctor_username: doctor.username,
            patient_username: patient.username,
            date: request.date,
            time: request.time,
            status: AppointmentStatus::Booked,
        }).await?;

        info!("Appointment {} booked with doctor {}", appointment.id, appointment.doctor_username);
        Ok(appointment)
    }
}
