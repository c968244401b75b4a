use assert_matches::assert_matches;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Utc};
use mockall::mock;
use mockall::predicate::eq;
use uuid::Uuid;

use appointment_cell::models::{
    Appointment, AppointmentError, AppointmentStatus, BookAppointmentRequest, NewAppointment,
};
use appointment_cell::services::{BookingRepository, BookingService};
use doctor_cell::models::{Doctor, DoctorAvailabilitySlot};
use patient_cell::models::Patient;
use shared_utils::test_utils::MockSupabaseResponses;

mock! {
    pub Repository {}

    #[async_trait]
    impl BookingRepository for Repository {
        async fn find_doctor(&self, doctor_id: Uuid) -> anyhow::Result<Option<Doctor>>;
        async fn find_patient_for_user(&self, user_id: &str) -> anyhow::Result<Option<Patient>>;
        async fn find_existing_slot(
            &self,
            doctor_id: Uuid,
            date: NaiveDate,
            time: NaiveTime,
        ) -> anyhow::Result<Option<DoctorAvailabilitySlot>>;
        async fn find_patient_booking(
            &self,
            doctor_id: Uuid,
            patient_id: Uuid,
            date: NaiveDate,
        ) -> anyhow::Result<Option<Appointment>>;
        async fn find_conflicting_appointment(
            &self,
            doctor_id: Uuid,
            date: NaiveDate,
            time: NaiveTime,
        ) -> anyhow::Result<Option<Appointment>>;
        async fn insert_appointment(&self, appointment: NewAppointment) -> anyhow::Result<Appointment>;
    }
}

struct Fixture {
    doctor: Doctor,
    patient: Patient,
    request: BookAppointmentRequest,
}

impl Fixture {
    fn new() -> Self {
        let doctor: Doctor = serde_json::from_value(
            MockSupabaseResponses::doctor_row(&Uuid::new_v4().to_string(), "drsmith"),
        )
        .unwrap();
        let patient: Patient = serde_json::from_value(MockSupabaseResponses::patient_row(
            &Uuid::new_v4().to_string(),
            &Uuid::new_v4().to_string(),
            "pat",
        ))
        .unwrap();

        Self {
            doctor,
            patient,
            request: BookAppointmentRequest {
                date: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
                time: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            },
        }
    }

    fn slot(&self) -> DoctorAvailabilitySlot {
        DoctorAvailabilitySlot {
            id: Uuid::new_v4(),
            doctor_id: self.doctor.id,
            date: self.request.date,
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
            is_available: true,
        }
    }

    fn appointment(&self) -> Appointment {
        Appointment {
            id: Uuid::new_v4(),
            doctor_id: self.doctor.id,
            patient_id: self.patient.id,
            doctor_username: self.doctor.username.clone(),
            patient_username: self.patient.username.clone(),
            date: self.request.date,
            time: self.request.time,
            status: AppointmentStatus::Booked,
            created_at: Utc::now(),
        }
    }

    /// Repository that resolves the fixture doctor and patient.
    fn repository(&self) -> MockRepository {
        let mut repository = MockRepository::new();
        let doctor = self.doctor.clone();
        let patient = self.patient.clone();

        repository
            .expect_find_doctor()
            .with(eq(self.doctor.id))
            .returning(move |_| Ok(Some(doctor.clone())));
        repository
            .expect_find_patient_for_user()
            .returning(move |_| Ok(Some(patient.clone())));
        repository
    }
}

#[tokio::test]
async fn test_books_when_slot_is_free() {
    let fixture = Fixture::new();
    let mut repository = fixture.repository();
    let slot = fixture.slot();
    let appointment = fixture.appointment();

    repository
        .expect_find_existing_slot()
        .with(eq(fixture.doctor.id), eq(fixture.request.date), eq(fixture.request.time))
        .returning(move |_, _, _| Ok(Some(slot.clone())));
    repository
        .expect_find_patient_booking()
        .returning(|_, _, _| Ok(None));
    repository
        .expect_find_conflicting_appointment()
        .returning(|_, _, _| Ok(None));

    let expected = NewAppointment {
        doctor_id: fixture.doctor.id,
        patient_id: fixture.patient.id,
        doctor_username: "drsmith".to_string(),
        patient_username: "pat".to_string(),
        date: fixture.request.date,
        time: fixture.request.time,
        status: AppointmentStatus::Booked,
    };
    repository
        .expect_insert_appointment()
        .with(eq(expected))
        .times(1)
        .returning(move |_| Ok(appointment.clone()));

    let booked = BookingService::new(&repository)
        .book_appointment("user-1", fixture.doctor.id, &fixture.request)
        .await
        .unwrap();

    assert_eq!(booked.status, AppointmentStatus::Booked);
    assert_eq!(booked.doctor_username, "drsmith");
}

#[tokio::test]
async fn test_unknown_doctor() {
    let fixture = Fixture::new();
    let mut repository = MockRepository::new();
    repository.expect_find_doctor().returning(|_| Ok(None));
    repository.expect_insert_appointment().never();

    let err = BookingService::new(&repository)
        .book_appointment("user-1", Uuid::new_v4(), &fixture.request)
        .await
        .unwrap_err();

    assert_matches!(err, AppointmentError::DoctorNotFound);
}

#[tokio::test]
async fn test_caller_without_patient_profile() {
    let fixture = Fixture::new();
    let mut repository = MockRepository::new();
    let doctor = fixture.doctor.clone();
    repository.expect_find_doctor().returning(move |_| Ok(Some(doctor.clone())));
    repository.expect_find_patient_for_user().returning(|_| Ok(None));
    repository.expect_insert_appointment().never();

    let err = BookingService::new(&repository)
        .book_appointment("user-1", fixture.doctor.id, &fixture.request)
        .await
        .unwrap_err();

    assert_matches!(err, AppointmentError::PatientNotFound);
}

#[tokio::test]
async fn test_no_slot_on_that_date() {
    let fixture = Fixture::new();
    let mut repository = fixture.repository();
    repository.expect_find_existing_slot().returning(|_, _, _| Ok(None));
    repository.expect_insert_appointment().never();

    let err = BookingService::new(&repository)
        .book_appointment("user-1", fixture.doctor.id, &fixture.request)
        .await
        .unwrap_err();

    assert_matches!(err, AppointmentError::SlotNotAvailable);
    assert_eq!(err.to_string(), "Time slot is not available for the appointment");
}

#[tokio::test]
async fn test_patient_already_booked_that_day() {
    let fixture = Fixture::new();
    let mut repository = fixture.repository();
    let slot = fixture.slot();
    let existing = fixture.appointment();

    repository.expect_find_existing_slot().returning(move |_, _, _| Ok(Some(slot.clone())));
    repository
        .expect_find_patient_booking()
        .with(eq(fixture.doctor.id), eq(fixture.patient.id), eq(fixture.request.date))
        .returning(move |_, _, _| Ok(Some(existing.clone())));
    repository.expect_insert_appointment().never();

    let err = BookingService::new(&repository)
        .book_appointment("user-1", fixture.doctor.id, &fixture.request)
        .await
        .unwrap_err();

    assert_matches!(err, AppointmentError::AlreadyBookedWithDoctor);
}

#[tokio::test]
async fn test_doctor_taken_at_that_time() {
    let fixture = Fixture::new();
    let mut repository = fixture.repository();
    let slot = fixture.slot();
    let mut other = fixture.appointment();
    other.patient_username = "someone_else".to_string();

    repository.expect_find_existing_slot().returning(move |_, _, _| Ok(Some(slot.clone())));
    repository.expect_find_patient_booking().returning(|_, _, _| Ok(None));
    repository
        .expect_find_conflicting_appointment()
        .returning(move |_, _, _| Ok(Some(other.clone())));
    repository.expect_insert_appointment().never();

    let err = BookingService::new(&repository)
        .book_appointment("user-1", fixture.doctor.id, &fixture.request)
        .await
        .unwrap_err();

    assert_matches!(err, AppointmentError::ConflictDetected);
}

#[tokio::test]
async fn test_repository_failure_is_database_error() {
    let fixture = Fixture::new();
    let mut repository = MockRepository::new();
    repository
        .expect_find_doctor()
        .returning(|_| Err(anyhow::anyhow!("connection refused")));

    let err = BookingService::new(&repository)
        .book_appointment("user-1", fixture.doctor.id, &fixture.request)
        .await
        .unwrap_err();

    assert_matches!(err, AppointmentError::DatabaseError(msg) if msg.contains("connection refused"));
}
