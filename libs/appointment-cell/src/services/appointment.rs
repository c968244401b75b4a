use anyhow::{Result, anyhow};
use chrono::{NaiveDate, NaiveTime, Utc};
use reqwest::Method;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::pagination::{Pagination, SortOrder};

use crate::models::{
    Appointment, AppointmentListQuery, AppointmentSortField, AppointmentStatus,
    CreatePrescriptionRequest, NewAppointment, Prescription,
};

pub struct AppointmentService {
    supabase: SupabaseClient,
}

impl AppointmentService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn get_appointment(&self, appointment_id: Uuid, auth_token: &str) -> Result<Option<Appointment>> {
        let path = format!("/rest/v1/appointments?id=eq.{}&limit=1", appointment_id);
        let result: Vec<Appointment> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        Ok(result.into_iter().next())
    }

    /// A booked appointment between this doctor and patient on `date`.
    pub async fn find_patient_booking(
        &self,
        doctor_id: Uuid,
        patient_id: Uuid,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<Option<Appointment>> {
        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&patient_id=eq.{}&date=eq.{}&status=eq.{}&limit=1",
            doctor_id,
            patient_id,
            date.format("%Y-%m-%d"),
            AppointmentStatus::Booked.code(),
        );
        let result: Vec<Appointment> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        Ok(result.into_iter().next())
    }

    /// A booked appointment holding this doctor at exactly `date` and `time`.
    pub async fn find_conflicting_appointment(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
        auth_token: &str,
    ) -> Result<Option<Appointment>> {
        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&date=eq.{}&time=eq.{}&status=eq.{}&limit=1",
            doctor_id,
            date.format("%Y-%m-%d"),
            time.format("%H:%M:%S"),
            AppointmentStatus::Booked.code(),
        );
        let result: Vec<Appointment> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        Ok(result.into_iter().next())
    }

    pub async fn insert_appointment(&self, appointment: &NewAppointment, auth_token: &str) -> Result<Appointment> {
        let mut body = serde_json::to_value(appointment)?;
        body["created_at"] = json!(Utc::now().to_rfc3339());

        let result: Vec<Appointment> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/appointments",
            Some(auth_token),
            Some(body),
            Some(SupabaseClient::return_representation()),
        ).await?;

        result.into_iter().next()
            .ok_or_else(|| anyhow!("Failed to create appointment"))
    }

    pub async fn list_patient_appointments(
        &self,
        patient_id: Uuid,
        query: &AppointmentListQuery,
        date_range: Option<(NaiveDate, NaiveDate)>,
        sort: Option<(AppointmentSortField, SortOrder)>,
        pagination: Pagination,
        auth_token: &str,
    ) -> Result<Vec<Appointment>> {
        let path = appointment_list_path(patient_id, query, date_range, sort, pagination);
        debug!("Listing appointments: {}", path);

        self.supabase.request(Method::GET, &path, Some(auth_token), None).await
    }

    pub async fn create_prescription(
        &self,
        appointment_id: Uuid,
        request: &CreatePrescriptionRequest,
        auth_token: &str,
    ) -> Result<Prescription> {
        let body = json!({
            "appointment_id": appointment_id,
            "notes": request.notes,
            "medications": request.medications,
            "issued_at": Utc::now().to_rfc3339(),
        });

        let result: Vec<Prescription> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/prescriptions",
            Some(auth_token),
            Some(body),
            Some(SupabaseClient::return_representation()),
        ).await?;

        result.into_iter().next()
            .ok_or_else(|| anyhow!("Failed to create prescription"))
    }
}

pub fn appointment_list_path(
    patient_id: Uuid,
    query: &AppointmentListQuery,
    date_range: Option<(NaiveDate, NaiveDate)>,
    sort: Option<(AppointmentSortField, SortOrder)>,
    pagination: Pagination,
) -> String {
    let specialization = query.specialization.as_deref().filter(|s| !s.is_empty());

    // Filtering on the doctor's specialization needs an inner join.
    let mut parts = match specialization {
        Some(specialization) => vec![
            "select=*,doctor:doctors!inner(specialization)".to_string(),
            format!("doctor.specialization=eq.{}", urlencoding::encode(specialization)),
        ],
        None => vec!["select=*".to_string()],
    };
    parts.push(format!("patient_id=eq.{}", patient_id));

    if let Some(doctor) = query.doctor.as_deref().filter(|s| !s.is_empty()) {
        parts.push(format!("doctor_username=eq.{}", urlencoding::encode(doctor)));
    }
    if let Some(status) = query.status {
        parts.push(format!("status=eq.{}", status.code()));
    }
    if let Some((min, max)) = date_range {
        parts.push(format!("date=gte.{}", min.format("%Y-%m-%d")));
        parts.push(format!("date=lte.{}", max.format("%Y-%m-%d")));
    }
    if let Some((field, order)) = sort {
        parts.push(order.order_clause(field.column()));
    }
    parts.push(pagination.to_query());

    format!("/rest/v1/appointments?{}", parts.join("&"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_path_joins_doctor_for_specialization() {
        let patient_id = Uuid::nil();
        let query = AppointmentListQuery {
            specialization: Some("Cardiology".to_string()),
            doctor: Some("drsmith".to_string()),
            status: Some(AppointmentStatus::Booked),
            ..Default::default()
        };
        let range = Some((
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
        ));

        let path = appointment_list_path(
            patient_id,
            &query,
            range,
            Some((AppointmentSortField::Date, SortOrder::Desc)),
            Pagination::new(None, None, 10),
        );

        assert_eq!(
            path,
            format!(
                "/rest/v1/appointments?select=*,doctor:doctors!inner(specialization)\
                 &doctor.specialization=eq.Cardiology&patient_id=eq.{}&doctor_username=eq.drsmith\
                 &status=eq.B&date=gte.2024-06-01&date=lte.2024-06-30&order=date.desc&limit=10&offset=0",
                patient_id
            )
        );
    }

    #[test]
    fn test_list_path_minimal() {
        let path = appointment_list_path(
            Uuid::nil(),
            &AppointmentListQuery::default(),
            None,
            None,
            Pagination::new(None, None, 10),
        );
        assert!(path.starts_with("/rest/v1/appointments?select=*&patient_id=eq."));
    }
}
