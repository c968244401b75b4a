use anyhow::{Result, anyhow};
use chrono::{NaiveTime, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::pagination::{Pagination, SortOrder};

use crate::models::{Doctor, DoctorListQuery, DoctorProfileRequest, DoctorSortField, UserAccount};

pub struct DoctorService {
    supabase: SupabaseClient,
}

impl DoctorService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn get_user_account(&self, user_id: &str, auth_token: &str) -> Result<Option<UserAccount>> {
        let path = format!("/rest/v1/users?id=eq.{}&limit=1", urlencoding::encode(user_id));
        let result: Vec<UserAccount> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        Ok(result.into_iter().next())
    }

    pub async fn create_doctor(
        &self,
        account: &UserAccount,
        request: &DoctorProfileRequest,
        auth_token: &str,
    ) -> Result<Doctor> {
        debug!("Creating doctor profile for user: {}", account.username);

        let doctor_data = json!({
            "user_id": account.id,
            "username": account.username,
            "first_name": account.first_name,
            "last_name": account.last_name,
            "clinic_id": request.clinic_id,
            "specialization": request.specialization,
            "available_days": request.available_days,
            "start_time": format_time(request.start_time),
            "end_time": format_time(request.end_time),
            "created_at": Utc::now().to_rfc3339(),
        });

        let result: Vec<Doctor> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/doctors",
            Some(auth_token),
            Some(doctor_data),
            Some(SupabaseClient::return_representation()),
        ).await?;

        let doctor = result.into_iter().next()
            .ok_or_else(|| anyhow!("Failed to create doctor profile"))?;
        debug!("Doctor profile created with ID: {}", doctor.id);

        Ok(doctor)
    }

    pub async fn get_doctor(&self, doctor_id: Uuid, auth_token: &str) -> Result<Option<Doctor>> {
        let path = format!("/rest/v1/doctors?id=eq.{}&limit=1", doctor_id);
        let result: Vec<Doctor> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        Ok(result.into_iter().next())
    }

    pub async fn find_doctor_by_username(&self, username: &str, auth_token: &str) -> Result<Option<Doctor>> {
        let path = format!("/rest/v1/doctors?username=eq.{}&limit=1", urlencoding::encode(username));
        let result: Vec<Doctor> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        Ok(result.into_iter().next())
    }

    pub async fn list_doctors(
        &self,
        query: &DoctorListQuery,
        sort: Option<(DoctorSortField, SortOrder)>,
        pagination: Pagination,
        auth_token: &str,
    ) -> Result<Vec<Doctor>> {
        let path = doctor_list_path(query, sort, pagination);
        debug!("Listing doctors: {}", path);

        self.supabase.request(Method::GET, &path, Some(auth_token), None).await
    }

    pub async fn update_doctor(
        &self,
        doctor_id: Uuid,
        request: &DoctorProfileRequest,
        auth_token: &str,
    ) -> Result<Option<Doctor>> {
        debug!("Updating doctor profile: {}", doctor_id);

        let update_data = json!({
            "specialization": request.specialization,
            "available_days": request.available_days,
            "start_time": format_time(request.start_time),
            "end_time": format_time(request.end_time),
            "clinic_id": request.clinic_id,
        });

        let path = format!("/rest/v1/doctors?id=eq.{}", doctor_id);
        let result: Vec<Doctor> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(update_data),
            Some(SupabaseClient::return_representation()),
        ).await?;

        Ok(result.into_iter().next())
    }

    /// Returns `false` when no doctor had that id.
    pub async fn delete_doctor(&self, doctor_id: Uuid, auth_token: &str) -> Result<bool> {
        let path = format!("/rest/v1/doctors?id=eq.{}", doctor_id);
        let deleted: Vec<Value> = self.supabase.request_with_headers(
            Method::DELETE,
            &path,
            Some(auth_token),
            None,
            Some(SupabaseClient::return_representation()),
        ).await?;

        Ok(!deleted.is_empty())
    }
}

fn format_time(time: NaiveTime) -> String {
    time.format("%H:%M:%S").to_string()
}

pub fn doctor_list_path(
    query: &DoctorListQuery,
    sort: Option<(DoctorSortField, SortOrder)>,
    pagination: Pagination,
) -> String {
    let mut parts = vec!["select=*".to_string()];

    if let Some(specialization) = query.specialization.as_deref().filter(|s| !s.is_empty()) {
        parts.push(format!("specialization=eq.{}", urlencoding::encode(specialization)));
    }
    if let Some(start_time) = query.start_time {
        parts.push(format!("start_time=lte.{}", format_time(start_time)));
    }
    if let Some(end_time) = query.end_time {
        parts.push(format!("end_time=gte.{}", format_time(end_time)));
    }
    if let Some((field, order)) = sort {
        parts.push(order.order_clause(field.column()));
    }
    parts.push(pagination.to_query());

    format!("/rest/v1/doctors?{}", parts.join("&"))
}
