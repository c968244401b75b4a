use anyhow::{Result, anyhow};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;
use chrono::Utc;

use shared_config::AppConfig;
use shared_database::supabase::{logic_tree_value, SupabaseClient};
use shared_models::auth::UserAccount;
use shared_models::pagination::{Pagination, SortOrder};

use crate::models::{DobRange, Patient, PatientListQuery, PatientProfileRequest, PatientSortField};

pub struct PatientService {
    supabase: SupabaseClient,
}

impl PatientService {
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

    pub async fn create_patient(
        &self,
        account: &UserAccount,
        request: &PatientProfileRequest,
        auth_token: &str,
    ) -> Result<Patient> {
        debug!("Creating patient profile for: {}", account.username);

        let patient_data = json!({
            "user_id": account.id,
            "username": account.username,
            "first_name": account.first_name,
            "last_name": account.last_name,
            "dob": request.dob.format("%Y-%m-%d").to_string(),
            "gender": request.gender,
            "phone_number": request.phone_number.trim(),
            "created_at": Utc::now().to_rfc3339(),
        });

        let result: Vec<Patient> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/patients",
            Some(auth_token),
            Some(patient_data),
            Some(SupabaseClient::return_representation()),
        ).await?;

        let patient = result.into_iter().next()
            .ok_or_else(|| anyhow!("Failed to create patient profile"))?;
        debug!("Patient profile created successfully with ID: {}", patient.id);

        Ok(patient)
    }

    pub async fn get_patient(&self, patient_id: Uuid, auth_token: &str) -> Result<Option<Patient>> {
        let path = format!("/rest/v1/patients?id=eq.{}&limit=1", patient_id);
        let result: Vec<Patient> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        Ok(result.into_iter().next())
    }

    /// Profile belonging to an authenticated user, if they have one.
    pub async fn find_patient_by_user_id(&self, user_id: &str, auth_token: &str) -> Result<Option<Patient>> {
        let path = format!("/rest/v1/patients?user_id=eq.{}&limit=1", urlencoding::encode(user_id));
        let result: Vec<Patient> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        Ok(result.into_iter().next())
    }

    pub async fn update_patient(
        &self,
        patient_id: Uuid,
        request: &PatientProfileRequest,
        auth_token: &str,
    ) -> Result<Option<Patient>> {
        debug!("Updating patient profile: {}", patient_id);

        let update_data = json!({
            "dob": request.dob.format("%Y-%m-%d").to_string(),
            "gender": request.gender,
            "phone_number": request.phone_number.trim(),
        });

        let path = format!("/rest/v1/patients?id=eq.{}", patient_id);
        let result: Vec<Patient> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(update_data),
            Some(SupabaseClient::return_representation()),
        ).await?;

        Ok(result.into_iter().next())
    }

    /// Returns `false` when no patient had that id.
    pub async fn delete_patient(&self, patient_id: Uuid, auth_token: &str) -> Result<bool> {
        let path = format!("/rest/v1/patients?id=eq.{}", patient_id);
        let deleted: Vec<Value> = self.supabase.request_with_headers(
            Method::DELETE,
            &path,
            Some(auth_token),
            None,
            Some(SupabaseClient::return_representation()),
        ).await?;

        Ok(!deleted.is_empty())
    }

    pub async fn list_patients(
        &self,
        query: &PatientListQuery,
        dob_range: Option<DobRange>,
        sort: Option<(PatientSortField, SortOrder)>,
        pagination: Pagination,
        auth_token: &str,
    ) -> Result<Vec<Patient>> {
        let path = patient_list_path(query, dob_range, sort, pagination);
        debug!("Listing patients: {}", path);

        self.supabase.request(Method::GET, &path, Some(auth_token), None).await
    }
}

pub fn patient_list_path(
    query: &PatientListQuery,
    dob_range: Option<DobRange>,
    sort: Option<(PatientSortField, SortOrder)>,
    pagination: Pagination,
) -> String {
    let mut parts = vec!["select=*".to_string()];

    if let Some(gender) = query.gender {
        parts.push(format!("gender=eq.{}", gender.code()));
    }
    if let Some(range) = dob_range {
        parts.push(format!("dob=gte.{}", range.min.format("%Y-%m-%d")));
        parts.push(format!("dob=lte.{}", range.max.format("%Y-%m-%d")));
    }
    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let term = logic_tree_value(&format!("*{}*", search));
        parts.push(format!(
            "or=(first_name.ilike.{term},last_name.ilike.{term},username.ilike.{term})"
        ));
    }
    if let Some((field, order)) = sort {
        parts.push(order.order_clause(field.column()));
    }
    parts.push(pagination.to_query());

    format!("/rest/v1/patients?{}", parts.join("&"))
}
