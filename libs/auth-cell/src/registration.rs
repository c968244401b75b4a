use anyhow::{Result, anyhow};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_database::supabase::{logic_tree_value, SupabaseClient};
use shared_models::auth::UserAccount;

use crate::models::RegisterRequest;

pub struct RegistrationService {
    supabase: SupabaseClient,
}

impl RegistrationService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// True when a user already holds this username or email.
    pub async fn user_exists(&self, username: &str, email: &str) -> Result<bool> {
        let path = format!(
            "/rest/v1/users?select=id&or=(username.eq.{},email.eq.{})&limit=1",
            logic_tree_value(username),
            logic_tree_value(email),
        );
        let result: Vec<Value> = self.supabase.request(Method::GET, &path, None, None).await?;

        Ok(!result.is_empty())
    }

    /// Signs the user up with Supabase Auth and records them in `users`.
    pub async fn register(&self, request: &RegisterRequest) -> Result<UserAccount> {
        debug!("Registering user: {}", request.username);

        let signup: Value = self.supabase.request(
            Method::POST,
            "/auth/v1/signup",
            None,
            Some(json!({
                "email": request.email.trim(),
                "password": request.password,
                "data": {
                    "username": request.username.trim(),
                    "first_name": request.first_name.trim(),
                    "last_name": request.last_name.trim(),
                }
            })),
        ).await?;

        // Auto-confirmed projects answer with a session wrapping the user.
        let user_id = signup["user"]["id"].as_str()
            .or_else(|| signup["id"].as_str())
            .ok_or_else(|| anyhow!("Sign-up response did not include a user id"))?;
        let access_token = signup["access_token"].as_str();

        let result: Vec<UserAccount> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/users",
            access_token,
            Some(json!({
                "id": user_id,
                "username": request.username.trim(),
                "email": request.email.trim(),
                "first_name": request.first_name.trim(),
                "last_name": request.last_name.trim(),
            })),
            Some(SupabaseClient::return_representation()),
        ).await?;

        result.into_iter().next()
            .ok_or_else(|| anyhow!("Failed to create user record"))
    }
}
