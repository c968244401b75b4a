use regex::Regex;
use serde::{Deserialize, Serialize};

pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_NAME_LENGTH: usize = 150;

const EMAIL_PATTERN: &str = r"^[^@\s]+@[^@\s]+\.[^@\s]+$";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    /// Returns the name of the first field that fails validation.
    pub fn invalid_field(&self) -> Option<&'static str> {
        for (name, value) in [
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
            ("username", &self.username),
        ] {
            if value.trim().is_empty() || value.chars().count() > MAX_NAME_LENGTH {
                return Some(name);
            }
        }

        let email_ok = Regex::new(EMAIL_PATTERN)
            .map(|re| re.is_match(self.email.trim()))
            .unwrap_or(false);
        if !email_ok {
            return Some("email");
        }
        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Some("password");
        }

        None
    }
}
