use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::repo_types::PublicUser;
use crate::{
    error::AppError,
    validation::{self, FieldErrors, INVALID_EMAIL},
};

/// Request body for user registration. Fields stay raw JSON so type errors
/// are reported per field.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<Value>,
    pub email: Option<Value>,
    pub password: Option<Value>,
}

/// Registration input after validation; email is lowercased.
#[derive(Debug, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    pub fn validate(self) -> Result<NewUser, AppError> {
        let mut errors = FieldErrors::new();
        let username = validation::required(&mut errors, "username", self.username);
        let email =
            validation::required(&mut errors, "email", self.email).map(|e| e.to_lowercase());
        let password = validation::required_verbatim(&mut errors, "password", self.password);
        if let Some(email) = email.as_deref() {
            if !validation::is_valid_email(email) {
                errors.add("email", INVALID_EMAIL);
            }
        }

        let message = if errors.has_reason(validation::MISSING) {
            "Missing required fields"
        } else {
            "Invalid input"
        };
        errors.into_result(message)?;

        match (username, email, password) {
            (Some(username), Some(email), Some(password)) => Ok(NewUser {
                username,
                email,
                password,
            }),
            _ => Err(AppError::BadRequest("Missing required fields".into())),
        }
    }
}

/// Request body for login.
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub username: Option<Value>,
    pub password: Option<Value>,
}

impl LoginRequest {
    pub fn validate(self) -> Result<(String, String), AppError> {
        let mut errors = FieldErrors::new();
        let username = validation::required(&mut errors, "username", self.username);
        let password = validation::required_verbatim(&mut errors, "password", self.password);
        let message = if errors.has_reason(validation::MISSING) {
            "Missing required fields"
        } else {
            "Invalid input"
        };
        errors.into_result(message)?;
        match (username, password) {
            (Some(u), Some(p)) => Ok((u, p)),
            _ => Err(AppError::BadRequest("Missing required fields".into())),
        }
    }
}

/// `{message, data}` envelope used by register and login.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub message: &'static str,
    pub data: T,
}

#[derive(Debug, Serialize)]
pub struct TokenData {
    pub access_token: String,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub message: &'static str,
    pub user: PublicUser,
}
