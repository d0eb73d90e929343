//! Access to the attendance server. [WorkdayApi] is the contract every command talks to;
//! [http::HttpApi] is the real implementation. Calls scoped to a user identify it through the
//! `X-User-DNI` header.

pub mod http;
#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::tracker::entities::{Role, User, Workday};

pub const USER_HEADER: &str = "X-User-DNI";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Could not reach the server: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{message}")]
    Server { status: u16, message: String },
    #[error("Unexpected response from the server: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WorkdayApi: Send + Sync {
    /// Checks credentials and returns the identity with its role.
    async fn login(&self, dni: &str, password: &str) -> Result<User, ApiError>;

    /// Record of `date`, or `None` when the user has nothing stored for that day.
    async fn get_workday(&self, dni: &str, date: NaiveDate) -> Result<Option<Workday>, ApiError>;

    /// Creates or replaces the record of `workday.date`.
    async fn save_workday(&self, dni: &str, workday: &Workday) -> Result<(), ApiError>;

    async fn delete_workday(&self, dni: &str, date: NaiveDate) -> Result<(), ApiError>;

    /// Every record of the user, newest first.
    async fn user_workdays(&self, dni: &str) -> Result<Vec<Workday>, ApiError>;

    async fn list_users(&self) -> Result<Vec<User>, ApiError>;

    /// Returns the confirmation message of the server.
    async fn register_user(&self, dni: &str, password: &str, role: &Role)
        -> Result<String, ApiError>;

    /// Records of all users, ordered by user and then newest first.
    async fn all_workdays(&self) -> Result<Vec<Workday>, ApiError>;
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    pub user_dni: String,
    #[serde(default)]
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WorkdayResponse {
    #[serde(default)]
    pub workday: Option<Workday>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WorkdaysResponse {
    #[serde(default)]
    pub workdays: Vec<Workday>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UsersResponse {
    #[serde(default)]
    pub users: Vec<User>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

/// Turns a raw response into its JSON body. The body is parsed even for failed requests, because
/// the server explains failures in `message` or `error`. Bodies that aren't JSON fall back to the
/// reason phrase of the status.
pub(crate) fn interpret_response(status: StatusCode, body: &[u8]) -> Result<Value, ApiError> {
    let parsed = match serde_json::from_slice::<Value>(body) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!("Response with status {status} is not json: {e}");
            None
        }
    };

    if status.is_success() {
        return match parsed {
            Some(v) => Ok(v),
            None => Err(ApiError::Server {
                status: status.as_u16(),
                message: fallback_message(status),
            }),
        };
    }

    let message = parsed
        .as_ref()
        .and_then(|v| {
            v.get("message")
                .and_then(Value::as_str)
                .or_else(|| v.get("error").and_then(Value::as_str))
        })
        .map(str::to_string)
        .unwrap_or_else(|| fallback_message(status));

    Err(ApiError::Server {
        status: status.as_u16(),
        message,
    })
}

fn fallback_message(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP error {}", status.as_u16()))
}
