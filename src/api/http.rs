use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use tracing::{debug, instrument};

use crate::{
    tracker::entities::{Role, User, Workday},
    utils::time::date_key,
};

use super::{
    interpret_response, ApiError, LoginResponse, MessageResponse, UsersResponse, WorkdayApi,
    WorkdayResponse, WorkdaysResponse, USER_HEADER,
};

/// [WorkdayApi] over HTTP with JSON bodies. No retries; failures are reported to the caller as is.
pub struct HttpApi {
    client: Client,
    base_url: String,
}

impl HttpApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn with_user(request: RequestBuilder, dni: Option<&str>) -> RequestBuilder {
        match dni {
            Some(dni) => request.header(USER_HEADER, dni),
            None => request,
        }
    }

    async fn send(request: RequestBuilder) -> Result<Value, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        debug!("Received {status} with {} bytes", body.len());
        interpret_response(status, &body)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, dni: Option<&str>) -> Result<T, ApiError> {
        let request = Self::with_user(self.client.get(self.url(path)), dni);
        let value = Self::send(request).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        dni: Option<&str>,
        body: &(impl Serialize + Sync),
    ) -> Result<T, ApiError> {
        let request = Self::with_user(self.client.post(self.url(path)), dni).json(body);
        let value = Self::send(request).await?;
        Ok(serde_json::from_value(value)?)
    }
}

#[async_trait]
impl WorkdayApi for HttpApi {
    #[instrument(skip(self, password))]
    async fn login(&self, dni: &str, password: &str) -> Result<User, ApiError> {
        let response: LoginResponse = self
            .post("/login", None, &json!({"dni": dni, "password": password}))
            .await?;
        Ok(User {
            dni: response.user_dni,
            role: response.role,
        })
    }

    #[instrument(skip(self))]
    async fn get_workday(&self, dni: &str, date: NaiveDate) -> Result<Option<Workday>, ApiError> {
        let request = self
            .client
            .get(self.url("/workday"))
            .query(&[("date", date_key(date))]);
        match Self::send(Self::with_user(request, Some(dni))).await {
            Ok(value) => Ok(serde_json::from_value::<WorkdayResponse>(value)?.workday),
            // Missing days are reported as 404
            Err(ApiError::Server { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self, workday), fields(date = %workday.date))]
    async fn save_workday(&self, dni: &str, workday: &Workday) -> Result<(), ApiError> {
        let body = Workday {
            user_dni: None,
            ..workday.clone()
        };
        let _: MessageResponse = self.post("/workday", Some(dni), &body).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_workday(&self, dni: &str, date: NaiveDate) -> Result<(), ApiError> {
        let _: MessageResponse = self
            .post("/workday/delete", Some(dni), &json!({"date": date_key(date)}))
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn user_workdays(&self, dni: &str) -> Result<Vec<Workday>, ApiError> {
        let response: WorkdaysResponse = self.get("/workdays/user", Some(dni)).await?;
        Ok(response.workdays)
    }

    #[instrument(skip(self))]
    async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        let response: UsersResponse = self.get("/admin/users", None).await?;
        Ok(response.users)
    }

    #[instrument(skip(self, password))]
    async fn register_user(
        &self,
        dni: &str,
        password: &str,
        role: &Role,
    ) -> Result<String, ApiError> {
        let response: MessageResponse = self
            .post(
                "/admin/register_user",
                None,
                &json!({"dni": dni, "password": password, "role": role}),
            )
            .await?;
        Ok(response
            .message
            .unwrap_or_else(|| format!("User {dni} registered")))
    }

    #[instrument(skip(self))]
    async fn all_workdays(&self) -> Result<Vec<Workday>, ApiError> {
        let response: WorkdaysResponse = self.get("/admin/all_workdays", None).await?;
        Ok(response.workdays)
    }
}
