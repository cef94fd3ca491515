//! Downstream processing notifier.
//!
//! Calls to the downstream system happen after the local unit of work has
//! committed. They are never retried and a failure never rolls back local
//! state; callers report it instead.

use std::{fmt, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    #[error("downstream rejected the credentials")]
    Forbidden,
    #[error("downstream does not know the case")]
    NotFound,
    #[error("downstream is unavailable: {0}")]
    Unavailable(String),
}

impl RemoteError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Forbidden => "REMOTE_FORBIDDEN",
            Self::NotFound => "REMOTE_NOT_FOUND",
            Self::Unavailable(_) => "REMOTE_UNAVAILABLE",
        }
    }

    fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::FORBIDDEN => Self::Forbidden,
            StatusCode::NOT_FOUND => Self::NotFound,
            other => Self::Unavailable(format!("unexpected status {other}")),
        }
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::Unavailable("request timed out".to_string());
        }
        Self::Unavailable(err.to_string())
    }
}

/// Registration payload sent when a case is created.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseRegistration {
    pub unit_key: String,
    pub payload: serde_json::Value,
    pub credit_balance: i64,
    pub owner_email: Option<String>,
}

/// Compensating call sent when a user cancels a case.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseRejection {
    pub case_key: String,
    pub owner_email: Option<String>,
}

#[async_trait]
pub trait DownstreamNotifier: Send + Sync + fmt::Debug {
    async fn register_case(
        &self,
        registration: &CaseRegistration,
        file_path: &str,
    ) -> Result<(), RemoteError>;

    async fn reject_case(&self, rejection: &CaseRejection) -> Result<(), RemoteError>;
}

/// Notifier that accepts everything. Used when no downstream is configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopNotifier;

#[async_trait]
impl DownstreamNotifier for NoopNotifier {
    async fn register_case(
        &self,
        registration: &CaseRegistration,
        _file_path: &str,
    ) -> Result<(), RemoteError> {
        tracing::debug!(unit_key = %registration.unit_key, "no downstream configured");
        Ok(())
    }

    async fn reject_case(&self, rejection: &CaseRejection) -> Result<(), RemoteError> {
        tracing::debug!(case_key = %rejection.case_key, "no downstream configured");
        Ok(())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterBody<'a> {
    #[serde(flatten)]
    registration: &'a CaseRegistration,
    file_path: &'a str,
}

/// JSON-over-HTTP notifier.
#[derive(Clone, Debug)]
pub struct HttpNotifier {
    client: Client,
    base_url: String,
    auth_token: String,
}

impl HttpNotifier {
    pub fn new(
        base_url: impl Into<String>,
        auth_token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, RemoteError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            auth_token: auth_token.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn post_json<T: Serialize + ?Sized + Sync>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<(), RemoteError> {
        let resp = self
            .client
            .post(self.url(path))
            .header("X-Auth-Token", &self.auth_token)
            .json(body)
            .send()
            .await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        Err(RemoteError::from_status(status))
    }
}

#[async_trait]
impl DownstreamNotifier for HttpNotifier {
    async fn register_case(
        &self,
        registration: &CaseRegistration,
        file_path: &str,
    ) -> Result<(), RemoteError> {
        self.post_json(
            "/cases",
            &RegisterBody {
                registration,
                file_path,
            },
        )
        .await
    }

    async fn reject_case(&self, rejection: &CaseRejection) -> Result<(), RemoteError> {
        self.post_json("/cases/reject", rejection).await
    }
}
