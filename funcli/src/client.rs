#![doc = "HTTP client for the Fundamento import-session API; implements the core `RemoteApi` seam."]
//
//! # Fundamento client (CLI <-> Core)
//!
//! [`FundamentoClient`] is the production implementation of
//! [`funcli_core::contract::RemoteApi`]. It owns authentication (a bearer API
//! key set as a default header), the base URL and JSON (de)serialization.
//!
//! Every non-success response becomes [`ApiError::Http`], displayed as
//! `API Error (<status>): <message>`, where the message is taken from the
//! response body's `error` field, then its `message` field, then the raw body,
//! then the status reason.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use funcli_core::contract::{
    CreatedSession, FileUploadEntry, ImportSession, ManifestEntry, RemoteApi, RemoteError,
    SourceFormat,
};

use crate::load_config::ClientConfig;

/// Version of the CLI, sent in the User-Agent header.
const VERSION: &str = env!("CARGO_PKG_VERSION");

const IMPORT_SESSIONS_PATH: &str = "/api/v1/import_sessions";

#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with a non-success status.
    #[error("API Error ({status}): {message}")]
    Http { status: u16, message: String },

    /// Connection failed, DNS error, timeout, etc.
    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Failed to parse response: {message}")]
    Parse { message: String },

    #[error("API key contains characters that are not allowed in a header")]
    InvalidApiKey,
}

fn to_network_error(err: reqwest::Error) -> ApiError {
    ApiError::Network {
        message: err.to_string(),
    }
}

/// Map a non-success response to [`ApiError::Http`].
fn to_http_error(status: StatusCode, body: &str) -> ApiError {
    ApiError::Http {
        status: status.as_u16(),
        message: error_message(status, body),
    }
}

fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(serde_json::Value::Object(fields)) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["error", "message"] {
            match fields.get(key) {
                Some(serde_json::Value::String(s)) if !s.is_empty() => return s.clone(),
                Some(serde_json::Value::Null) | None => {}
                Some(serde_json::Value::String(_)) => {}
                Some(other) => return other.to_string(),
            }
        }
    }
    let body = body.trim();
    if !body.is_empty() {
        return body.to_string();
    }
    status.canonical_reason().unwrap_or("Unknown error").to_string()
}

#[derive(Serialize)]
struct CreateSessionRequest<'a> {
    import_session: NewImportSession<'a>,
}

#[derive(Serialize)]
struct NewImportSession<'a> {
    space_id: &'a str,
    source_format: SourceFormat,
}

#[derive(Serialize)]
struct ManifestRequest {
    files: Vec<ManifestEntry>,
}

#[derive(Deserialize)]
struct ManifestResponse {
    files: Vec<FileUploadEntry>,
}

pub struct FundamentoClient {
    base_url: String,
    client: Client,
}

impl FundamentoClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("funcli/{VERSION}"))
                .unwrap_or_else(|_| HeaderValue::from_static("funcli")),
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
            .map_err(|_| ApiError::InvalidApiKey)?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(to_network_error)?;

        tracing::info!(base_url = %config.base_url, "Initialised Fundamento client");
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `<base>/api/v1/import_sessions<suffix>`
    fn sessions_url(&self, suffix: &str) -> String {
        format!("{}{IMPORT_SESSIONS_PATH}{suffix}", self.base_url)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request.send().await.map_err(to_network_error)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = to_http_error(status, &body);
            tracing::error!(status = status.as_u16(), error = %err, "API request failed");
            return Err(err);
        }
        Ok(response)
    }

    async fn parse<T: DeserializeOwned>(response: Response, what: &str) -> Result<T, ApiError> {
        response.json().await.map_err(|e| ApiError::Parse {
            message: format!("Failed to parse {what} response: {e}"),
        })
    }

    /// Body-less POST to a session action such as `/process` or `/cancel`.
    async fn post_action(&self, session_id: &str, action: &str) -> Result<(), ApiError> {
        let url = self.sessions_url(&format!("/{session_id}/{action}"));
        tracing::debug!(session_id, action, "Posting session action");
        self.send(self.client.post(&url)).await?;
        Ok(())
    }
}

#[async_trait]
impl RemoteApi for FundamentoClient {
    async fn create_import_session(
        &self,
        space_id: &str,
        source_format: SourceFormat,
    ) -> Result<CreatedSession, RemoteError> {
        tracing::info!(space_id, %source_format, "Creating import session");
        let body = CreateSessionRequest {
            import_session: NewImportSession {
                space_id,
                source_format,
            },
        };
        let response = self
            .send(self.client.post(self.sessions_url("")).json(&body))
            .await?;
        let created: CreatedSession = Self::parse(response, "create session").await?;
        tracing::info!(session_id = %created.id, "Import session created");
        Ok(created)
    }

    async fn submit_manifest(
        &self,
        session_id: &str,
        entries: Vec<ManifestEntry>,
    ) -> Result<Vec<FileUploadEntry>, RemoteError> {
        tracing::info!(session_id, files = entries.len(), "Submitting manifest");
        let url = self.sessions_url(&format!("/{session_id}/manifest"));
        let response = self
            .send(self.client.post(&url).json(&ManifestRequest { files: entries }))
            .await?;
        let answer: ManifestResponse = Self::parse(response, "manifest").await?;
        Ok(answer.files)
    }

    async fn mark_file_uploaded(
        &self,
        session_id: &str,
        file_id: &str,
    ) -> Result<(), RemoteError> {
        Ok(self
            .post_action(session_id, &format!("files/{file_id}/uploaded"))
            .await?)
    }

    async fn trigger_processing(&self, session_id: &str) -> Result<(), RemoteError> {
        Ok(self.post_action(session_id, "process").await?)
    }

    async fn get_import_session(&self, session_id: &str) -> Result<ImportSession, RemoteError> {
        let url = self.sessions_url(&format!("/{session_id}"));
        let response = self.send(self.client.get(&url)).await?;
        Ok(Self::parse(response, "import session").await?)
    }

    async fn cancel_import_session(&self, session_id: &str) -> Result<(), RemoteError> {
        Ok(self.post_action(session_id, "cancel").await?)
    }

    async fn retry_import_session(&self, session_id: &str) -> Result<(), RemoteError> {
        Ok(self.post_action(session_id, "retry").await?)
    }
}
