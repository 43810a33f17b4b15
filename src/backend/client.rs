//! Backend HTTP client implementation.
//!
//! This module provides `HttpBackend` for making synchronous HTTP requests to the
//! question-answering service, along with error types and a builder for configuration.

use std::io;

use reqwest::blocking::{Response, multipart};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use super::wire::{
    DocumentRequest, FileUpload, HealthBody, IngestResponseBody, QueryRequest, QueryResponseBody,
};
use crate::config::Config;
use crate::error::{ErrorKind, RequestError};
use crate::models::{QueryResult, UploadResult};

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Network-related errors (connection refused, DNS resolution, etc.)
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// Request or response timeout errors
    #[error("Request timed out")]
    Timeout(#[source] reqwest::Error),

    /// Non-success HTTP status
    #[error("HTTP error: status {status}")]
    Http { status: u16 },

    /// Response body did not match the expected shape
    #[error("Malformed response: {0}")]
    Malformed(#[source] serde_json::Error),

    /// Invalid URL configuration error
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Local file could not be read for upload
    #[error("Could not read {path}: {source}")]
    File {
        path: String,
        #[source]
        source: io::Error,
    },

    /// File type the backend cannot extract text from
    #[error("Unsupported file type: {0}")]
    UnsupportedFile(String),
}

impl BackendError {
    /// Classifies this error for the request coordinator.
    ///
    /// Local file problems are caught before any request is sent and count as
    /// validation failures.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network(_) | Self::Timeout(_) | Self::Http { .. } | Self::InvalidUrl(_) => {
                ErrorKind::Transport
            }
            Self::Malformed(_) => ErrorKind::Format,
            Self::File { .. } | Self::UnsupportedFile(_) => ErrorKind::Validation,
        }
    }

    fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout(error)
        } else {
            Self::Network(error)
        }
    }
}

impl From<BackendError> for RequestError {
    fn from(error: BackendError) -> Self {
        let message = error.to_string();
        match error.kind() {
            ErrorKind::Validation => RequestError::Validation(message),
            ErrorKind::Transport => RequestError::Transport(message),
            ErrorKind::Format => RequestError::Format(message),
        }
    }
}

/// Trait for backend operations.
///
/// This trait enables mocking in unit tests and keeps the session logic independent
/// of the HTTP transport.
pub trait BackendClient: Send + Sync {
    /// Calls `GET /health` and returns the reported status.
    fn health(&self) -> Result<String, BackendError>;

    /// Calls `POST /documents` with pasted text.
    fn ingest_text(&self, request: &DocumentRequest) -> Result<UploadResult, BackendError>;

    /// Calls `POST /documents/file` with a multipart `file` field.
    fn ingest_file(&self, upload: &FileUpload) -> Result<UploadResult, BackendError>;

    /// Calls `POST /query`.
    fn query(&self, request: &QueryRequest) -> Result<QueryResult, BackendError>;
}

/// Builder for constructing `HttpBackend` instances.
///
/// # Examples
///
/// ```
/// use minirag::backend::HttpBackendBuilder;
///
/// let backend = HttpBackendBuilder::new()
///     .base_url("http://localhost:8000")
///     .build()
///     .expect("Failed to create backend client");
/// assert_eq!(backend.base_url(), "http://localhost:8000");
/// ```
#[derive(Debug, Default)]
pub struct HttpBackendBuilder {
    base_url: Option<String>,
    config: Option<Config>,
}

impl HttpBackendBuilder {
    /// Creates a new `HttpBackendBuilder` with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base URL, taking precedence over the configuration.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Uses an already resolved configuration for URL and timeouts.
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Builds the `HttpBackend`.
    ///
    /// If neither `base_url()` nor `config()` was called, the configuration is read
    /// from the environment (`MINIRAG_API_URL`, falling back to `http://localhost:8000`).
    ///
    /// # Errors
    ///
    /// Returns `BackendError::InvalidUrl` if the base URL does not parse.
    pub fn build(self) -> Result<HttpBackend, BackendError> {
        let mut config = self.config.unwrap_or_else(Config::from_env);
        if let Some(url) = self.base_url {
            config = config.with_api_url(url);
        }

        let base_url = config.api_url().to_string();
        reqwest::Url::parse(&base_url)
            .map_err(|e| BackendError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(BackendError::Network)?;

        Ok(HttpBackend { client, base_url })
    }
}

/// Synchronous HTTP client for the backend.
///
/// Each call makes exactly one attempt; failures are returned to the caller.
pub struct HttpBackend {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HttpBackend {
    /// Returns the base URL configured for this client.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, BackendError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.url(path);
        debug!("POST {}", url);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .map_err(BackendError::from_reqwest)?;
        decode(response)
    }
}

/// Checks the status and decodes a JSON body.
fn decode<R: DeserializeOwned>(response: Response) -> Result<R, BackendError> {
    let status = response.status();
    if !status.is_success() {
        return Err(BackendError::Http {
            status: status.as_u16(),
        });
    }

    let body = response.text().map_err(BackendError::from_reqwest)?;
    serde_json::from_str(&body).map_err(BackendError::Malformed)
}

impl BackendClient for HttpBackend {
    fn health(&self) -> Result<String, BackendError> {
        let url = self.url("/health");
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(BackendError::from_reqwest)?;
        let body: HealthBody = decode(response)?;
        Ok(body.status.unwrap_or_else(|| "unknown".to_string()))
    }

    fn ingest_text(&self, request: &DocumentRequest) -> Result<UploadResult, BackendError> {
        let body: IngestResponseBody = self.post_json("/documents", request)?;
        Ok(body.into())
    }

    fn ingest_file(&self, upload: &FileUpload) -> Result<UploadResult, BackendError> {
        let url = self.url("/documents/file");
        debug!("POST {} ({} bytes)", url, upload.bytes().len());

        let part = multipart::Part::bytes(upload.bytes().to_vec())
            .file_name(upload.file_name().to_string())
            .mime_str(upload.mime())
            .map_err(BackendError::Network)?;
        let form = multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .map_err(BackendError::from_reqwest)?;
        let body: IngestResponseBody = decode(response)?;
        Ok(body.into())
    }

    fn query(&self, request: &QueryRequest) -> Result<QueryResult, BackendError> {
        let body: QueryResponseBody = self.post_json("/query", request)?;
        Ok(body.into())
    }
}
