//! Request and response bodies exchanged with the backend.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::BackendError;
use crate::models::{QueryResult, SourceExcerpt, SourceExcerptBuilder, UploadResult};

/// Title sent when the user leaves the title field blank.
pub const DEFAULT_DOCUMENT_TITLE: &str = "Untitled Document";

/// Provenance tag for pasted text.
pub const USER_INPUT_SOURCE: &str = "user_input";

/// Body of `POST /documents`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentRequest {
    pub text: String,
    pub title: String,
    pub source: String,
}

impl DocumentRequest {
    /// Creates a pasted-text ingestion body, defaulting a blank title.
    pub fn new(text: impl Into<String>, title: &str) -> Self {
        let title = if title.trim().is_empty() {
            DEFAULT_DOCUMENT_TITLE
        } else {
            title
        };

        Self {
            text: text.into(),
            title: title.to_string(),
            source: USER_INPUT_SOURCE.to_string(),
        }
    }
}

/// Body of `POST /query`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryRequest {
    pub query: String,
    pub top_k: u32,
}

impl QueryRequest {
    /// Creates a query body.
    pub fn new(query: impl Into<String>, top_k: u32) -> Self {
        Self {
            query: query.into(),
            top_k,
        }
    }
}

/// A file read from disk, ready to be sent as the multipart `file` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    file_name: String,
    mime: &'static str,
    bytes: Vec<u8>,
}

impl FileUpload {
    /// Creates an upload from in-memory content.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::UnsupportedFile` if the name has no accepted extension.
    pub fn from_bytes(file_name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, BackendError> {
        let file_name = file_name.into();
        let mime = mime_for(&file_name)
            .ok_or_else(|| BackendError::UnsupportedFile(file_name.clone()))?;

        Ok(Self {
            file_name,
            mime,
            bytes,
        })
    }

    /// Reads a file from disk.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::UnsupportedFile` for extensions other than `.txt`, `.md`
    /// and `.pdf`, or `BackendError::File` if the file cannot be read.
    pub fn read(path: &Path) -> Result<Self, BackendError> {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        if mime_for(&file_name).is_none() {
            return Err(BackendError::UnsupportedFile(path.display().to_string()));
        }

        let bytes = fs::read(path).map_err(|source| BackendError::File {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_bytes(file_name, bytes)
    }

    /// Returns the file name sent with the part.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Returns the MIME type sent with the part.
    pub fn mime(&self) -> &'static str {
        self.mime
    }

    /// Returns the raw file content.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Extensions the backend knows how to extract text from, with their MIME types.
const ACCEPTED_TYPES: [(&str, &str); 3] = [
    ("txt", "text/plain"),
    ("md", "text/markdown"),
    ("pdf", "application/pdf"),
];

fn mime_for(file_name: &str) -> Option<&'static str> {
    let (_, extension) = file_name.rsplit_once('.')?;
    ACCEPTED_TYPES
        .iter()
        .find(|(accepted, _)| extension.eq_ignore_ascii_case(accepted))
        .map(|(_, mime)| *mime)
}

/// Response of both ingestion endpoints. Extra fields are ignored.
#[derive(Debug, Deserialize)]
pub(crate) struct IngestResponseBody {
    chunks_created: u64,
    total_tokens: u64,
}

impl From<IngestResponseBody> for UploadResult {
    fn from(body: IngestResponseBody) -> Self {
        UploadResult::new(body.chunks_created, body.total_tokens)
    }
}

#[derive(Debug, Deserialize)]
struct SourceBody {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    section: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    relevance_score: Option<f64>,
}

impl From<SourceBody> for SourceExcerpt {
    fn from(body: SourceBody) -> Self {
        let mut builder = SourceExcerptBuilder::new();
        if let Some(title) = body.title {
            builder = builder.title(title);
        }
        if let Some(origin) = body.source {
            builder = builder.origin(origin);
        }
        if let Some(section) = body.section {
            builder = builder.section(section);
        }
        if let Some(text) = body.text {
            builder = builder.text(text);
        }
        if let Some(score) = body.relevance_score {
            builder = builder.relevance_score(score);
        }
        builder.build()
    }
}

/// Response of `POST /query`.
#[derive(Debug, Deserialize)]
pub(crate) struct QueryResponseBody {
    answer: String,
    sources: Vec<SourceBody>,
    timing_ms: f64,
    total_tokens: u64,
    estimated_cost: f64,
}

impl From<QueryResponseBody> for QueryResult {
    fn from(body: QueryResponseBody) -> Self {
        QueryResult::new(
            body.answer,
            body.sources.into_iter().map(SourceExcerpt::from).collect(),
            body.timing_ms,
            body.total_tokens,
            body.estimated_cost,
        )
    }
}

/// Response of `GET /health`.
#[derive(Debug, Deserialize)]
pub(crate) struct HealthBody {
    #[serde(default)]
    pub status: Option<String>,
}
