//! HTTP client for the question-answering backend.
//!
//! This module provides a blocking client for the ingestion and query endpoints,
//! along with the wire bodies and a classified error type.

mod client;
mod wire;

pub use client::{BackendClient, BackendError, HttpBackend, HttpBackendBuilder};
pub use wire::{DEFAULT_DOCUMENT_TITLE, DocumentRequest, FileUpload, QueryRequest, USER_INPUT_SOURCE};
