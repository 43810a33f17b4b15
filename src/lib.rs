//! Terminal client for a retrieval-augmented question-answering backend.
//!
//! Documents are ingested as pasted text or uploaded files; questions come back as an
//! answer with inline `[n]` citation markers plus the numbered excerpts they refer to.

pub mod backend;
pub mod citation;
pub mod config;
pub mod coordinator;
pub mod dispatch;
pub mod error;
pub mod models;
pub mod presentation;
pub mod selection;
pub mod session;
pub mod sources;
pub mod tui;

pub use backend::{BackendClient, BackendError, HttpBackend, HttpBackendBuilder};
pub use citation::AnswerSegment;
pub use config::Config;
pub use coordinator::{Operation, OperationState, Settled, Ticket};
pub use dispatch::{Completion, Dispatcher, Request};
pub use error::{ErrorKind, RequestError};
pub use models::{QueryResult, SourceExcerpt, SourceExcerptBuilder, UploadResult};
pub use selection::Selection;
pub use session::Session;
pub use sources::SourceIndex;
