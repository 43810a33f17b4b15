//! Outbound requests and their completions.
//!
//! The session never blocks on the network. Submitting produces a [`Request`]; the
//! [`Dispatcher`] runs it on a worker thread and posts a [`Completion`] back to the
//! event loop, which applies it to the session as the next event.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use tracing::{debug, error, info};

use crate::backend::{BackendClient, DocumentRequest, FileUpload, QueryRequest};
use crate::coordinator::Ticket;
use crate::error::RequestError;
use crate::models::{QueryResult, UploadResult};

/// How a document was submitted. Both share the ingestion operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOrigin {
    Text,
    File,
}

/// A backend call the session wants made.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    IngestText {
        ticket: Ticket,
        body: DocumentRequest,
    },
    IngestFile {
        ticket: Ticket,
        upload: FileUpload,
    },
    Query {
        ticket: Ticket,
        body: QueryRequest,
    },
}

impl Request {
    /// Returns the attempt this request belongs to.
    pub fn ticket(&self) -> Ticket {
        match self {
            Self::IngestText { ticket, .. }
            | Self::IngestFile { ticket, .. }
            | Self::Query { ticket, .. } => *ticket,
        }
    }

    /// Builds the completion reporting that this request could not be made.
    pub fn failed(&self, error: RequestError) -> Completion {
        match self {
            Self::IngestText { ticket, .. } => Completion::Ingest {
                ticket: *ticket,
                origin: IngestOrigin::Text,
                result: Err(error),
            },
            Self::IngestFile { ticket, .. } => Completion::Ingest {
                ticket: *ticket,
                origin: IngestOrigin::File,
                result: Err(error),
            },
            Self::Query { ticket, .. } => Completion::Query {
                ticket: *ticket,
                result: Err(error),
            },
        }
    }
}

/// The response event for a [`Request`].
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Ingest {
        ticket: Ticket,
        origin: IngestOrigin,
        result: Result<UploadResult, RequestError>,
    },
    Query {
        ticket: Ticket,
        result: Result<QueryResult, RequestError>,
    },
}

/// Performs `request` against `backend`, blocking until it resolves.
///
/// Backend errors are classified here and never escape as panics.
pub fn execute(backend: &dyn BackendClient, request: Request) -> Completion {
    match request {
        Request::IngestText { ticket, body } => Completion::Ingest {
            ticket,
            origin: IngestOrigin::Text,
            result: backend.ingest_text(&body).map_err(RequestError::from),
        },
        Request::IngestFile { ticket, upload } => Completion::Ingest {
            ticket,
            origin: IngestOrigin::File,
            result: backend.ingest_file(&upload).map_err(RequestError::from),
        },
        Request::Query { ticket, body } => Completion::Query {
            ticket,
            result: backend.query(&body).map_err(RequestError::from),
        },
    }
}

/// Runs requests off the UI thread and reports completions over a channel.
pub struct Dispatcher {
    backend: Arc<dyn BackendClient>,
    completions: Sender<Completion>,
}

impl Dispatcher {
    /// Creates a dispatcher and the receiving end the event loop drains.
    pub fn new(backend: Arc<dyn BackendClient>) -> (Self, Receiver<Completion>) {
        let (completions, receiver) = mpsc::channel();
        (
            Self {
                backend,
                completions,
            },
            receiver,
        )
    }

    /// Starts `request` on a worker thread.
    ///
    /// If the thread cannot be spawned, a transport failure is posted instead so the
    /// operation does not stay pending.
    pub fn dispatch(&self, request: Request) {
        debug!(attempt = request.ticket().attempt(), "dispatching request");

        let backend = Arc::clone(&self.backend);
        let sender = self.completions.clone();
        let fallback = request.clone();

        let spawned = thread::Builder::new()
            .name("minirag-request".to_string())
            .spawn(move || {
                let completion = execute(backend.as_ref(), request);
                // The receiver is gone only when the UI has shut down.
                let _ = sender.send(completion);
            });

        if let Err(e) = spawned {
            error!("failed to spawn request thread: {}", e);
            let _ = self
                .completions
                .send(fallback.failed(RequestError::Transport(e.to_string())));
        }
    }

    /// Pings `GET /health` in the background and discards the outcome.
    pub fn probe_health(&self) {
        let backend = Arc::clone(&self.backend);
        let spawned = thread::Builder::new()
            .name("minirag-health".to_string())
            .spawn(move || match backend.health() {
                Ok(status) => info!(%status, "backend health probe answered"),
                Err(e) => info!("backend health probe failed: {}", e),
            });

        if let Err(e) = spawned {
            debug!("skipping health probe: {}", e);
        }
    }
}
