//! One interactive session: input fields, both operations, the parsed answer and the
//! expanded source.
//!
//! All mutation goes through the transition methods below and happens on a single
//! thread. Submitting never touches the network; it returns the [`Request`] to run.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::backend::{DocumentRequest, FileUpload, QueryRequest};
use crate::citation::{self, AnswerSegment};
use crate::config::TOP_K;
use crate::coordinator::{Operation, OperationState, Settled};
use crate::dispatch::{Completion, IngestOrigin, Request};
use crate::error::ErrorKind;
use crate::models::{QueryResult, SourceExcerpt, UploadResult};
use crate::selection::Selection;
use crate::sources::SourceIndex;

pub const EMPTY_TEXT_MESSAGE: &str = "Please enter some text to upload";
pub const EMPTY_FILE_MESSAGE: &str = "Please choose a .txt, .md or .pdf file";
pub const EMPTY_QUESTION_MESSAGE: &str = "Please enter a question";
pub const TEXT_UPLOAD_FAILED_MESSAGE: &str =
    "Failed to upload document. Make sure the backend is running.";
pub const FILE_UPLOAD_FAILED_MESSAGE: &str =
    "Failed to upload file. Make sure the backend is running.";
pub const QUERY_FAILED_MESSAGE: &str = "Failed to get answer. Make sure the backend is running.";

/// The single user-facing message currently shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    kind: ErrorKind,
    message: String,
}

impl Notice {
    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Returns the class of the failure behind this message.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the text shown to the user.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Input fields of the ingestion form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestForm {
    pub title: String,
    pub text: String,
    pub file_path: String,
}

/// Session state and its transitions.
#[derive(Debug, Clone)]
pub struct Session {
    top_k: u32,
    form: IngestForm,
    question: String,
    ingest: Operation<UploadResult>,
    query: Operation<QueryResult>,
    answer: Vec<AnswerSegment>,
    sources: SourceIndex,
    selection: Selection,
    notice: Option<Notice>,
}

impl Session {
    /// Creates an idle session sending `top_k` with every query.
    pub fn new(top_k: u32) -> Self {
        Self {
            top_k,
            form: IngestForm::default(),
            question: String::new(),
            ingest: Operation::new(),
            query: Operation::new(),
            answer: Vec::new(),
            sources: SourceIndex::default(),
            selection: Selection::NONE,
            notice: None,
        }
    }

    /// Returns the ingestion form.
    pub fn form(&self) -> &IngestForm {
        &self.form
    }

    /// Returns the ingestion form for editing.
    pub fn form_mut(&mut self) -> &mut IngestForm {
        &mut self.form
    }

    /// Returns the question input.
    pub fn question(&self) -> &str {
        &self.question
    }

    /// Returns the question input for editing.
    pub fn question_mut(&mut self) -> &mut String {
        &mut self.question
    }

    /// Returns the ingestion lifecycle.
    pub fn ingest_state(&self) -> &OperationState<UploadResult> {
        self.ingest.state()
    }

    /// Returns the query lifecycle.
    pub fn query_state(&self) -> &OperationState<QueryResult> {
        self.query.state()
    }

    /// Returns the last successful upload, if it is current.
    pub fn upload_result(&self) -> Option<&UploadResult> {
        self.ingest.value()
    }

    /// Returns the current query result, if any.
    pub fn query_result(&self) -> Option<&QueryResult> {
        self.query.value()
    }

    /// Returns true while an ingestion request is in flight.
    pub fn is_ingesting(&self) -> bool {
        self.ingest.is_pending()
    }

    /// Returns true while a query request is in flight.
    pub fn is_querying(&self) -> bool {
        self.query.is_pending()
    }

    /// Returns the parsed segments of the current answer.
    pub fn answer_segments(&self) -> &[AnswerSegment] {
        &self.answer
    }

    /// Returns the source index of the current answer.
    pub fn sources(&self) -> &SourceIndex {
        &self.sources
    }

    /// Returns the selection, already checked against the current sources.
    pub fn selection(&self) -> Option<usize> {
        self.selection.resolve(&self.sources)
    }

    /// Returns the expanded excerpt with its citation number.
    pub fn expanded_source(&self) -> Option<(usize, &SourceExcerpt)> {
        let number = self.selection()?;
        self.sources.get(number).map(|excerpt| (number, excerpt))
    }

    /// Returns the message currently shown, if any.
    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Hides the current message.
    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Validates the pasted text and starts a text ingestion.
    ///
    /// Returns `None` without side effects while an ingestion is pending, and `None`
    /// with a validation notice when the text is blank.
    pub fn submit_text(&mut self) -> Option<Request> {
        if self.ingest.is_pending() {
            debug!("ignoring text upload while an ingestion is pending");
            return None;
        }
        if self.form.text.trim().is_empty() {
            self.reject(EMPTY_TEXT_MESSAGE);
            return None;
        }

        let ticket = self.ingest.begin()?;
        self.notice = None;
        info!(attempt = ticket.attempt(), "uploading text");
        Some(Request::IngestText {
            ticket,
            body: DocumentRequest::new(self.form.text.clone(), &self.form.title),
        })
    }

    /// Reads the file named in the form and starts a file ingestion.
    ///
    /// A blank path, an unsupported extension or an unreadable file is a validation
    /// failure and no request is made.
    pub fn submit_file(&mut self) -> Option<Request> {
        if self.ingest.is_pending() {
            debug!("ignoring file upload while an ingestion is pending");
            return None;
        }

        let path = self.form.file_path.trim();
        if path.is_empty() {
            self.reject(EMPTY_FILE_MESSAGE);
            return None;
        }
        let upload = match FileUpload::read(Path::new(path)) {
            Ok(upload) => upload,
            Err(e) => {
                let message = e.to_string();
                self.reject(message);
                return None;
            }
        };

        let ticket = self.ingest.begin()?;
        self.notice = None;
        info!(
            attempt = ticket.attempt(),
            file = upload.file_name(),
            "uploading file"
        );
        Some(Request::IngestFile { ticket, upload })
    }

    /// Validates the question and starts a query.
    ///
    /// The previous answer, its sources and the selection are dropped as soon as the
    /// query starts.
    pub fn submit_query(&mut self) -> Option<Request> {
        if self.query.is_pending() {
            debug!("ignoring query while another is pending");
            return None;
        }
        if self.question.trim().is_empty() {
            self.reject(EMPTY_QUESTION_MESSAGE);
            return None;
        }

        let ticket = self.query.begin()?;
        self.notice = None;
        self.answer.clear();
        self.sources = SourceIndex::default();
        self.selection = Selection::NONE;
        info!(attempt = ticket.attempt(), "asking question");
        Some(Request::Query {
            ticket,
            body: QueryRequest::new(self.question.clone(), self.top_k),
        })
    }

    /// Applies a response event.
    ///
    /// Completions that do not belong to the pending attempt are dropped.
    pub fn apply(&mut self, completion: Completion) -> Settled {
        match completion {
            Completion::Ingest {
                ticket,
                origin,
                result,
            } => {
                if self.ingest.settle(ticket, result) == Settled::Stale {
                    return Settled::Stale;
                }
                self.after_ingest(origin);
            }
            Completion::Query { ticket, result } => {
                if self.query.settle(ticket, result) == Settled::Stale {
                    return Settled::Stale;
                }
                self.after_query();
            }
        }
        Settled::Committed
    }

    fn after_ingest(&mut self, origin: IngestOrigin) {
        if let Some(error) = self.ingest.error() {
            warn!(error = %error, "ingestion failed");
            let message = match origin {
                IngestOrigin::Text => TEXT_UPLOAD_FAILED_MESSAGE,
                IngestOrigin::File => FILE_UPLOAD_FAILED_MESSAGE,
            };
            self.notice = Some(Notice::new(error.kind(), message));
            return;
        }

        if let Some(result) = self.ingest.value() {
            info!(
                chunks = result.chunks_created(),
                tokens = result.total_tokens(),
                "ingestion succeeded"
            );
        }
        match origin {
            IngestOrigin::Text => {
                self.form.text.clear();
                self.form.title.clear();
            }
            IngestOrigin::File => self.form.file_path.clear(),
        }
    }

    fn after_query(&mut self) {
        self.selection = Selection::NONE;

        if let Some(error) = self.query.error() {
            warn!(error = %error, "query failed");
            self.notice = Some(Notice::new(error.kind(), QUERY_FAILED_MESSAGE));
            return;
        }

        if let Some(result) = self.query.value() {
            self.answer = citation::parse(result.answer());
            self.sources = SourceIndex::from_sources(result.sources().to_vec());
            info!(
                sources = self.sources.len(),
                tokens = result.total_tokens(),
                "answer received"
            );
        }
    }

    /// Toggles the excerpt for a citation marker clicked in the answer.
    ///
    /// Markers without a matching excerpt are inert. Returns true if the selection
    /// changed.
    pub fn select_citation(&mut self, number: usize) -> bool {
        self.toggle(number)
    }

    /// Toggles the excerpt for an entry clicked in the source list.
    ///
    /// Same transition as [`Session::select_citation`].
    pub fn select_source(&mut self, number: usize) -> bool {
        self.toggle(number)
    }

    fn toggle(&mut self, number: usize) -> bool {
        if !self.sources.contains(number) {
            return false;
        }
        self.selection = self.selection.toggle(number);
        true
    }

    fn reject(&mut self, message: impl Into<String>) {
        let message = message.into();
        debug!(%message, "rejected submission");
        self.notice = Some(Notice::new(ErrorKind::Validation, message));
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(TOP_K)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendClient, BackendError};
    use crate::dispatch::execute;
    use crate::models::SourceExcerptBuilder;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Backend double returning canned bodies and counting calls per endpoint.
    #[derive(Default)]
    struct MockBackend {
        query_calls: AtomicUsize,
        ingest_calls: AtomicUsize,
        fail_with: Option<u16>,
        answer: Option<QueryResult>,
    }

    impl MockBackend {
        fn answering(answer: QueryResult) -> Self {
            Self {
                answer: Some(answer),
                ..Self::default()
            }
        }

        fn failing(status: u16) -> Self {
            Self {
                fail_with: Some(status),
                ..Self::default()
            }
        }
    }

    impl BackendClient for MockBackend {
        fn health(&self) -> Result<String, BackendError> {
            Ok("healthy".to_string())
        }

        fn ingest_text(&self, _request: &DocumentRequest) -> Result<UploadResult, BackendError> {
            self.ingest_calls.fetch_add(1, Ordering::SeqCst);
            match self.fail_with {
                Some(status) => Err(BackendError::Http { status }),
                None => Ok(UploadResult::new(1, 5)),
            }
        }

        fn ingest_file(&self, _upload: &FileUpload) -> Result<UploadResult, BackendError> {
            self.ingest_calls.fetch_add(1, Ordering::SeqCst);
            match self.fail_with {
                Some(status) => Err(BackendError::Http { status }),
                None => Ok(UploadResult::new(2, 40)),
            }
        }

        fn query(&self, _request: &QueryRequest) -> Result<QueryResult, BackendError> {
            self.query_calls.fetch_add(1, Ordering::SeqCst);
            match (self.fail_with, &self.answer) {
                (Some(status), _) => Err(BackendError::Http { status }),
                (None, Some(answer)) => Ok(answer.clone()),
                (None, None) => Ok(QueryResult::new("", Vec::new(), 0.0, 0, 0.0)),
            }
        }
    }

    fn sky_result() -> QueryResult {
        QueryResult::new(
            "It is blue [1].",
            vec![
                SourceExcerptBuilder::new()
                    .title("Notes")
                    .origin("user_input")
                    .section("")
                    .text("The sky is blue.")
                    .relevance_score(0.92)
                    .build(),
            ],
            640.0,
            42,
            0.0000042,
        )
    }

    fn two_source_result(answer: &str) -> QueryResult {
        QueryResult::new(
            answer,
            vec![
                SourceExcerptBuilder::new().title("A").text("alpha").build(),
                SourceExcerptBuilder::new().title("B").text("beta").build(),
            ],
            1.0,
            1,
            0.0,
        )
    }

    fn ask(session: &mut Session, backend: &MockBackend, question: &str) -> Settled {
        *session.question_mut() = question.to_string();
        let request = session.submit_query().expect("query should start");
        session.apply(execute(backend, request))
    }

    #[test]
    fn happy_path_upload_clears_fields() {
        let backend = MockBackend::default();
        let mut session = Session::default();
        session.form_mut().text = "The sky is blue.".to_string();
        session.form_mut().title = "Notes".to_string();

        let request = session.submit_text().expect("upload should start");
        match &request {
            Request::IngestText { body, .. } => {
                assert_eq!(body.text, "The sky is blue.");
                assert_eq!(body.title, "Notes");
                assert_eq!(body.source, "user_input");
            }
            other => panic!("unexpected request: {other:?}"),
        }
        assert!(session.is_ingesting());

        assert_eq!(session.apply(execute(&backend, request)), Settled::Committed);
        assert_eq!(session.upload_result(), Some(&UploadResult::new(1, 5)));
        assert_eq!(session.form().text, "");
        assert_eq!(session.form().title, "");
        assert!(session.notice().is_none());
    }

    #[test]
    fn happy_path_query_links_citation_to_excerpt() {
        let backend = MockBackend::answering(sky_result());
        let mut session = Session::default();

        ask(&mut session, &backend, "What color is the sky?");

        assert_eq!(
            session.answer_segments(),
            &[
                AnswerSegment::Text("It is blue ".to_string()),
                AnswerSegment::CitationRef(1),
                AnswerSegment::Text(".".to_string()),
            ]
        );

        assert!(session.select_citation(1));
        assert_eq!(session.selection(), Some(1));
        let (number, excerpt) = session.expanded_source().expect("excerpt expanded");
        assert_eq!(number, 1);
        assert_eq!(excerpt.text(), "The sky is blue.");
    }

    #[test]
    fn empty_query_never_reaches_backend() {
        let backend = MockBackend::default();
        let mut session = Session::default();
        *session.question_mut() = "   ".to_string();

        assert!(session.submit_query().is_none());
        assert_eq!(backend.query_calls.load(Ordering::SeqCst), 0);
        assert_eq!(session.query_state(), &OperationState::Idle);

        let notice = session.notice().expect("validation message shown");
        assert_eq!(notice.kind(), ErrorKind::Validation);
        assert_eq!(notice.message(), EMPTY_QUESTION_MESSAGE);
    }

    #[test]
    fn empty_text_upload_is_rejected() {
        let mut session = Session::default();
        session.form_mut().title = "Only a title".to_string();

        assert!(session.submit_text().is_none());
        assert_eq!(session.ingest_state(), &OperationState::Idle);
        assert_eq!(session.notice().unwrap().message(), EMPTY_TEXT_MESSAGE);
        assert_eq!(session.form().title, "Only a title");
    }

    #[test]
    fn transport_failure_preserves_question() {
        let backend = MockBackend::failing(500);
        let mut session = Session::default();

        ask(&mut session, &backend, "What color is the sky?");

        assert!(matches!(session.query_state(), OperationState::Failed(_)));
        assert_eq!(session.question(), "What color is the sky?");
        let notice = session.notice().unwrap();
        assert_eq!(notice.kind(), ErrorKind::Transport);
        assert_eq!(notice.message(), QUERY_FAILED_MESSAGE);
    }

    #[test]
    fn failed_upload_preserves_fields() {
        let backend = MockBackend::failing(503);
        let mut session = Session::default();
        session.form_mut().text = "body".to_string();
        session.form_mut().title = "title".to_string();

        let request = session.submit_text().unwrap();
        session.apply(execute(&backend, request));

        assert!(matches!(session.ingest_state(), OperationState::Failed(_)));
        assert_eq!(session.form().text, "body");
        assert_eq!(session.form().title, "title");
        assert_eq!(
            session.notice().unwrap().message(),
            TEXT_UPLOAD_FAILED_MESSAGE
        );
    }

    #[test]
    fn second_query_while_pending_is_ignored() {
        let backend = MockBackend::answering(sky_result());
        let mut session = Session::default();
        *session.question_mut() = "first".to_string();

        let first = session.submit_query().unwrap();
        let pending = session.query_state().clone();

        *session.question_mut() = "second".to_string();
        assert!(session.submit_query().is_none());
        assert_eq!(session.query_state(), &pending);

        session.apply(execute(&backend, first));
        assert_eq!(backend.query_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn ingestion_and_query_are_independent() {
        let mut session = Session::default();
        session.form_mut().text = "body".to_string();
        *session.question_mut() = "question".to_string();

        assert!(session.submit_text().is_some());
        assert!(session.submit_query().is_some());
        assert!(session.is_ingesting());
        assert!(session.is_querying());
    }

    #[test]
    fn text_and_file_uploads_share_one_slot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.md");
        std::fs::write(&path, "# Notes").unwrap();

        let mut session = Session::default();
        session.form_mut().text = "body".to_string();
        session.form_mut().file_path = path.display().to_string();

        assert!(session.submit_text().is_some());
        assert!(session.submit_file().is_none());
    }

    #[test]
    fn new_result_resets_selection() {
        let backend = MockBackend::answering(two_source_result("a [1] b [2]"));
        let mut session = Session::default();

        ask(&mut session, &backend, "first");
        session.select_source(2);
        assert_eq!(session.selection(), Some(2));

        *session.question_mut() = "second".to_string();
        let request = session.submit_query().unwrap();
        assert_eq!(session.selection(), None, "starting a query collapses");
        assert!(session.answer_segments().is_empty());
        assert!(session.sources().is_empty());

        session.apply(execute(&backend, request));
        assert_eq!(session.selection(), None, "new result also has [2]");
        assert_eq!(session.sources().len(), 2);
    }

    #[test]
    fn citation_and_source_clicks_are_the_same_transition() {
        let backend = MockBackend::answering(two_source_result("x [1] y [2]"));

        let mut by_citation = Session::default();
        ask(&mut by_citation, &backend, "q");
        let mut by_source = by_citation.clone();

        for n in [1, 2, 2, 1, 1] {
            by_citation.select_citation(n);
            by_source.select_source(n);
            assert_eq!(by_citation.selection(), by_source.selection());
        }
    }

    #[test]
    fn out_of_range_citation_is_inert() {
        let backend = MockBackend::answering(two_source_result("see [7]"));
        let mut session = Session::default();
        ask(&mut session, &backend, "q");

        assert!(!session.select_citation(7));
        assert!(!session.select_citation(0));
        assert_eq!(session.selection(), None);
    }

    #[test]
    fn sources_remain_clickable_without_inline_citations() {
        let backend = MockBackend::answering(two_source_result("No markers here."));
        let mut session = Session::default();
        ask(&mut session, &backend, "q");

        assert_eq!(session.answer_segments().len(), 1);
        assert!(session.select_source(2));
        assert_eq!(session.expanded_source().unwrap().1.title(), "B");
    }

    #[test]
    fn stale_completion_is_dropped() {
        let backend = MockBackend::answering(sky_result());
        let mut session = Session::default();
        *session.question_mut() = "q".to_string();

        let first = session.submit_query().unwrap();
        let completion = execute(&backend, first);
        session.apply(completion.clone());

        let second = session.submit_query().unwrap();
        assert_eq!(session.apply(completion), Settled::Stale);
        assert!(session.is_querying());

        session.apply(execute(&backend, second));
        assert!(session.query_result().is_some());
    }

    #[test]
    fn file_upload_success_clears_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "The sky is blue.").unwrap();

        let backend = MockBackend::default();
        let mut session = Session::default();
        session.form_mut().file_path = path.display().to_string();

        let request = session.submit_file().expect("file upload should start");
        session.apply(execute(&backend, request));

        assert_eq!(session.upload_result(), Some(&UploadResult::new(2, 40)));
        assert_eq!(session.form().file_path, "");
    }

    #[test]
    fn file_upload_failure_keeps_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "The sky is blue.").unwrap();

        let backend = MockBackend::failing(400);
        let mut session = Session::default();
        session.form_mut().file_path = path.display().to_string();

        let request = session.submit_file().unwrap();
        session.apply(execute(&backend, request));

        assert_eq!(session.form().file_path, path.display().to_string());
        assert_eq!(
            session.notice().unwrap().message(),
            FILE_UPLOAD_FAILED_MESSAGE
        );
    }

    #[test]
    fn unreadable_or_unsupported_file_is_validation() {
        let dir = tempfile::tempdir().unwrap();
        let backend = MockBackend::default();
        let mut session = Session::default();

        session.form_mut().file_path = dir.path().join("missing.txt").display().to_string();
        assert!(session.submit_file().is_none());
        assert_eq!(session.notice().unwrap().kind(), ErrorKind::Validation);

        session.form_mut().file_path = "slides.pptx".to_string();
        assert!(session.submit_file().is_none());
        assert_eq!(session.notice().unwrap().kind(), ErrorKind::Validation);

        session.form_mut().file_path = "  ".to_string();
        assert!(session.submit_file().is_none());
        assert_eq!(session.notice().unwrap().message(), EMPTY_FILE_MESSAGE);

        assert_eq!(session.ingest_state(), &OperationState::Idle);
        assert_eq!(backend.ingest_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn starting_a_request_clears_the_notice() {
        let mut session = Session::default();
        assert!(session.submit_query().is_none());
        assert!(session.notice().is_some());

        *session.question_mut() = "q".to_string();
        session.submit_query().unwrap();
        assert!(session.notice().is_none());
    }

    #[test]
    fn query_sends_fixed_top_k() {
        let mut session = Session::new(10);
        *session.question_mut() = "q".to_string();
        match session.submit_query().unwrap() {
            Request::Query { body, .. } => assert_eq!(body.top_k, 10),
            other => panic!("unexpected request: {other:?}"),
        }
    }
}
