use crate::coordinator::Settled;
use crate::dispatch::{Completion, Request};
use crate::presentation::AnswerView;
use crate::session::Session;

const SPINNER: [char; 4] = ['|', '/', '-', '\\'];

/// Application state for the TUI.
///
/// Wraps the [`Session`] with panel focus, list cursors and the requests waiting to be
/// dispatched by the event loop.
#[derive(Debug, Clone)]
pub struct App {
    /// Inputs, operations and the current answer
    session: Session,
    /// Visible tab
    tab: Tab,
    /// Currently focused panel
    focus: Focus,
    /// Index into the linked citation badges of the answer
    badge_cursor: usize,
    /// Zero-based index into the source list
    source_cursor: usize,
    /// Scroll offset for the answer panel
    answer_scroll: u16,
    /// Requests submitted since the last drain
    outbox: Vec<Request>,
    /// Frame counter for the pending indicator
    ticks: usize,
}

/// The two screens of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    /// Paste text or pick a file to ingest
    Upload,
    /// Ask a question and browse the cited sources
    Ask,
}

/// Panel focus state for keyboard navigation.
///
/// Determines which panel receives keyboard input and how keys are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    /// Document title input (Upload tab)
    Title,
    /// Document body input (Upload tab)
    Body,
    /// File path input (Upload tab)
    FilePath,
    /// Question input (Ask tab)
    Question,
    /// Answer panel, h/l move between citation badges
    Answer,
    /// Source list, j/k move between excerpts
    Sources,
}

impl Focus {
    /// Returns true for panels that accept typed characters.
    pub fn is_text_input(self) -> bool {
        matches!(
            self,
            Focus::Title | Focus::Body | Focus::FilePath | Focus::Question
        )
    }
}

impl App {
    /// Creates an app on the Upload tab with the title field focused.
    ///
    /// # Examples
    ///
    /// ```
    /// use minirag::Session;
    /// use minirag::tui::{App, Focus, Tab};
    ///
    /// let app = App::new(Session::default());
    /// assert_eq!(app.tab(), Tab::Upload);
    /// assert_eq!(app.focus(), Focus::Title);
    /// ```
    pub fn new(session: Session) -> Self {
        Self {
            session,
            tab: Tab::Upload,
            focus: Focus::Title,
            badge_cursor: 0,
            source_cursor: 0,
            answer_scroll: 0,
            outbox: Vec::new(),
            ticks: 0,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn answer_scroll(&self) -> u16 {
        self.answer_scroll
    }

    /// Switches between the Upload and Ask tabs, focusing the first input.
    pub fn switch_tab(&mut self) {
        self.tab = match self.tab {
            Tab::Upload => Tab::Ask,
            Tab::Ask => Tab::Upload,
        };
        self.reset_focus();
    }

    /// Returns focus to the first panel of the current tab.
    pub fn reset_focus(&mut self) {
        self.focus = match self.tab {
            Tab::Upload => Focus::Title,
            Tab::Ask => Focus::Question,
        };
    }

    /// Cycles focus to the next panel of the current tab.
    ///
    /// Upload: `Title` -> `Body` -> `FilePath`. Ask: `Question` -> `Answer` -> `Sources`.
    pub fn next_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Title => Focus::Body,
            Focus::Body => Focus::FilePath,
            Focus::FilePath => Focus::Title,
            Focus::Question => Focus::Answer,
            Focus::Answer => Focus::Sources,
            Focus::Sources => Focus::Question,
        };
    }

    /// Cycles focus to the previous panel of the current tab.
    pub fn prev_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Title => Focus::FilePath,
            Focus::Body => Focus::Title,
            Focus::FilePath => Focus::Body,
            Focus::Question => Focus::Sources,
            Focus::Answer => Focus::Question,
            Focus::Sources => Focus::Answer,
        };
    }

    fn focused_input(&mut self) -> Option<&mut String> {
        match self.focus {
            Focus::Title => Some(&mut self.session.form_mut().title),
            Focus::Body => Some(&mut self.session.form_mut().text),
            Focus::FilePath => Some(&mut self.session.form_mut().file_path),
            Focus::Question => Some(self.session.question_mut()),
            Focus::Answer | Focus::Sources => None,
        }
    }

    /// Appends a character to the focused input.
    pub fn push_char(&mut self, c: char) {
        if let Some(input) = self.focused_input() {
            input.push(c);
        }
    }

    /// Removes the last character of the focused input.
    pub fn pop_char(&mut self) {
        if let Some(input) = self.focused_input() {
            input.pop();
        }
    }

    /// Hides the current notice.
    pub fn dismiss_notice(&mut self) {
        self.session.dismiss_notice();
    }

    /// Submits the pasted text for ingestion.
    pub fn submit_text(&mut self) {
        if let Some(request) = self.session.submit_text() {
            self.outbox.push(request);
        }
    }

    /// Submits the file named in the path input for ingestion.
    pub fn submit_file(&mut self) {
        if let Some(request) = self.session.submit_file() {
            self.outbox.push(request);
        }
    }

    /// Submits the question.
    pub fn submit_query(&mut self) {
        if let Some(request) = self.session.submit_query() {
            self.reset_cursors();
            self.outbox.push(request);
        }
    }

    /// Removes and returns the requests waiting to be dispatched.
    pub fn take_requests(&mut self) -> Vec<Request> {
        std::mem::take(&mut self.outbox)
    }

    /// Applies a completion posted by a worker thread.
    pub fn apply(&mut self, completion: Completion) {
        let is_query = matches!(completion, Completion::Query { .. });
        if self.session.apply(completion) == Settled::Committed && is_query {
            self.reset_cursors();
        }
    }

    fn reset_cursors(&mut self) {
        self.badge_cursor = 0;
        self.source_cursor = 0;
        self.answer_scroll = 0;
    }

    /// Citation numbers in the answer that link to an excerpt, in answer order.
    pub fn linked_citations(&self) -> Vec<usize> {
        AnswerView::from_session(&self.session)
            .map(|view| view.linked_badges())
            .unwrap_or_default()
    }

    /// Returns the position of the highlighted badge among the linked badges.
    pub fn badge_cursor(&self) -> Option<usize> {
        (self.badge_cursor < self.linked_citations().len()).then_some(self.badge_cursor)
    }

    /// Returns the citation number of the highlighted source, if there are sources.
    pub fn source_cursor(&self) -> Option<usize> {
        let number = self.source_cursor + 1;
        self.session.sources().contains(number).then_some(number)
    }

    /// Moves the badge cursor right, wrapping at the end.
    pub fn next_badge(&mut self) {
        let count = self.linked_citations().len();
        if count > 0 {
            self.badge_cursor = (self.badge_cursor + 1) % count;
        }
    }

    /// Moves the badge cursor left, wrapping at the start.
    pub fn prev_badge(&mut self) {
        let count = self.linked_citations().len();
        if count > 0 {
            self.badge_cursor = (self.badge_cursor + count - 1) % count;
        }
    }

    /// Moves the source cursor down, wrapping at the end.
    pub fn next_source(&mut self) {
        let count = self.session.sources().len();
        if count > 0 {
            self.source_cursor = (self.source_cursor + 1) % count;
        }
    }

    /// Moves the source cursor up, wrapping at the start.
    pub fn prev_source(&mut self) {
        let count = self.session.sources().len();
        if count > 0 {
            self.source_cursor = (self.source_cursor + count - 1) % count;
        }
    }

    /// Toggles the excerpt behind the highlighted badge.
    pub fn activate_badge(&mut self) {
        if let Some(number) = self.linked_citations().get(self.badge_cursor).copied() {
            self.session.select_citation(number);
            self.source_cursor = number - 1;
        }
    }

    /// Toggles the highlighted source.
    pub fn activate_source(&mut self) {
        if let Some(number) = self.source_cursor() {
            self.session.select_source(number);
        }
    }

    /// Toggles the excerpt for a citation number typed directly.
    pub fn toggle_number(&mut self, number: usize) {
        if self.session.select_citation(number) {
            self.source_cursor = number - 1;
        }
    }

    pub fn scroll_answer_down(&mut self, amount: u16) {
        self.answer_scroll = self.answer_scroll.saturating_add(amount);
    }

    pub fn scroll_answer_up(&mut self, amount: u16) {
        self.answer_scroll = self.answer_scroll.saturating_sub(amount);
    }

    /// Advances the pending indicator by one frame.
    pub fn tick(&mut self) {
        self.ticks = self.ticks.wrapping_add(1);
    }

    /// Returns the current frame of the pending indicator.
    pub fn spinner(&self) -> char {
        SPINNER[self.ticks % SPINNER.len()]
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new(Session::default())
    }
}
