//! Keyboard event handling for the TUI.
//!
//! Maps crossterm keyboard events to application state changes.
//! Key behavior depends on the focused panel.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::app::{App, Focus};

/// Handles a keyboard event and updates the app state accordingly.
///
/// Returns `true` if the application should quit, `false` otherwise.
///
/// # Event Handling
///
/// - `Ctrl+C`: Quit from anywhere; `q` quits outside text inputs
/// - `Ctrl+T`: Switch between the Upload and Ask tabs
/// - `Tab` / `Shift+Tab`: Cycle focus within the tab
/// - `Esc`: Return to the first input and dismiss the notice
/// - `Ctrl+S`: Upload the pasted text
/// - Text inputs: typing and backspace; `Enter` submits (adds a newline in the body)
/// - `Answer`: h/l or arrows pick a citation, Enter toggles its excerpt
/// - `Sources`: j/k or arrows pick an excerpt, Enter toggles it
/// - Digits in `Answer` or `Sources` toggle that citation number directly
///
/// # Examples
///
/// ```
/// use minirag::tui::{App, event::handle_key_event};
/// use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
///
/// let mut app = App::default();
/// let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
/// let should_quit = handle_key_event(&mut app, key);
/// assert!(should_quit);
/// ```
pub fn handle_key_event(app: &mut App, key: KeyEvent) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('c') => return true,
            KeyCode::Char('t') => app.switch_tab(),
            KeyCode::Char('s') => app.submit_text(),
            _ => {}
        }
        return false;
    }

    if key.code == KeyCode::Char('q') && key.modifiers.is_empty() && !app.focus().is_text_input()
    {
        return true;
    }

    match key.code {
        KeyCode::Tab => {
            app.next_focus();
            return false;
        }
        KeyCode::BackTab => {
            app.prev_focus();
            return false;
        }
        KeyCode::Esc => {
            app.reset_focus();
            app.dismiss_notice();
            return false;
        }
        _ => {}
    }

    match app.focus() {
        Focus::Title | Focus::Body | Focus::FilePath | Focus::Question => {
            handle_text_input(app, key)
        }
        Focus::Answer => handle_answer(app, key),
        Focus::Sources => handle_sources(app, key),
    }

    false
}

/// Handles keyboard input when one of the text inputs is focused.
fn handle_text_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char(c) if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT => {
            app.push_char(c);
        }
        KeyCode::Backspace => app.pop_char(),
        KeyCode::Enter => match app.focus() {
            Focus::Body => app.push_char('\n'),
            Focus::Title => app.submit_text(),
            Focus::FilePath => app.submit_file(),
            Focus::Question => app.submit_query(),
            Focus::Answer | Focus::Sources => {}
        },
        _ => {}
    }
}

/// Handles keyboard input when the answer panel is focused.
fn handle_answer(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('l') | KeyCode::Right => app.next_badge(),
        KeyCode::Char('h') | KeyCode::Left => app.prev_badge(),
        KeyCode::Char('j') | KeyCode::Down => app.scroll_answer_down(1),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_answer_up(1),
        KeyCode::Enter => app.activate_badge(),
        KeyCode::Char(c) => toggle_digit(app, c),
        _ => {}
    }
}

/// Handles keyboard input when the source list is focused.
fn handle_sources(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.next_source(),
        KeyCode::Char('k') | KeyCode::Up => app.prev_source(),
        KeyCode::Enter | KeyCode::Char(' ') => app.activate_source(),
        KeyCode::Char(c) => toggle_digit(app, c),
        _ => {}
    }
}

fn toggle_digit(app: &mut App, c: char) {
    if let Some(number) = c.to_digit(10)
        && number > 0
    {
        app.toggle_number(number as usize);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{Completion, Request};
    use crate::models::{QueryResult, SourceExcerptBuilder};
    use crate::tui::Tab;

    fn press(app: &mut App, code: KeyCode) -> bool {
        handle_key_event(app, KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn ctrl(app: &mut App, c: char) -> bool {
        handle_key_event(app, KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL))
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn answer(app: &mut App, request: Request) {
        let sources = vec![
            SourceExcerptBuilder::new().title("A").text("alpha").build(),
            SourceExcerptBuilder::new().title("B").text("beta").build(),
        ];
        app.apply(Completion::Query {
            ticket: request.ticket(),
            result: Ok(QueryResult::new("x [1] y [2]", sources, 1.0, 1, 0.0)),
        });
    }

    #[test]
    fn ctrl_c_quits_from_text_input() {
        let mut app = App::default();
        assert_eq!(app.focus(), Focus::Title);
        assert!(ctrl(&mut app, 'c'));
    }

    #[test]
    fn q_is_typed_inside_text_inputs() {
        let mut app = App::default();
        assert!(!press(&mut app, KeyCode::Char('q')));
        assert_eq!(app.session().form().title, "q");
    }

    #[test]
    fn q_quits_from_list_panels() {
        let mut app = App::default();
        ctrl(&mut app, 't');
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.focus(), Focus::Answer);
        assert!(press(&mut app, KeyCode::Char('q')));
    }

    #[test]
    fn ctrl_t_switches_tab() {
        let mut app = App::default();
        assert!(!ctrl(&mut app, 't'));
        assert_eq!(app.tab(), Tab::Ask);
        assert_eq!(app.focus(), Focus::Question);
    }

    #[test]
    fn tab_and_backtab_cycle_focus() {
        let mut app = App::default();
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.focus(), Focus::Body);
        press(&mut app, KeyCode::BackTab);
        assert_eq!(app.focus(), Focus::Title);
        press(&mut app, KeyCode::BackTab);
        assert_eq!(app.focus(), Focus::FilePath);
    }

    #[test]
    fn enter_in_body_adds_newline_and_ctrl_s_uploads() {
        let mut app = App::default();
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "one");
        press(&mut app, KeyCode::Enter);
        type_text(&mut app, "two");
        assert_eq!(app.session().form().text, "one\ntwo");
        assert!(app.take_requests().is_empty());

        ctrl(&mut app, 's');
        assert_eq!(app.take_requests().len(), 1);
    }

    #[test]
    fn enter_in_empty_question_shows_validation() {
        let mut app = App::default();
        ctrl(&mut app, 't');
        press(&mut app, KeyCode::Enter);

        assert!(app.take_requests().is_empty());
        assert!(app.session().notice().is_some());

        press(&mut app, KeyCode::Esc);
        assert!(app.session().notice().is_none());
    }

    #[test]
    fn shift_modified_characters_are_typed() {
        let mut app = App::default();
        handle_key_event(
            &mut app,
            KeyEvent::new(KeyCode::Char('A'), KeyModifiers::SHIFT),
        );
        assert_eq!(app.session().form().title, "A");
    }

    #[test]
    fn answer_and_source_keys_toggle_same_selection() {
        let mut app = App::default();
        ctrl(&mut app, 't');
        type_text(&mut app, "q?");
        press(&mut app, KeyCode::Enter);
        let request = app.take_requests().pop().unwrap();
        answer(&mut app, request);

        press(&mut app, KeyCode::Tab);
        assert_eq!(app.focus(), Focus::Answer);
        press(&mut app, KeyCode::Char('l'));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.session().selection(), Some(2));

        press(&mut app, KeyCode::Tab);
        assert_eq!(app.focus(), Focus::Sources);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.session().selection(), None);

        press(&mut app, KeyCode::Char('1'));
        assert_eq!(app.session().selection(), Some(1));
        press(&mut app, KeyCode::Char('0'));
        assert_eq!(app.session().selection(), Some(1));
    }

    #[test]
    fn backspace_on_empty_input_is_safe() {
        let mut app = App::default();
        press(&mut app, KeyCode::Backspace);
        press(&mut app, KeyCode::Backspace);
        assert_eq!(app.session().form().title, "");
    }
}
