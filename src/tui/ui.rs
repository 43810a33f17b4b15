//! UI rendering functions for the TUI.
//!
//! Draws the Upload and Ask tabs with ratatui widgets. All text comes from
//! [`crate::presentation`], so the terminal shows the same figures as the CLI.

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Tabs, Wrap},
};

use super::app::{App, Focus, Tab};
use crate::error::ErrorKind;
use crate::presentation::{AnswerPiece, AnswerView, UploadSummary};

/// Main rendering function for the TUI.
///
/// # Arguments
///
/// * `frame` - The ratatui Frame to render into
/// * `app` - The application state
pub fn draw(frame: &mut Frame, app: &App) {
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tabs
            Constraint::Length(1), // Notice
            Constraint::Min(0),    // Content area
            Constraint::Length(1), // Shortcut bar
        ])
        .split(frame.area());

    render_tabs(frame, app, main_chunks[0]);
    render_notice(frame, app, main_chunks[1]);
    match app.tab() {
        Tab::Upload => render_upload_tab(frame, app, main_chunks[2]),
        Tab::Ask => render_ask_tab(frame, app, main_chunks[2]),
    }
    render_shortcut_bar(frame, app, main_chunks[3]);
}

fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    }
}

fn panel(title: &str, focused: bool) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(border_style(focused))
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let selected = match app.tab() {
        Tab::Upload => 0,
        Tab::Ask => 1,
    };
    let tabs = Tabs::new(vec!["Upload Documents", "Ask Questions"])
        .block(Block::default().borders(Borders::ALL).title("minirag"))
        .select(selected)
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );

    frame.render_widget(tabs, area);
}

fn render_notice(frame: &mut Frame, app: &App, area: Rect) {
    let Some(notice) = app.session().notice() else {
        return;
    };

    let color = match notice.kind() {
        ErrorKind::Validation => Color::Yellow,
        ErrorKind::Transport | ErrorKind::Format => Color::Red,
    };
    let paragraph = Paragraph::new(Span::styled(
        notice.message().to_string(),
        Style::default().fg(color),
    ));

    frame.render_widget(paragraph, area);
}

/// Renders a single-line input with a cursor indicator when focused.
fn render_input(frame: &mut Frame, title: &str, value: &str, focused: bool, area: Rect) {
    let mut content = value.to_string();
    if focused {
        content.push('█');
    }

    let paragraph = Paragraph::new(content)
        .block(panel(title, focused))
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, area);
}

fn render_upload_tab(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(3),    // Body
            Constraint::Length(3), // File path
            Constraint::Length(3), // Status
        ])
        .split(area);

    let form = app.session().form();
    let focus = app.focus();
    render_input(
        frame,
        "Document Title (optional)",
        &form.title,
        focus == Focus::Title,
        chunks[0],
    );
    render_input(
        frame,
        "Document Content",
        &form.text,
        focus == Focus::Body,
        chunks[1],
    );
    render_input(
        frame,
        "File (.txt, .md, .pdf)",
        &form.file_path,
        focus == Focus::FilePath,
        chunks[2],
    );

    let status = if app.session().is_ingesting() {
        Line::from(Span::styled(
            format!("{} Processing...", app.spinner()),
            Style::default().fg(Color::Yellow),
        ))
    } else if let Some(result) = app.session().upload_result() {
        Line::from(Span::styled(
            UploadSummary::from_result(result).to_string(),
            Style::default().fg(Color::Green),
        ))
    } else {
        Line::from("")
    };
    frame.render_widget(
        Paragraph::new(status).block(Block::default().borders(Borders::ALL).title("Status")),
        chunks[3],
    );
}

fn render_ask_tab(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Question
            Constraint::Length(1), // Metrics / pending
            Constraint::Min(0),    // Answer and sources
        ])
        .split(area);

    render_input(
        frame,
        "Your Question",
        app.session().question(),
        app.focus() == Focus::Question,
        chunks[0],
    );

    let view = AnswerView::from_session(app.session());

    let status = if app.session().is_querying() {
        Line::from(Span::styled(
            format!("{} Thinking...", app.spinner()),
            Style::default().fg(Color::Yellow),
        ))
    } else if let Some(view) = &view {
        Line::from(Span::styled(
            view.metrics.to_string(),
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Line::from("")
    };
    frame.render_widget(Paragraph::new(status), chunks[1]);

    let Some(view) = view else {
        frame.render_widget(
            Paragraph::new("No answer yet").block(panel("Answer", app.focus() == Focus::Answer)),
            chunks[2],
        );
        return;
    };

    if view.shows_sources() {
        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[2]);
        render_answer(frame, app, &view, content_chunks[0]);
        render_sources(frame, app, &view, content_chunks[1]);
    } else {
        render_answer(frame, app, &view, chunks[2]);
    }
}

/// Builds the answer text, styling badges by link, selection and cursor.
fn answer_text(app: &App, view: &AnswerView<'_>) -> Text<'static> {
    let cursor = (app.focus() == Focus::Answer)
        .then(|| app.badge_cursor())
        .flatten();

    let mut lines = vec![Line::default()];
    let mut linked_seen = 0;

    for piece in &view.pieces {
        match piece {
            AnswerPiece::Text(text) => {
                for (i, part) in text.split('\n').enumerate() {
                    if i > 0 {
                        lines.push(Line::default());
                    }
                    if !part.is_empty()
                        && let Some(line) = lines.last_mut()
                    {
                        line.spans.push(Span::raw(part.to_string()));
                    }
                }
            }
            AnswerPiece::Badge {
                number,
                linked,
                active,
            } => {
                let mut style = if *linked {
                    Style::default().fg(Color::Cyan)
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                if *active {
                    style = style.add_modifier(Modifier::REVERSED);
                }
                if *linked {
                    if cursor == Some(linked_seen) {
                        style = style.add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
                    }
                    linked_seen += 1;
                }
                if let Some(line) = lines.last_mut() {
                    line.spans.push(Span::styled(format!("[{number}]"), style));
                }
            }
        }
    }

    Text::from(lines)
}

fn render_answer(frame: &mut Frame, app: &App, view: &AnswerView<'_>, area: Rect) {
    let paragraph = Paragraph::new(answer_text(app, view))
        .block(panel("Answer", app.focus() == Focus::Answer))
        .wrap(Wrap { trim: false })
        .scroll((app.answer_scroll(), 0));

    frame.render_widget(paragraph, area);
}

fn render_sources(frame: &mut Frame, app: &App, view: &AnswerView<'_>, area: Rect) {
    let focused = app.focus() == Focus::Sources;
    let cursor = focused.then(|| app.source_cursor()).flatten();
    let mut text = Text::default();

    for card in &view.sources {
        let mut header_style = Style::default().add_modifier(Modifier::BOLD);
        if cursor == Some(card.number) {
            header_style = header_style.add_modifier(Modifier::REVERSED);
        }
        let marker = if card.expanded { "v" } else { ">" };

        text.lines.push(Line::from(vec![
            Span::styled(format!("{marker} [{}] {}", card.number, card.title), header_style),
            Span::raw(" "),
            Span::styled(card.relevance.clone(), Style::default().fg(Color::Green)),
        ]));

        let mut meta = vec![Span::styled(
            format!("    {}", card.origin),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )];
        if let Some(section) = card.section {
            meta.push(Span::styled(
                format!(" | {section}"),
                Style::default().fg(Color::DarkGray),
            ));
        }
        text.lines.push(Line::from(meta));

        if let Some(body) = card.text {
            for line in body.lines() {
                text.lines.push(Line::from(format!("    {line}")));
            }
        }
        text.lines.push(Line::from(""));
    }

    let paragraph = Paragraph::new(text)
        .block(panel("Sources", focused))
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, area);
}

/// Renders the shortcut bar at the bottom of the screen.
///
/// Shows context-aware keyboard shortcuts based on current focus state.
/// Format: `Key: action | Key: action` with keys highlighted in cyan.
fn render_shortcut_bar(frame: &mut Frame, app: &App, area: Rect) {
    let key_style = Style::default().fg(Color::Cyan);
    let sep_style = Style::default().fg(Color::DarkGray);

    let mut spans = vec![
        Span::styled("Ctrl+C", key_style),
        Span::raw(": quit"),
        Span::styled(" | ", sep_style),
        Span::styled("Ctrl+T", key_style),
        Span::raw(": switch tab"),
        Span::styled(" | ", sep_style),
        Span::styled("Tab", key_style),
        Span::raw(": next panel"),
    ];

    let extra: &[(&str, &str)] = match app.focus() {
        Focus::Title => &[("Enter/Ctrl+S", ": upload text")],
        Focus::Body => &[("Ctrl+S", ": upload text")],
        Focus::FilePath => &[("Enter", ": upload file")],
        Focus::Question => &[("Enter", ": ask")],
        Focus::Answer => &[("h/l", ": citation"), ("Enter", ": show source")],
        Focus::Sources => &[("j/k", ": navigate"), ("Enter", ": expand")],
    };
    for (key, action) in extra {
        spans.push(Span::styled(" | ", sep_style));
        spans.push(Span::styled(*key, key_style));
        spans.push(Span::raw(*action));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
