use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

use super::util::centered_rect;
use super::{help_overlay, theme, tree_view};
use crate::app::{App, Mode, ResultMessage};
use crate::navigation::Selection;

const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

pub fn spinner(frame: usize) -> &'static str {
    SPINNER_FRAMES[frame % SPINNER_FRAMES.len()]
}

pub fn draw_layout(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Input line
            Constraint::Min(3),    // Tree + detail
            Constraint::Length(1), // Status bar
        ])
        .split(f.area());

    draw_header(f, chunks[0], app);
    tree_view::draw_tree(f, chunks[1], app);
    draw_status_bar(f, chunks[2], app);

    match app.mode {
        Mode::Loading => draw_loading(f, f.area(), app),
        Mode::Result => draw_result(f, f.area(), app),
        _ => {}
    }

    // Help overlay (on top of everything)
    if app.show_help {
        help_overlay::draw_help(f, f.area());
    }
}

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
    let input_focused = app.mode == Mode::Input || (app.mode == Mode::Search && app.selection == Selection::Input);
    let border_style = if input_focused {
        theme::BORDER_ACTIVE
    } else {
        theme::BORDER_INACTIVE
    };

    let block = Block::default()
        .title(Span::styled(" sprout ", theme::HEADER_TITLE))
        .borders(Borders::ALL)
        .border_style(border_style);

    let cursor = if input_focused { "█" } else { "" };
    let line = if app.mode == Mode::Search {
        Line::from(vec![
            Span::styled("/ ", theme::SEARCH_INPUT),
            Span::styled(format!("{}{}", app.search_query, cursor), theme::SEARCH_INPUT),
        ])
    } else if app.custom_input.is_empty() && app.mode == Mode::Input {
        Line::from(vec![
            Span::styled("> ", theme::INPUT_FOCUSED),
            Span::raw(" "),
            Span::styled("Type a branch name, or press ↓ to pick a ticket", theme::INPUT_PLACEHOLDER),
        ])
    } else {
        Line::from(vec![
            Span::styled("> ", if input_focused { theme::INPUT_FOCUSED } else { theme::INPUT_PLACEHOLDER }),
            Span::raw(" "),
            Span::styled(format!("{}{}", app.custom_input, cursor), theme::INPUT_TEXT),
        ])
    };

    f.render_widget(Paragraph::new(line).block(block), area);
}

fn hint_text(app: &App) -> Vec<(&'static str, &'static str)> {
    match app.mode {
        Mode::Input => vec![("Enter", "create"), ("↓/↑", "tickets"), ("/", "search"), ("Esc", "quit")],
        Mode::IssueSelection => vec![
            ("↑/↓", "nav"),
            ("→/←", "expand"),
            ("Enter", "create"),
            ("/", "search"),
            ("r", "refresh"),
            ("?", "help"),
        ],
        Mode::Search => vec![("↑/↓", "nav"), ("Enter", "create"), ("Esc", "back")],
        Mode::SubtaskInput => vec![("Enter", "save subtask"), ("Esc", "cancel")],
        Mode::Loading => vec![("Esc", "quit")],
        Mode::Result => vec![("any key", "exit")],
    }
}

fn draw_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let mut left_spans: Vec<Span> = Vec::new();

    let badge = match app.mode {
        Mode::Search => Some(" SEARCH "),
        Mode::SubtaskInput => Some(" NEW SUBTASK "),
        _ => None,
    };
    if let Some(badge) = badge {
        left_spans.push(Span::styled(badge, theme::MODE_BADGE));
    }

    if app.loading_tickets {
        left_spans.push(Span::styled(
            format!(" {} loading tickets ", spinner(app.spinner_frame)),
            theme::STATUS_BAR,
        ));
    }

    // Error display
    if let Some(ref err) = app.last_error {
        left_spans.push(Span::styled(format!(" ERR: {} ", err), theme::STATUS_ERROR));
    }

    // Build right-aligned hint spans
    let hints = hint_text(app);
    let mut hint_spans: Vec<Span> = Vec::new();
    for (i, (key, desc)) in hints.iter().enumerate() {
        if i > 0 {
            hint_spans.push(Span::styled("  ", theme::STATUS_BAR));
        }
        hint_spans.push(Span::styled(*key, theme::HINT_KEY));
        hint_spans.push(Span::styled(":", theme::HINT_DESC));
        hint_spans.push(Span::styled(*desc, theme::HINT_DESC));
    }
    hint_spans.push(Span::styled(" ", theme::STATUS_BAR));

    let left_width: usize = left_spans.iter().map(|s| s.width()).sum();
    let hint_width: usize = hint_spans.iter().map(|s| s.width()).sum();
    let total = area.width as usize;
    let gap = total.saturating_sub(left_width + hint_width);

    let mut spans = left_spans;
    spans.push(Span::styled(" ".repeat(gap), theme::STATUS_BAR));
    spans.extend(hint_spans);

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_loading(f: &mut Frame, area: Rect, app: &App) {
    let popup_area = centered_rect(56, 5, area);
    f.render_widget(Clear, popup_area);

    let what = app
        .pending
        .as_ref()
        .map(|c| c.describe())
        .unwrap_or_else(|| "Working".to_string());

    let lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled(format!("  {} ", spinner(app.spinner_frame)), theme::SPINNER),
            Span::raw(format!("{}…", what)),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::BORDER_ACTIVE);
    f.render_widget(Paragraph::new(lines).block(block), popup_area);
}

fn draw_result(f: &mut Frame, area: Rect, app: &App) {
    let (title, style, message) = match app.result {
        Some(ResultMessage::Success(ref m)) => (" Done ", theme::RESULT_SUCCESS, m.as_str()),
        Some(ResultMessage::Error(ref m)) => (" Error ", theme::RESULT_ERROR, m.as_str()),
        None => return,
    };

    let mut lines = vec![Line::from("")];
    for l in message.lines() {
        lines.push(Line::from(Span::styled(format!("  {}", l), style)));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("  press any key to exit", theme::EMPTY_STATE)));

    let popup_area = centered_rect(76, lines.len() as u16 + 4, area);
    f.render_widget(Clear, popup_area);

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(style);
    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    f.render_widget(paragraph, popup_area);
}
