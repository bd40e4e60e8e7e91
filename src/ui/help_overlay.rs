use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use super::theme;
use super::util::centered_rect;

const BINDINGS: [(&str, &str); 13] = [
    ("Up / Down", "Move through tickets; wraps to the input line"),
    ("Right", "Expand / load subtasks"),
    ("Left", "Collapse / go to parent"),
    ("Enter", "Create workspace for ticket"),
    ("Enter (+ row)", "Add a subtask"),
    ("/", "Fuzzy search tickets"),
    ("r", "Refresh tickets"),
    ("Esc (search)", "Leave search"),
    ("Esc (subtask)", "Discard subtask draft"),
    ("Type + Enter", "Create workspace for a branch name"),
    ("Esc", "Quit"),
    ("Ctrl+C", "Quit"),
    ("?", "Toggle this help"),
];

pub fn draw_help(f: &mut Frame, area: Rect) {
    let popup_area = centered_rect(64, BINDINGS.len() as u16 + 4, area);

    f.render_widget(Clear, popup_area);

    let mut lines = vec![
        Line::from(Span::styled(" Keybindings", theme::HELP_TITLE)),
        Line::from(""),
    ];

    for (key, desc) in &BINDINGS {
        lines.push(Line::from(vec![
            Span::styled(format!("  {:16}", key), theme::HELP_KEY),
            Span::styled(*desc, theme::HELP_DESC),
        ]));
    }

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(theme::BORDER_ACTIVE);

    let paragraph = Paragraph::new(lines).block(block);
    f.render_widget(paragraph, popup_area);
}
