use ratatui::style::{Color, Modifier, Style};

// Header / input line
pub const HEADER_TITLE: Style = Style::new().fg(Color::Cyan).add_modifier(Modifier::BOLD);
pub const INPUT_TEXT: Style = Style::new().fg(Color::White);
pub const INPUT_PLACEHOLDER: Style = Style::new().fg(Color::DarkGray);
pub const INPUT_FOCUSED: Style = Style::new().fg(Color::Black).bg(Color::Cyan);
pub const SEARCH_INPUT: Style = Style::new().fg(Color::Yellow);

// Status bar
pub const STATUS_BAR: Style = Style::new().fg(Color::White).bg(Color::DarkGray);
pub const STATUS_ERROR: Style = Style::new().fg(Color::Red).bg(Color::DarkGray);
pub const MODE_BADGE: Style = Style::new()
    .fg(Color::Black)
    .bg(Color::Yellow)
    .add_modifier(Modifier::BOLD);

// List items
pub const LIST_SELECTED: Style = Style::new()
    .fg(Color::White)
    .bg(Color::DarkGray)
    .add_modifier(Modifier::BOLD);
pub const LIST_NORMAL: Style = Style::new().fg(Color::White);

// Tree
pub const TREE_GLYPH: Style = Style::new().fg(Color::DarkGray);
pub const TREE_UNFETCHED: Style = Style::new().fg(Color::DarkGray).add_modifier(Modifier::ITALIC);
pub const PLACEHOLDER: Style = Style::new().fg(Color::Green).add_modifier(Modifier::DIM);
pub const SUBTASK_DRAFT: Style = Style::new().fg(Color::Green);

// Ticket status
pub const STATUS_BACKLOG: Style = Style::new().fg(Color::DarkGray);
pub const STATUS_ACTIVE: Style = Style::new().fg(Color::Cyan);
pub const STATUS_COMPLETED: Style = Style::new().fg(Color::Green);
pub const STATUS_CANCELLED: Style = Style::new().fg(Color::Red).add_modifier(Modifier::CROSSED_OUT);

// Borders
pub const BORDER_ACTIVE: Style = Style::new().fg(Color::Cyan);
pub const BORDER_INACTIVE: Style = Style::new().fg(Color::DarkGray);

// Help overlay
pub const HELP_TITLE: Style = Style::new().fg(Color::Cyan).add_modifier(Modifier::BOLD);
pub const HELP_KEY: Style = Style::new().fg(Color::Yellow).add_modifier(Modifier::BOLD);
pub const HELP_DESC: Style = Style::new().fg(Color::White);

// Footer hints
pub const HINT_KEY: Style = Style::new().fg(Color::Yellow).bg(Color::DarkGray);
pub const HINT_DESC: Style = Style::new().fg(Color::Gray).bg(Color::DarkGray);

// Empty state
pub const EMPTY_STATE: Style = Style::new().fg(Color::DarkGray);

// Branch label
pub const BRANCH_LABEL: Style = Style::new().fg(Color::Yellow);

// Popups
pub const SPINNER: Style = Style::new().fg(Color::Cyan).add_modifier(Modifier::BOLD);
pub const RESULT_SUCCESS: Style = Style::new().fg(Color::Green).add_modifier(Modifier::BOLD);
pub const RESULT_ERROR: Style = Style::new().fg(Color::Red).add_modifier(Modifier::BOLD);
