use chrono::Utc;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use unicode_width::UnicodeWidthStr;

use super::theme;
use super::util::{fit_width, format_age};
use crate::app::{App, Mode};
use crate::model::task::{StatusCategory, TaskNode};
use crate::navigation::{self, Selection, VisibleRow};

pub fn draw_tree(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    draw_ticket_list(f, chunks[0], app);
    draw_detail_pane(f, chunks[1], app);
}

pub fn status_style(category: StatusCategory) -> Style {
    match category {
        StatusCategory::Backlog => theme::STATUS_BACKLOG,
        StatusCategory::Active => theme::STATUS_ACTIVE,
        StatusCategory::Completed => theme::STATUS_COMPLETED,
        StatusCategory::Cancelled => theme::STATUS_CANCELLED,
    }
}

fn draw_ticket_list(f: &mut Frame, area: Rect, app: &App) {
    let focused = matches!(
        app.mode,
        Mode::IssueSelection | Mode::Search | Mode::SubtaskInput
    ) && app.selection != Selection::Input;
    let border_style = if focused {
        theme::BORDER_ACTIVE
    } else {
        theme::BORDER_INACTIVE
    };

    let roots = app.view_roots();
    let title = if app.searching {
        format!(" Tickets [{}/{}] ", roots.len(), app.tree.roots().len())
    } else {
        format!(" Tickets [{}] ", roots.len())
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style);

    let rows = navigation::visible_rows(roots);
    if rows.is_empty() {
        let msg = if app.loading_tickets {
            "Loading tickets…"
        } else if !app.tickets_enabled {
            "Ticket tracker not configured. Type a branch name above."
        } else if app.searching {
            "No tickets match"
        } else {
            "No assigned tickets"
        };
        let p = Paragraph::new(msg)
            .style(theme::EMPTY_STATE)
            .block(block)
            .wrap(Wrap { trim: false });
        f.render_widget(p, area);
        return;
    }

    let width = area.width.saturating_sub(2) as usize;
    let items: Vec<ListItem> = rows.iter().map(|row| row_item(row, app, width)).collect();

    let mut state = ListState::default();
    state.select(rows.iter().position(|r| r.selection == app.selection));

    let list = List::new(items)
        .block(block)
        .highlight_style(theme::LIST_SELECTED);

    f.render_stateful_widget(list, area, &mut state);
}

fn row_item<'a>(row: &VisibleRow<'a>, app: &App, width: usize) -> ListItem<'a> {
    let indent = "  ".repeat(row.depth);

    let Some(node) = row.node else {
        let editing = app.mode == Mode::SubtaskInput && app.selection == row.selection;
        let line = if editing {
            Line::from(vec![
                Span::raw(indent),
                Span::styled("+ ", theme::PLACEHOLDER),
                Span::styled(format!("{}█", app.subtask_input), theme::SUBTASK_DRAFT),
            ])
        } else {
            Line::from(vec![
                Span::raw(indent),
                Span::styled("+ add subtask", theme::PLACEHOLDER),
            ])
        };
        return ListItem::new(line);
    };

    let glyph = if node.expanded {
        "▾ "
    } else if node.has_children {
        "▸ "
    } else {
        "  "
    };
    let status = status_style(node.status.category);
    let unfetched = if node.needs_fetch() { " …" } else { "" };

    let used = indent.width() + glyph.width() + node.identifier.width() + 1 + unfetched.width();
    let title = fit_width(&node.title, width.saturating_sub(used));

    ListItem::new(Line::from(vec![
        Span::raw(indent),
        Span::styled(glyph, theme::TREE_GLYPH),
        Span::styled(node.identifier.as_str(), status.add_modifier(Modifier::BOLD)),
        Span::raw(" "),
        Span::styled(title, theme::LIST_NORMAL),
        Span::styled(unfetched, theme::TREE_UNFETCHED),
    ]))
}

fn draw_detail_pane(f: &mut Frame, area: Rect, app: &App) {
    let selected = app.selected_node();

    let title = match selected {
        Some(node) => format!(" {} ", node.identifier),
        None => " Detail ".to_string(),
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(theme::BORDER_INACTIVE);

    let node = match selected {
        Some(n) => n,
        None => {
            let p = Paragraph::new("Select a ticket to view details")
                .style(theme::EMPTY_STATE)
                .block(block);
            f.render_widget(p, area);
            return;
        }
    };

    let p = Paragraph::new(detail_lines(node))
        .block(block)
        .wrap(Wrap { trim: false });
    f.render_widget(p, area);
}

fn detail_lines(node: &TaskNode) -> Vec<Line<'_>> {
    let label = theme::LIST_NORMAL.add_modifier(Modifier::BOLD);
    let mut lines = vec![
        Line::from(Span::styled(node.title.as_str(), label)),
        Line::from(""),
        Line::from(vec![
            Span::styled("Status: ", label),
            Span::styled(node.status.name.as_str(), status_style(node.status.category)),
        ]),
    ];

    if let Some(ref assignee) = node.assignee {
        lines.push(Line::from(vec![
            Span::styled("Assignee: ", label),
            Span::raw(assignee.name.as_str()),
        ]));
    }

    if let Some(updated) = node.updated_at {
        lines.push(Line::from(vec![
            Span::styled("Updated: ", label),
            Span::raw(format_age(updated, Utc::now())),
        ]));
    }

    let branch = crate::branch::branch_name_for_ticket(&node.identifier, &node.title);
    if !branch.is_empty() {
        lines.push(Line::from(vec![
            Span::styled("Branch: ", label),
            Span::styled(branch, theme::BRANCH_LABEL),
        ]));
    }

    if !node.url.is_empty() {
        lines.push(Line::from(vec![
            Span::styled("URL: ", label),
            Span::raw(node.url.as_str()),
        ]));
    }

    lines.push(Line::from(""));
    match node.description {
        Some(ref desc) if !desc.trim().is_empty() => {
            for line in desc.lines() {
                lines.push(Line::from(Span::raw(line)));
            }
        }
        _ => lines.push(Line::from(Span::styled("No description", theme::EMPTY_STATE))),
    }

    lines
}
