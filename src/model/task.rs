use chrono::{DateTime, Utc};

/// Coarse workflow bucket a ticket status belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusCategory {
    #[default]
    Backlog,
    Active,
    Completed,
    Cancelled,
}

impl StatusCategory {
    /// Map a Linear workflow state type onto a category.
    pub fn from_state_type(state_type: &str) -> Self {
        match state_type {
            "started" => StatusCategory::Active,
            "completed" => StatusCategory::Completed,
            "canceled" | "cancelled" => StatusCategory::Cancelled,
            _ => StatusCategory::Backlog,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StatusCategory::Backlog => "backlog",
            StatusCategory::Active => "active",
            StatusCategory::Completed => "completed",
            StatusCategory::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TicketStatus {
    pub name: String,
    pub category: StatusCategory,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignee {
    pub name: String,
    pub email: Option<String>,
}

/// A ticket in the interactive tree.
///
/// `children` is either empty-and-unfetched (`has_children == true`) or fully
/// populated. `depth` and `parent_id` are stamped by [`crate::tree::TaskTree`]
/// and must not be edited by hand.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskNode {
    pub id: String,
    pub identifier: String,
    pub title: String,
    pub description: Option<String>,
    pub status: TicketStatus,
    pub assignee: Option<Assignee>,
    pub url: String,
    pub updated_at: Option<DateTime<Utc>>,
    pub children: Vec<TaskNode>,
    pub has_children: bool,
    pub expanded: bool,
    pub depth: usize,
    /// Back-reference by id; the parent owns this node, never the reverse.
    pub parent_id: Option<String>,
}

impl TaskNode {
    pub fn new(id: impl Into<String>, identifier: impl Into<String>, title: impl Into<String>) -> Self {
        TaskNode {
            id: id.into(),
            identifier: identifier.into(),
            title: title.into(),
            description: None,
            status: TicketStatus::default(),
            assignee: None,
            url: String::new(),
            updated_at: None,
            children: Vec::new(),
            has_children: false,
            expanded: false,
            depth: 0,
            parent_id: None,
        }
    }

    pub fn with_unfetched_children(mut self) -> Self {
        self.has_children = true;
        self
    }

    /// Children are advertised but have not been fetched yet.
    pub fn needs_fetch(&self) -> bool {
        self.has_children && self.children.is_empty()
    }

    /// Text the fuzzy filter matches against.
    pub fn search_text(&self) -> String {
        format!("{} {}", self.identifier, self.title)
    }
}

/// The authenticated ticket-tracker user.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub name: String,
    pub email: Option<String>,
}
