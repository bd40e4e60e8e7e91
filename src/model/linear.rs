use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::model::task::{Assignee, StatusCategory, TaskNode, TicketStatus, User};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinearIssue {
    pub id: String,
    pub identifier: String,
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub state: LinearState,
    pub assignee: Option<LinearUser>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Only the first child id is requested; presence is all that matters.
    #[serde(default)]
    pub children: LinearChildren,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinearState {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub state_type: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinearUser {
    pub name: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LinearChildren {
    #[serde(default)]
    pub nodes: Vec<LinearChildRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinearChildRef {
    pub id: String,
}

impl From<LinearIssue> for TaskNode {
    fn from(issue: LinearIssue) -> Self {
        TaskNode {
            has_children: !issue.children.nodes.is_empty(),
            status: TicketStatus {
                category: StatusCategory::from_state_type(&issue.state.state_type),
                name: issue.state.name,
            },
            assignee: issue.assignee.map(|a| Assignee {
                name: a.name,
                email: a.email,
            }),
            description: issue.description,
            url: issue.url,
            updated_at: issue.updated_at,
            ..TaskNode::new(issue.id, issue.identifier, issue.title)
        }
    }
}

impl From<LinearUser> for User {
    fn from(user: LinearUser) -> Self {
        User {
            name: user.name,
            email: user.email,
        }
    }
}
