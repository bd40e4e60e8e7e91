use std::path::PathBuf;

use crate::error::{Result, SproutError};
use crate::model::task::{TaskNode, User};
use crate::model::workspace::WorkspaceInfo;

/// Source of tickets (Linear in production).
pub trait TicketProvider: Send + Sync {
    /// Root tickets assigned to the current user, with `has_children` set.
    fn assigned_tickets(&self) -> Result<Vec<TaskNode>>;
    fn children(&self, ticket_id: &str) -> Result<Vec<TaskNode>>;
    fn create_subtask(&self, parent_id: &str, title: &str) -> Result<TaskNode>;
    fn current_user(&self) -> Result<User>;
    fn test_connection(&self) -> Result<()>;
}

/// Manages git working-directory copies.
pub trait WorkspaceProvider: Send + Sync {
    fn create_workspace(&self, branch: &str) -> Result<PathBuf>;
    fn list_workspaces(&self) -> Result<Vec<WorkspaceInfo>>;
    fn prune_workspace(&self, branch: &str) -> Result<()>;
    /// Prune every workspace whose branch is merged; returns pruned branches.
    fn prune_all_merged(&self) -> Result<Vec<String>>;
}

/// Stand-in used when no ticket tracker is configured.
pub struct NoTickets;

impl NoTickets {
    fn unconfigured<T>() -> Result<T> {
        Err(SproutError::Configuration(format!(
            "no Linear API key (set linear.api_key in {} or {})",
            crate::config::CONFIG_FILE,
            crate::config::API_KEY_ENV
        )))
    }
}

impl TicketProvider for NoTickets {
    fn assigned_tickets(&self) -> Result<Vec<TaskNode>> {
        Self::unconfigured()
    }

    fn children(&self, _ticket_id: &str) -> Result<Vec<TaskNode>> {
        Self::unconfigured()
    }

    fn create_subtask(&self, _parent_id: &str, _title: &str) -> Result<TaskNode> {
        Self::unconfigured()
    }

    fn current_user(&self) -> Result<User> {
        Self::unconfigured()
    }

    fn test_connection(&self) -> Result<()> {
        Self::unconfigured()
    }
}

#[cfg(test)]
pub mod fakes {
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::Mutex;

    use super::*;
    use crate::model::workspace::WorkspaceStatus;

    /// In-memory ticket tracker.
    #[derive(Default)]
    pub struct FakeTickets {
        pub roots: Vec<TaskNode>,
        pub children: HashMap<String, Vec<TaskNode>>,
        pub fail_with: Option<String>,
        pub created: Mutex<Vec<(String, String)>>,
    }

    impl FakeTickets {
        pub fn new(roots: Vec<TaskNode>) -> Self {
            FakeTickets {
                roots,
                ..FakeTickets::default()
            }
        }

        pub fn with_children(mut self, parent_id: &str, children: Vec<TaskNode>) -> Self {
            self.children.insert(parent_id.to_string(), children);
            self
        }

        pub fn failing(message: &str) -> Self {
            FakeTickets {
                fail_with: Some(message.to_string()),
                ..FakeTickets::default()
            }
        }

        fn check(&self) -> Result<()> {
            match &self.fail_with {
                Some(msg) => Err(SproutError::External(msg.clone())),
                None => Ok(()),
            }
        }
    }

    impl TicketProvider for FakeTickets {
        fn assigned_tickets(&self) -> Result<Vec<TaskNode>> {
            self.check()?;
            Ok(self.roots.clone())
        }

        fn children(&self, ticket_id: &str) -> Result<Vec<TaskNode>> {
            self.check()?;
            self.children
                .get(ticket_id)
                .cloned()
                .ok_or_else(|| SproutError::NotFound(format!("ticket {}", ticket_id)))
        }

        fn create_subtask(&self, parent_id: &str, title: &str) -> Result<TaskNode> {
            self.check()?;
            let mut created = self.created.lock().unwrap();
            created.push((parent_id.to_string(), title.to_string()));
            let n = created.len();
            Ok(TaskNode::new(
                format!("new-{}", n),
                format!("NEW-{}", n),
                title,
            ))
        }

        fn current_user(&self) -> Result<User> {
            self.check()?;
            Ok(User {
                name: "Test User".to_string(),
                email: Some("test@example.com".to_string()),
            })
        }

        fn test_connection(&self) -> Result<()> {
            self.check()
        }
    }

    /// In-memory workspace store keyed by branch.
    pub struct FakeWorkspaces {
        pub base: PathBuf,
        pub workspaces: Mutex<Vec<WorkspaceInfo>>,
        pub merged: Vec<String>,
        pub fail_with: Option<String>,
    }

    impl FakeWorkspaces {
        pub fn new() -> Self {
            FakeWorkspaces {
                base: PathBuf::from("/tmp/workspaces"),
                workspaces: Mutex::new(vec![WorkspaceInfo {
                    branch: Some("main".to_string()),
                    path: PathBuf::from("/tmp/repo"),
                    commit: "0123456789abcdef".to_string(),
                    status: WorkspaceStatus::Clean,
                    is_main: true,
                }]),
                merged: Vec::new(),
                fail_with: None,
            }
        }

        pub fn failing(message: &str) -> Self {
            FakeWorkspaces {
                fail_with: Some(message.to_string()),
                ..FakeWorkspaces::new()
            }
        }

        pub fn branches(&self) -> Vec<String> {
            self.workspaces
                .lock()
                .unwrap()
                .iter()
                .filter_map(|w| w.branch.clone())
                .collect()
        }

        fn check(&self) -> Result<()> {
            match &self.fail_with {
                Some(msg) => Err(SproutError::External(msg.clone())),
                None => Ok(()),
            }
        }
    }

    impl WorkspaceProvider for FakeWorkspaces {
        fn create_workspace(&self, branch: &str) -> Result<PathBuf> {
            self.check()?;
            let mut all = self.workspaces.lock().unwrap();
            if all.iter().any(|w| w.branch.as_deref() == Some(branch)) {
                return Err(SproutError::Conflict(format!("branch {} already has a workspace", branch)));
            }
            let path = self.base.join(branch.replace('/', "-"));
            all.push(WorkspaceInfo {
                branch: Some(branch.to_string()),
                path: path.clone(),
                commit: "fedcba9876543210".to_string(),
                status: WorkspaceStatus::Clean,
                is_main: false,
            });
            Ok(path)
        }

        fn list_workspaces(&self) -> Result<Vec<WorkspaceInfo>> {
            self.check()?;
            Ok(self.workspaces.lock().unwrap().clone())
        }

        fn prune_workspace(&self, branch: &str) -> Result<()> {
            self.check()?;
            let mut all = self.workspaces.lock().unwrap();
            let before = all.len();
            all.retain(|w| w.is_main || w.branch.as_deref() != Some(branch));
            if all.len() == before {
                return Err(SproutError::NotFound(format!("workspace for branch {}", branch)));
            }
            Ok(())
        }

        fn prune_all_merged(&self) -> Result<Vec<String>> {
            self.check()?;
            let mut all = self.workspaces.lock().unwrap();
            let mut pruned = Vec::new();
            all.retain(|w| match &w.branch {
                Some(b) if !w.is_main && self.merged.contains(b) => {
                    pruned.push(b.clone());
                    false
                }
                _ => true,
            });
            Ok(pruned)
        }
    }
}
