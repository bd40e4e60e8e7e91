use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub enum WorkspaceStatus {
    Clean,
    /// Number of changed or untracked entries.
    Dirty(usize),
    /// Registered with git but the directory is gone.
    Missing,
}

impl WorkspaceStatus {
    pub fn label(&self) -> String {
        match self {
            WorkspaceStatus::Clean => "clean".to_string(),
            WorkspaceStatus::Dirty(n) => format!("dirty ({})", n),
            WorkspaceStatus::Missing => "missing".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkspaceInfo {
    /// Branch checked out in the workspace; `None` when detached.
    pub branch: Option<String>,
    pub path: PathBuf,
    pub commit: String,
    pub status: WorkspaceStatus,
    /// The repository's primary working directory.
    pub is_main: bool,
}

impl WorkspaceInfo {
    pub fn short_commit(&self) -> &str {
        crate::text::truncate_chars(&self.commit, 8)
    }

    pub fn branch_label(&self) -> &str {
        self.branch.as_deref().unwrap_or("(detached)")
    }
}

/// What a finished workspace creation reports back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkspaceOutcome {
    pub path: PathBuf,
    /// Set when the post-create command failed; the workspace still exists.
    pub post_create_error: Option<String>,
}
