use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, info};

use crate::config::ProjectConfig;
use crate::error::{Result, SproutError};
use crate::model::workspace::{WorkspaceInfo, WorkspaceStatus};
use crate::providers::WorkspaceProvider;

/// Workspaces backed by `git worktree`.
pub struct GitWorkspaces {
    repo_root: PathBuf,
    base_dir: PathBuf,
    main_branch: Option<String>,
}

impl GitWorkspaces {
    pub fn new(repo_root: PathBuf, base_dir: PathBuf, main_branch: Option<String>) -> Self {
        GitWorkspaces {
            repo_root,
            base_dir,
            main_branch,
        }
    }

    pub fn from_config(repo_root: PathBuf, config: &ProjectConfig) -> Self {
        let base_dir = config.workspace_base_dir(&repo_root);
        GitWorkspaces::new(repo_root, base_dir, config.main_branch().map(String::from))
    }

    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    fn git(&self, args: &[&str]) -> Result<String> {
        run_git(&self.repo_root, args)
    }

    fn branch_exists(&self, branch: &str) -> bool {
        Command::new("git")
            .args(["rev-parse", "--verify", "--quiet", &format!("refs/heads/{}", branch)])
            .current_dir(&self.repo_root)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Configured main branch, else `origin/HEAD`, else "main".
    fn main_branch(&self) -> String {
        if let Some(ref b) = self.main_branch {
            return b.clone();
        }
        self.git(&["symbolic-ref", "--short", "refs/remotes/origin/HEAD"])
            .ok()
            .and_then(|s| s.trim().strip_prefix("origin/").map(String::from))
            .unwrap_or_else(|| "main".to_string())
    }

    fn worktrees(&self) -> Result<Vec<WorktreeEntry>> {
        let out = self.git(&["worktree", "list", "--porcelain"])?;
        Ok(parse_worktree_list(&out))
    }

    fn remove(&self, entry: &WorktreeEntry) -> Result<()> {
        let path = entry.path.to_string_lossy().to_string();
        self.git(&["worktree", "remove", &path])?;
        if let Some(ref branch) = entry.branch {
            self.git(&["branch", "-d", branch])?;
        }
        info!(path = %path, "workspace removed");
        Ok(())
    }
}

impl WorkspaceProvider for GitWorkspaces {
    fn create_workspace(&self, branch: &str) -> Result<PathBuf> {
        crate::branch::validate_branch_name(branch)?;

        if let Some(existing) = self
            .worktrees()?
            .into_iter()
            .find(|w| w.branch.as_deref() == Some(branch))
        {
            return Err(SproutError::Conflict(format!(
                "branch '{}' already has a workspace at {}",
                branch,
                existing.path.display()
            )));
        }

        let path = workspace_path(&self.base_dir, branch);
        if path.exists() {
            return Err(SproutError::Conflict(format!("{} already exists", path.display())));
        }
        let path_str = path.to_string_lossy().to_string();

        if self.branch_exists(branch) {
            self.git(&["worktree", "add", &path_str, branch])?;
        } else {
            self.git(&["worktree", "add", "-b", branch, &path_str])?;
        }
        info!(branch, path = %path_str, "workspace created");
        Ok(path)
    }

    fn list_workspaces(&self) -> Result<Vec<WorkspaceInfo>> {
        let entries = self.worktrees()?;
        Ok(entries
            .into_iter()
            .enumerate()
            .map(|(i, entry)| {
                let status = workspace_status(&entry.path);
                WorkspaceInfo {
                    branch: entry.branch,
                    path: entry.path,
                    commit: entry.head,
                    status,
                    // git always lists the main working tree first
                    is_main: i == 0,
                }
            })
            .collect())
    }

    fn prune_workspace(&self, branch: &str) -> Result<()> {
        let entries = self.worktrees()?;
        let (index, entry) = entries
            .iter()
            .enumerate()
            .find(|(_, w)| w.branch.as_deref() == Some(branch))
            .ok_or_else(|| SproutError::NotFound(format!("workspace for branch '{}'", branch)))?;
        if index == 0 {
            return Err(SproutError::Validation(
                "refusing to prune the main workspace".to_string(),
            ));
        }
        self.remove(entry)
    }

    fn prune_all_merged(&self) -> Result<Vec<String>> {
        let main = self.main_branch();
        let merged = parse_branch_list(&self.git(&["branch", "--merged", &main, "--format=%(refname:short)"])?);
        let candidates = merged_workspaces(&self.worktrees()?, &merged, &main);

        let mut pruned = Vec::new();
        for entry in candidates {
            self.remove(&entry)?;
            if let Some(branch) = entry.branch {
                pruned.push(branch);
            }
        }
        Ok(pruned)
    }
}

/// Run a configured post-create command inside `dir`, capturing its output.
/// Returns the failure text, if any.
pub fn run_post_create(dir: &Path, argv: &[String]) -> Option<String> {
    let (program, args) = argv.split_first()?;
    debug!(?argv, dir = %dir.display(), "post-create command");
    match Command::new(program).args(args).current_dir(dir).output() {
        Ok(o) if o.status.success() => None,
        Ok(o) => {
            let stderr = String::from_utf8_lossy(&o.stderr);
            Some(format!("`{}` failed ({}): {}", argv.join(" "), o.status, stderr.trim()))
        }
        Err(e) => Some(format!("`{}` could not start: {}", argv.join(" "), e)),
    }
}

/// Top level of the repository containing `cwd`.
pub fn discover_repo_root(cwd: &Path) -> Result<PathBuf> {
    let out = run_git(cwd, &["rev-parse", "--show-toplevel"]).map_err(|_| {
        SproutError::NotFound(format!("git repository at {}", cwd.display()))
    })?;
    Ok(PathBuf::from(out.trim()))
}

fn run_git(dir: &Path, args: &[&str]) -> Result<String> {
    debug!(?args, "git");
    let output = Command::new("git").args(args).current_dir(dir).output()?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SproutError::External(format!(
            "git {} failed: {}",
            args.first().copied().unwrap_or(""),
            stderr.trim()
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Directory for `branch` under `base_dir`; slashes flatten to hyphens.
pub fn workspace_path(base_dir: &Path, branch: &str) -> PathBuf {
    base_dir.join(branch.replace('/', "-"))
}

fn workspace_status(path: &Path) -> WorkspaceStatus {
    if !path.exists() {
        return WorkspaceStatus::Missing;
    }
    match run_git(path, &["status", "--porcelain"]) {
        Ok(out) => match out.lines().filter(|l| !l.trim().is_empty()).count() {
            0 => WorkspaceStatus::Clean,
            n => WorkspaceStatus::Dirty(n),
        },
        Err(_) => WorkspaceStatus::Missing,
    }
}

#[derive(Debug, Clone, PartialEq)]
struct WorktreeEntry {
    path: PathBuf,
    head: String,
    branch: Option<String>,
}

/// Parse `git worktree list --porcelain`.
fn parse_worktree_list(out: &str) -> Vec<WorktreeEntry> {
    let mut entries = Vec::new();
    let mut current: Option<WorktreeEntry> = None;

    for line in out.lines() {
        if let Some(path) = line.strip_prefix("worktree ") {
            if let Some(done) = current.take() {
                entries.push(done);
            }
            current = Some(WorktreeEntry {
                path: PathBuf::from(path),
                head: String::new(),
                branch: None,
            });
        } else if let Some(entry) = current.as_mut() {
            if let Some(head) = line.strip_prefix("HEAD ") {
                entry.head = head.to_string();
            } else if let Some(branch) = line.strip_prefix("branch ") {
                entry.branch = Some(branch.strip_prefix("refs/heads/").unwrap_or(branch).to_string());
            }
        }
    }
    if let Some(done) = current {
        entries.push(done);
    }
    entries
}

/// Parse `git branch --format=%(refname:short)` output.
fn parse_branch_list(out: &str) -> HashSet<String> {
    out.lines()
        .map(|l| l.trim().trim_start_matches("* ").to_string())
        .filter(|l| !l.is_empty())
        .collect()
}

/// Non-main workspaces whose branch is merged (and is not the main branch).
fn merged_workspaces(entries: &[WorktreeEntry], merged: &HashSet<String>, main: &str) -> Vec<WorktreeEntry> {
    entries
        .iter()
        .skip(1)
        .filter(|w| matches!(w.branch.as_deref(), Some(b) if b != main && merged.contains(b)))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PORCELAIN: &str = "\
worktree /src/app
HEAD 1111111111111111111111111111111111111111
branch refs/heads/main

worktree /src/app-workspaces/spr-1-login
HEAD 2222222222222222222222222222222222222222
branch refs/heads/spr-1-login

worktree /src/app-workspaces/detached
HEAD 3333333333333333333333333333333333333333
detached

";

    #[test]
    fn porcelain_list_is_parsed() {
        let entries = parse_worktree_list(PORCELAIN);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].path, PathBuf::from("/src/app"));
        assert_eq!(entries[0].branch.as_deref(), Some("main"));
        assert_eq!(entries[1].branch.as_deref(), Some("spr-1-login"));
        assert_eq!(entries[1].head, "2222222222222222222222222222222222222222");
        assert_eq!(entries[2].branch, None);
    }

    #[test]
    fn merged_selection_skips_main_and_unmerged() {
        let entries = parse_worktree_list(PORCELAIN);
        let merged = parse_branch_list("main\n  spr-1-login\nother\n");
        let picked = merged_workspaces(&entries, &merged, "main");
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].branch.as_deref(), Some("spr-1-login"));

        let none = merged_workspaces(&entries, &parse_branch_list("main\n"), "main");
        assert!(none.is_empty());
    }

    #[test]
    fn branch_list_strips_current_marker() {
        let set = parse_branch_list("* main\n  feature/x\n\n");
        assert!(set.contains("main"));
        assert!(set.contains("feature/x"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn slashes_flatten_in_workspace_dir() {
        assert_eq!(
            workspace_path(Path::new("/w"), "feature/login"),
            PathBuf::from("/w/feature-login")
        );
    }

    #[test]
    fn missing_directory_reports_missing() {
        assert_eq!(
            workspace_status(Path::new("/definitely/not/here/sprout")),
            WorkspaceStatus::Missing
        );
    }

    #[test]
    fn post_create_reports_spawn_failure() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_post_create(dir.path(), &["sprout-no-such-binary".to_string()]);
        assert!(err.unwrap().contains("could not start"));
        assert_eq!(run_post_create(dir.path(), &[]), None);
    }
}
