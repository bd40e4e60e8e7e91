//! Non-interactive subcommands. Each writes its report to `out` and returns
//! a typed error so `main` can pick the exit code.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{info, warn};

use crate::config::{self, ProjectConfig};
use crate::data::{cli_detect, git};
use crate::error::{Result, SproutError};
use crate::model::workspace::WorkspaceInfo;
use crate::providers::{TicketProvider, WorkspaceProvider};

/// Create a workspace for `branch` and print where it landed.
pub fn create(
    workspaces: &dyn WorkspaceProvider,
    branch: &str,
    post_create: Option<&[String]>,
    out: &mut dyn Write,
) -> Result<PathBuf> {
    crate::branch::validate_branch_name(branch)?;
    let path = workspaces.create_workspace(branch)?;
    writeln!(out, "Created workspace for {} at {}", branch, path.display())?;

    if let Some(argv) = post_create {
        match git::run_post_create(&path, argv) {
            None => writeln!(out, "Ran post-create: {}", argv.join(" "))?,
            Some(err) => {
                warn!(%err, "post-create failed");
                writeln!(out, "Warning: post-create command failed: {}", err)?;
            }
        }
    }
    Ok(path)
}

/// Run `argv` inside `dir` with inherited stdio; returns its exit code.
pub fn run_in(dir: &Path, argv: &[String]) -> Result<i32> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| SproutError::Validation("no command given".to_string()))?;
    info!(?argv, dir = %dir.display(), "running command in workspace");
    let status = Command::new(program)
        .args(args)
        .current_dir(dir)
        .status()
        .map_err(|e| SproutError::External(format!("cannot run {}: {}", program, e)))?;
    Ok(status.code().unwrap_or(1))
}

/// Print a table of workspaces.
pub fn list(workspaces: &dyn WorkspaceProvider, include_main: bool, out: &mut dyn Write) -> Result<()> {
    let rows: Vec<WorkspaceInfo> = workspaces
        .list_workspaces()?
        .into_iter()
        .filter(|w| include_main || !w.is_main)
        .collect();

    if rows.is_empty() {
        writeln!(out, "No workspaces")?;
        return Ok(());
    }

    let statuses: Vec<String> = rows.iter().map(|w| w.status.label()).collect();
    let branch_w = rows
        .iter()
        .map(|w| w.branch_label().len())
        .chain(std::iter::once("BRANCH".len()))
        .max()
        .unwrap_or(0);
    let status_w = statuses
        .iter()
        .map(String::len)
        .chain(std::iter::once("STATUS".len()))
        .max()
        .unwrap_or(0);

    writeln!(
        out,
        "{:branch_w$}  {:8}  {:status_w$}  PATH",
        "BRANCH", "COMMIT", "STATUS"
    )?;
    for (w, status) in rows.iter().zip(&statuses) {
        writeln!(
            out,
            "{:branch_w$}  {:8}  {:status_w$}  {}",
            w.branch_label(),
            w.short_commit(),
            status,
            w.path.display()
        )?;
    }
    Ok(())
}

/// Prune one workspace by branch, or every merged one.
pub fn prune(workspaces: &dyn WorkspaceProvider, branch: Option<&str>, out: &mut dyn Write) -> Result<()> {
    match branch {
        Some(branch) => {
            workspaces.prune_workspace(branch)?;
            writeln!(out, "Pruned {}", branch)?;
        }
        None => {
            let pruned = workspaces.prune_all_merged()?;
            if pruned.is_empty() {
                writeln!(out, "No merged workspaces to prune")?;
            }
            for branch in pruned {
                writeln!(out, "Pruned {}", branch)?;
            }
        }
    }
    Ok(())
}

/// One line of `doctor` output.
pub struct Check {
    pub name: &'static str,
    pub result: Result<String>,
}

impl Check {
    fn new(name: &'static str, result: Result<String>) -> Self {
        Check { name, result }
    }
}

/// Environment checks against the real machine, starting from `cwd`.
pub fn doctor_checks(cwd: &Path) -> Vec<Check> {
    let mut checks = Vec::new();

    let git_found = cli_detect::is_available("git");
    checks.push(Check::new(
        "git",
        if git_found {
            Ok("found on PATH".to_string())
        } else {
            Err(SproutError::External("git not found on PATH".to_string()))
        },
    ));

    let repo = git::discover_repo_root(cwd);
    let project = match repo {
        Ok(ref root) => {
            checks.push(Check::new("repository", Ok(root.display().to_string())));
            let loaded = config::load_project_config(root);
            let detail = if root.join(config::CONFIG_FILE).exists() {
                format!("{} loaded", config::CONFIG_FILE)
            } else {
                format!("defaults (no {})", config::CONFIG_FILE)
            };
            match loaded {
                Ok(c) => {
                    checks.push(Check::new("configuration", Ok(detail)));
                    c
                }
                Err(e) => {
                    checks.push(Check::new("configuration", Err(e)));
                    ProjectConfig::default().with_env_api_key(std::env::var(config::API_KEY_ENV).ok())
                }
            }
        }
        Err(e) => {
            checks.push(Check::new("repository", Err(e)));
            ProjectConfig::default().with_env_api_key(std::env::var(config::API_KEY_ENV).ok())
        }
    };

    match crate::data::linear::LinearClient::from_config(&project) {
        Some(client) => {
            checks.push(Check::new("linear api key", Ok("set".to_string())));
            checks.extend(ticket_checks(&client));
        }
        None => checks.push(Check::new(
            "linear api key",
            Err(SproutError::Configuration(format!(
                "not set (linear.api_key in {} or {})",
                config::CONFIG_FILE,
                config::API_KEY_ENV
            ))),
        )),
    }

    checks
}

/// Connectivity and identity checks against a ticket provider.
pub fn ticket_checks(tickets: &dyn TicketProvider) -> Vec<Check> {
    let connection = tickets.test_connection().map(|_| "reachable".to_string());
    let connected = connection.is_ok();
    let mut checks = vec![Check::new("linear connection", connection)];
    if connected {
        let user = tickets.current_user().map(|u| match u.email {
            Some(email) => format!("{} <{}>", u.name, email),
            None => u.name,
        });
        checks.push(Check::new("linear user", user));
    }
    checks
}

/// Print every check; fail with the first failing check's error.
pub fn report(checks: Vec<Check>, out: &mut dyn Write) -> Result<()> {
    let mut first_failure = None;
    for check in checks {
        match check.result {
            Ok(detail) => writeln!(out, "✓ {}: {}", check.name, detail)?,
            Err(e) => {
                writeln!(out, "✗ {}: {}", check.name, e)?;
                first_failure.get_or_insert(e);
            }
        }
    }
    match first_failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
