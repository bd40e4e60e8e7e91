use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, SproutError};

/// Per-user state directory (log file lives here).
pub fn sprout_home() -> PathBuf {
    dirs_base().join(".sprout")
}

fn dirs_base() -> PathBuf {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// Spinner / redraw tick (ms).
pub const TICK_RATE_MS: u64 = 100;

/// Project config file name, looked up at the repository root.
pub const CONFIG_FILE: &str = ".sprout.toml";

/// Overrides `linear.api_key`.
pub const API_KEY_ENV: &str = "LINEAR_API_KEY";

// ---------------------------------------------------------------------------
// Project config (.sprout.toml)
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct ProjectConfig {
    pub linear: Option<LinearConfig>,
    pub workspace: Option<WorkspaceConfig>,
    pub display: Option<DisplayConfig>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LinearConfig {
    pub api_key: Option<String>,
    /// Only show assigned tickets from this team key (e.g. "SPR").
    pub team: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WorkspaceConfig {
    /// Where workspaces are created. Relative paths resolve against the repo root.
    pub base_dir: Option<PathBuf>,
    pub main_branch: Option<String>,
    /// Command (argv) run inside every new workspace.
    pub post_create: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct DisplayConfig {
    pub tick_rate: Option<u64>,
}

impl ProjectConfig {
    pub fn tick_rate(&self) -> u64 {
        self.display
            .as_ref()
            .and_then(|d| d.tick_rate)
            .unwrap_or(TICK_RATE_MS)
    }

    pub fn linear_api_key(&self) -> Option<&str> {
        self.linear
            .as_ref()
            .and_then(|l| l.api_key.as_deref())
            .filter(|k| !k.trim().is_empty())
    }

    pub fn linear_team(&self) -> Option<&str> {
        self.linear.as_ref().and_then(|l| l.team.as_deref())
    }

    pub fn main_branch(&self) -> Option<&str> {
        self.workspace.as_ref().and_then(|w| w.main_branch.as_deref())
    }

    pub fn post_create(&self) -> Option<&[String]> {
        self.workspace
            .as_ref()
            .and_then(|w| w.post_create.as_deref())
            .filter(|argv| !argv.is_empty())
    }

    /// Workspace directory for a repository at `repo_root`.
    pub fn workspace_base_dir(&self, repo_root: &Path) -> PathBuf {
        match self.workspace.as_ref().and_then(|w| w.base_dir.as_ref()) {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => repo_root.join(dir),
            None => {
                let name = repo_root
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_else(|| "repo".to_string());
                repo_root
                    .parent()
                    .unwrap_or(repo_root)
                    .join(format!("{}-workspaces", name))
            }
        }
    }

    /// Apply an API key taken from the environment.
    pub fn with_env_api_key(mut self, key: Option<String>) -> Self {
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            self.linear.get_or_insert_with(LinearConfig::default).api_key = Some(key);
        }
        self
    }
}

/// Load `.sprout.toml` from `repo_root`, then apply `LINEAR_API_KEY`.
/// A missing file yields defaults; an unreadable or malformed one is an error.
pub fn load_project_config(repo_root: &Path) -> Result<ProjectConfig> {
    let config = parse_config_file(&repo_root.join(CONFIG_FILE))?;
    Ok(config.with_env_api_key(std::env::var(API_KEY_ENV).ok()))
}

fn parse_config_file(path: &Path) -> Result<ProjectConfig> {
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }
    let content = std::fs::read_to_string(path).map_err(|e| {
        SproutError::Configuration(format!("cannot read {}: {}", path.display(), e))
    })?;
    toml::from_str(&content)
        .map_err(|e| SproutError::Configuration(format!("{}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn write_config(dir: &Path, body: &str) {
        std::fs::write(dir.join(CONFIG_FILE), body).unwrap();
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = parse_config_file(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config.tick_rate(), TICK_RATE_MS);
        assert!(config.linear_api_key().is_none());
        assert!(config.post_create().is_none());
    }

    #[test]
    fn full_file_parses() {
        let dir = tempfile::tempdir().unwrap();
        write_config(
            dir.path(),
            r#"
[linear]
api_key = "lin_api_123"
team = "SPR"

[workspace]
base_dir = "../trees"
main_branch = "trunk"
post_create = ["npm", "install"]

[display]
tick_rate = 250
"#,
        );
        let config = parse_config_file(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config.linear_api_key(), Some("lin_api_123"));
        assert_eq!(config.linear_team(), Some("SPR"));
        assert_eq!(config.main_branch(), Some("trunk"));
        assert_eq!(config.post_create(), Some(&["npm".to_string(), "install".to_string()][..]));
        assert_eq!(config.tick_rate(), 250);
        assert_eq!(
            config.workspace_base_dir(Path::new("/src/app")),
            PathBuf::from("/src/app/../trees")
        );
    }

    #[test]
    fn malformed_file_is_a_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        write_config(dir.path(), "[linear\napi_key = ");
        let err = parse_config_file(&dir.path().join(CONFIG_FILE)).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn default_base_dir_is_sibling_of_repo() {
        let config = ProjectConfig::default();
        assert_eq!(
            config.workspace_base_dir(Path::new("/src/app")),
            PathBuf::from("/src/app-workspaces")
        );
    }

    #[test]
    fn env_key_overrides_file_key() {
        let config = ProjectConfig {
            linear: Some(LinearConfig {
                api_key: Some("from-file".into()),
                team: None,
            }),
            ..ProjectConfig::default()
        };
        let config = config.with_env_api_key(Some("from-env".into()));
        assert_eq!(config.linear_api_key(), Some("from-env"));

        let untouched = ProjectConfig::default().with_env_api_key(Some("  ".into()));
        assert!(untouched.linear_api_key().is_none());
    }
}
