//! Config loading, validation, and utility operations.

use super::model::Config;
use super::CONFIG_FILE_NAME;
use crate::error::{GitkitError, Result};
use std::path::{Component, Path, PathBuf};

impl Config {
    /// Load config from a YAML file.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            GitkitError::Config(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Load `.gitkit.yaml` from the repository root, or defaults when absent.
    pub fn load_for_repo<P: AsRef<Path>>(repo_root: P) -> Result<Self> {
        let path = repo_root.as_ref().join(CONFIG_FILE_NAME);
        if path.is_file() {
            tracing::debug!("loading config from {}", path.display());
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty file means "all defaults".
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(yaml)
            .map_err(|e| GitkitError::Config(format!("failed to parse config YAML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| GitkitError::Config(format!("failed to serialize config to YAML: {}", e)))
    }

    /// Validate config values and return error on invalid values.
    ///
    /// Validation rules:
    /// - `preferred_remotes` and `default_branches` are non-empty lists of non-empty names
    /// - `backup_dir` is a non-empty relative path that stays inside the repository
    pub fn validate(&self) -> Result<()> {
        validate_names("preferred_remotes", &self.preferred_remotes)?;
        validate_names("default_branches", &self.default_branches)?;

        let backup_dir = Path::new(&self.backup_dir);
        if self.backup_dir.trim().is_empty() {
            return Err(GitkitError::Config(
                "backup_dir must be non-empty".to_string(),
            ));
        }
        let escapes = backup_dir.components().any(|c| {
            matches!(
                c,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
        if escapes {
            return Err(GitkitError::Config(format!(
                "backup_dir must be a relative path inside the repository (found '{}')",
                self.backup_dir
            )));
        }
        if backup_dir
            .components()
            .any(|c| c.as_os_str() == ".git")
        {
            return Err(GitkitError::Config(
                "backup_dir must not be inside .git".to_string(),
            ));
        }

        Ok(())
    }

    /// The remote whose branches are probed by name and whose `HEAD` is consulted.
    pub fn primary_remote(&self) -> &str {
        self.preferred_remotes
            .first()
            .map(String::as_str)
            .unwrap_or("origin")
    }

    /// Whether `branch` is one of the configured main-line names.
    pub fn is_default_branch(&self, branch: &str) -> bool {
        self.default_branches.iter().any(|b| b == branch)
    }

    /// Absolute backup mirror root for a repository.
    pub fn backup_root<P: AsRef<Path>>(&self, repo_root: P) -> PathBuf {
        repo_root.as_ref().join(&self.backup_dir)
    }
}

fn validate_names(field: &str, names: &[String]) -> Result<()> {
    if names.is_empty() {
        return Err(GitkitError::Config(format!(
            "{} must list at least one name",
            field
        )));
    }
    if names.iter().any(|n| n.trim().is_empty()) {
        return Err(GitkitError::Config(format!(
            "{} entries must be non-empty",
            field
        )));
    }
    Ok(())
}
