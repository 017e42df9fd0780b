//! Config struct definition and default implementation.

use serde::{Deserialize, Serialize};

/// Configuration shared by `find-base-branch` and `safe-rm`.
///
/// This struct represents the contents of `.gitkit.yaml` at the repository root.
/// Unknown fields in the YAML are ignored for forward compatibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // =========================================================================
    // Base branch discovery
    // =========================================================================
    /// Remotes considered by the resolver, highest priority first.
    /// The first entry is the primary remote.
    #[serde(default = "default_preferred_remotes")]
    pub preferred_remotes: Vec<String>,

    /// Main-line branch names, probed in this order on the primary remote.
    #[serde(default = "default_default_branches")]
    pub default_branches: Vec<String>,

    // =========================================================================
    // Safe removal
    // =========================================================================
    /// Backup mirror directory, relative to the repository root.
    #[serde(default = "default_backup_dir")]
    pub backup_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            preferred_remotes: default_preferred_remotes(),
            default_branches: default_default_branches(),
            backup_dir: default_backup_dir(),
        }
    }
}

pub(crate) fn default_preferred_remotes() -> Vec<String> {
    ["origin", "upstream", "github"]
        .into_iter()
        .map(String::from)
        .collect()
}

pub(crate) fn default_default_branches() -> Vec<String> {
    ["main", "master", "develop", "dev"]
        .into_iter()
        .map(String::from)
        .collect()
}

pub(crate) fn default_backup_dir() -> String {
    ".safe-rm".to_string()
}
