//! Engine configuration.
//!
//! `SnapConfig` is the optional TOML file a user may keep at
//! `<config_dir>/skillsnap/config.toml`. `EngineConfig` is the resolved,
//! immutable value every engine receives at construction: built-in defaults,
//! then the file, then environment overrides, then explicit CLI flags.

use fs_err as fs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::helpers::ignore::IgnoreRules;
use crate::SnapError;

/// Branch every snapshot commit lands on.
pub const DEFAULT_BRANCH: &str = "main";

/// Reserved tree name: the tool's own skill directory.
pub const SELF_NAME: &str = "skill-snapshot";

/// Trees above this size are never snapshotted (10 MiB).
pub const MAX_TREE_BYTES: u64 = 10 * 1024 * 1024;

/// Hash cache format version; a mismatch means "cache absent".
pub const CACHE_VERSION: &str = "1.0";

/// A lock older than this is abandoned (10 minutes).
pub const LOCK_STALE_AFTER: Duration = Duration::from_secs(600);

/// Timeout for a single backend command.
pub const COMMAND_TIMEOUT: Duration = Duration::from_secs(300);

/// Environment variable overriding the skills directory.
pub const ENV_SKILLS_DIR: &str = "SKILLSNAP_SKILLS_DIR";

/// Environment variable overriding the snapshot repository directory.
pub const ENV_REPO_DIR: &str = "SKILLSNAP_REPO";

/// Environment variable overriding the remote URL.
pub const ENV_REMOTE: &str = "SKILLSNAP_REMOTE";

/// On-disk configuration file. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapConfig {
    /// Directory holding the live skill trees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills_dir: Option<PathBuf>,

    /// Local clone of the snapshot repository.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_dir: Option<PathBuf>,

    /// Remote to push snapshots to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_url: Option<String>,

    /// Branch name (default `main`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,

    /// Size cap in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tree_bytes: Option<u64>,

    /// Backend command timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_timeout_secs: Option<u64>,

    /// Extra directory or file names to ignore, on top of the built-in set.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_ignore: Vec<String>,

    /// Identity used for snapshot commits when git has none configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,

    /// Email used for snapshot commits when git has none configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_email: Option<String>,
}

impl SnapConfig {
    /// Default location of the config file.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("skillsnap").join("config.toml"))
    }

    /// Load config from a TOML file.
    ///
    /// Returns the default config if the file doesn't exist.
    pub fn load(path: &Path) -> Result<Self, SnapError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        let config: SnapConfig = toml::from_str(&contents)
            .map_err(|e| SnapError::config_error(format!("failed to parse {}: {e}", path.display())))?;
        Ok(config)
    }
}

/// Resolved engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Directory holding the live skill trees.
    pub skills_dir: PathBuf,
    /// Local clone of the snapshot repository.
    pub repo_dir: PathBuf,
    /// Remote URL, if snapshots are pushed anywhere.
    pub remote_url: Option<String>,
    /// Branch name.
    pub branch: String,
    /// Reserved tree name.
    pub self_name: String,
    /// Size cap in bytes.
    pub max_tree_bytes: u64,
    /// Cache format version written and accepted.
    pub cache_version: String,
    /// Lock staleness threshold.
    pub lock_stale_after: Duration,
    /// Backend command timeout.
    pub command_timeout: Duration,
    /// Ignore rules applied to every walk and copy.
    pub ignore: IgnoreRules,
    /// Fallback commit author name.
    pub author_name: String,
    /// Fallback commit author email.
    pub author_email: String,
}

impl EngineConfig {
    /// Create a configuration with built-in defaults for the given directories.
    pub fn new(skills_dir: impl Into<PathBuf>, repo_dir: impl Into<PathBuf>) -> Self {
        Self {
            skills_dir: skills_dir.into(),
            repo_dir: repo_dir.into(),
            remote_url: None,
            branch: DEFAULT_BRANCH.to_string(),
            self_name: SELF_NAME.to_string(),
            max_tree_bytes: MAX_TREE_BYTES,
            cache_version: CACHE_VERSION.to_string(),
            lock_stale_after: LOCK_STALE_AFTER,
            command_timeout: COMMAND_TIMEOUT,
            ignore: IgnoreRules::default(),
            author_name: "skillsnap".to_string(),
            author_email: "skillsnap@localhost".to_string(),
        }
    }

    /// Resolve from a config file and an environment lookup.
    ///
    /// Precedence: defaults < file < environment.
    pub fn resolve<F>(file: &SnapConfig, env: F) -> Result<Self, SnapError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let skills_dir = match env(ENV_SKILLS_DIR).or_else(|| path_string(&file.skills_dir)) {
            Some(dir) => PathBuf::from(dir),
            None => default_home_dir()?.join(".claude").join("skills"),
        };
        let repo_dir = match env(ENV_REPO_DIR).or_else(|| path_string(&file.repo_dir)) {
            Some(dir) => PathBuf::from(dir),
            None => default_home_dir()?.join(".claude").join("skill-snapshots"),
        };

        let mut config = Self::new(skills_dir, repo_dir);
        config.remote_url = env(ENV_REMOTE).or_else(|| file.remote_url.clone());
        if let Some(branch) = &file.branch {
            if branch.trim().is_empty() {
                return Err(SnapError::config_error("branch must not be empty"));
            }
            config.branch = branch.clone();
        }
        if let Some(max) = file.max_tree_bytes {
            config.max_tree_bytes = max;
        }
        if let Some(secs) = file.command_timeout_secs {
            if secs == 0 {
                return Err(SnapError::config_error("command_timeout_secs must be positive"));
            }
            config.command_timeout = Duration::from_secs(secs);
        }
        if !file.extra_ignore.is_empty() {
            config.ignore = IgnoreRules::default().with_names(file.extra_ignore.iter().cloned());
        }
        if let Some(name) = &file.author_name {
            config.author_name = name.clone();
        }
        if let Some(email) = &file.author_email {
            config.author_email = email.clone();
        }
        Ok(config)
    }

    /// Load the config file (default location unless given) and the process environment.
    pub fn load(config_path: Option<&Path>) -> Result<Self, SnapError> {
        let file = match config_path.map(Path::to_path_buf).or_else(SnapConfig::default_path) {
            Some(path) => SnapConfig::load(&path)?,
            None => SnapConfig::default(),
        };
        Self::resolve(&file, |key| std::env::var(key).ok().filter(|v| !v.is_empty()))
    }

    /// Override the skills directory.
    pub fn with_skills_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.skills_dir = dir.into();
        self
    }

    /// Override the repository directory.
    pub fn with_repo_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.repo_dir = dir.into();
        self
    }

    /// Override the remote URL.
    pub fn with_remote(mut self, url: impl Into<String>) -> Self {
        self.remote_url = Some(url.into());
        self
    }

    /// Override the size cap.
    pub fn with_max_tree_bytes(mut self, max: u64) -> Self {
        self.max_tree_bytes = max;
        self
    }

    /// Override the lock staleness threshold.
    pub fn with_lock_stale_after(mut self, after: Duration) -> Self {
        self.lock_stale_after = after;
        self
    }

    /// Override the backend command timeout.
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Whether `name` is the reserved self tree.
    pub fn is_self(&self, name: &str) -> bool {
        name == self.self_name
    }
}

fn path_string(path: &Option<PathBuf>) -> Option<String> {
    path.as_ref().map(|p| p.to_string_lossy().into_owned())
}

fn default_home_dir() -> Result<PathBuf, SnapError> {
    dirs::home_dir().ok_or_else(|| SnapError::config_error("could not determine home directory"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = EngineConfig::new("/skills", "/repo");
        assert_eq!(config.branch, "main");
        assert_eq!(config.self_name, "skill-snapshot");
        assert_eq!(config.max_tree_bytes, 10 * 1024 * 1024);
        assert_eq!(config.cache_version, "1.0");
        assert_eq!(config.lock_stale_after, Duration::from_secs(600));
        assert_eq!(config.command_timeout, Duration::from_secs(300));
        assert!(config.is_self("skill-snapshot"));
        assert!(!config.is_self("alpha"));
    }

    #[test]
    fn test_env_overrides_file() {
        let file = SnapConfig {
            skills_dir: Some(PathBuf::from("/file/skills")),
            repo_dir: Some(PathBuf::from("/file/repo")),
            remote_url: Some("https://example.invalid/file.git".to_string()),
            ..Default::default()
        };
        let env = env_from(&[(ENV_REPO_DIR, "/env/repo")]);
        let config = EngineConfig::resolve(&file, env).unwrap();

        assert_eq!(config.skills_dir, PathBuf::from("/file/skills"));
        assert_eq!(config.repo_dir, PathBuf::from("/env/repo"));
        assert_eq!(
            config.remote_url.as_deref(),
            Some("https://example.invalid/file.git")
        );
    }

    #[test]
    fn test_file_settings_applied() {
        let file = SnapConfig {
            skills_dir: Some(PathBuf::from("/s")),
            repo_dir: Some(PathBuf::from("/r")),
            branch: Some("trunk".to_string()),
            max_tree_bytes: Some(1024),
            command_timeout_secs: Some(5),
            extra_ignore: vec!["dist".to_string()],
            ..Default::default()
        };
        let config = EngineConfig::resolve(&file, env_from(&[])).unwrap();
        assert_eq!(config.branch, "trunk");
        assert_eq!(config.max_tree_bytes, 1024);
        assert_eq!(config.command_timeout, Duration::from_secs(5));
        assert!(config.ignore.is_ignored_name("dist"));
        assert!(config.ignore.is_ignored_name("node_modules"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let file = SnapConfig {
            skills_dir: Some(PathBuf::from("/s")),
            repo_dir: Some(PathBuf::from("/r")),
            command_timeout_secs: Some(0),
            ..Default::default()
        };
        assert!(EngineConfig::resolve(&file, env_from(&[])).is_err());
    }

    #[test]
    fn test_config_file_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.toml");

        assert_eq!(SnapConfig::load(&path).unwrap(), SnapConfig::default());

        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(
            &path,
            "remote_url = \"git@example.invalid:me/skill-snapshots.git\"\nmax_tree_bytes = 42\n",
        )
        .unwrap();
        let expected = SnapConfig {
            remote_url: Some("git@example.invalid:me/skill-snapshots.git".to_string()),
            max_tree_bytes: Some(42),
            ..Default::default()
        };
        assert_eq!(SnapConfig::load(&path).unwrap(), expected);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "max_tree_bytes = \"lots\"").unwrap();
        let err = SnapConfig::load(&path).unwrap_err();
        assert_eq!(err.error_type(), "config_error");
    }
}
